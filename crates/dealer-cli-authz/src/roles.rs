// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Builds the role registry and guard from loaded configuration.

use std::sync::Arc;

use dealer_server_auth::{
	Capability, CapabilityResolver, OwnershipGate, PermissionChecker, RegistryError,
	RequestGuard, RoleDefinition, RoleId, RoleRegistry,
};
use dealer_server_config::{AuthzConfig, RoleEntry};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RoleTableError {
	#[error("role table names unknown role '{0}'")]
	UnknownRole(String),

	#[error("role {role} grants unknown capability '{capability}'")]
	UnknownCapability { role: RoleId, capability: String },

	#[error("role table is empty; remove [authz.roles] to use the built-in table")]
	EmptyRoleTable,

	#[error("ownership suffix '{suffix}' would let {capability} act on any store")]
	UnscopedCapability {
		suffix: String,
		capability: Capability,
	},

	#[error("invalid role table: {0}")]
	Registry(#[from] RegistryError),
}

/// The registry described by `authz.roles`, or the built-in table when unset.
pub fn registry_from_config(authz: &AuthzConfig) -> Result<RoleRegistry, RoleTableError> {
	check_ownership_suffix(&authz.ownership_suffix)?;

	let Some(table) = &authz.roles else {
		debug!("using built-in dealership role table");
		return Ok(RoleRegistry::dealership());
	};
	if table.is_empty() {
		return Err(RoleTableError::EmptyRoleTable);
	}

	let definitions = table
		.iter()
		.map(|(name, entry)| role_definition(name, entry))
		.collect::<Result<Vec<_>, _>>()?;

	let registry = RoleRegistry::from_definitions(definitions)?;
	info!(roles = registry.len(), "using configured role table");
	Ok(registry)
}

/// Every `_own` capability must stay ownership-scoped under `suffix`.
fn check_ownership_suffix(suffix: &str) -> Result<(), RoleTableError> {
	let unscoped = OwnershipGate::with_suffix(suffix).unscoped_capabilities();
	match unscoped.first() {
		Some(capability) => Err(RoleTableError::UnscopedCapability {
			suffix: suffix.to_string(),
			capability: *capability,
		}),
		None => Ok(()),
	}
}

fn role_definition(name: &str, entry: &RoleEntry) -> Result<RoleDefinition, RoleTableError> {
	let id = parse_role(name)?;

	let capabilities = entry
		.capabilities
		.iter()
		.map(|c| {
			c.parse::<Capability>()
				.map_err(|_| RoleTableError::UnknownCapability {
					role: id,
					capability: c.clone(),
				})
		})
		.collect::<Result<Vec<_>, _>>()?;

	let parents = entry
		.inherits
		.iter()
		.map(|p| parse_role(p))
		.collect::<Result<Vec<_>, _>>()?;

	Ok(RoleDefinition::new(id).grant(capabilities).inherit(parents))
}

fn parse_role(name: &str) -> Result<RoleId, RoleTableError> {
	name
		.parse()
		.map_err(|_| RoleTableError::UnknownRole(name.to_string()))
}

/// Wire registry, resolver, checker and ownership gate into a guard.
pub fn build_guard(authz: &AuthzConfig) -> Result<RequestGuard, RoleTableError> {
	let registry = Arc::new(registry_from_config(authz)?);
	let resolver = Arc::new(CapabilityResolver::new(registry));
	Ok(
		RequestGuard::new(PermissionChecker::new(resolver))
			.with_ownership_gate(OwnershipGate::with_suffix(authz.ownership_suffix.clone())),
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use dealer_server_auth::{
		AuthContext, DenyReason, GuardDecision, Principal, Requirement, StoreId, UserId,
	};
	use std::collections::BTreeMap;

	fn entry(capabilities: &[&str], inherits: &[&str]) -> RoleEntry {
		RoleEntry {
			capabilities: capabilities.iter().map(|s| s.to_string()).collect(),
			inherits: inherits.iter().map(|s| s.to_string()).collect(),
		}
	}

	fn config(roles: &[(&str, RoleEntry)]) -> AuthzConfig {
		AuthzConfig {
			roles: Some(
				roles
					.iter()
					.map(|(name, entry)| (name.to_string(), entry.clone()))
					.collect::<BTreeMap<_, _>>(),
			),
			..Default::default()
		}
	}

	#[test]
	fn default_config_uses_dealership_table() {
		let registry = registry_from_config(&AuthzConfig::default()).unwrap();
		assert_eq!(registry.len(), RoleId::all().len());
	}

	#[test]
	fn custom_table_is_converted() {
		let authz = config(&[
			("sales_executive", entry(&["manage_leads"], &[])),
			("store_admin", entry(&["approve_sales"], &["sales_executive"])),
		]);
		let registry = registry_from_config(&authz).unwrap();
		assert_eq!(registry.len(), 2);
		assert!(!registry.contains(RoleId::GlobalAdmin));

		let store_admin = registry.get_role(RoleId::StoreAdmin).unwrap();
		assert_eq!(store_admin.inherits, vec![RoleId::SalesExecutive]);
		assert!(store_admin.capabilities.contains(&Capability::ApproveSales));
	}

	#[test]
	fn wildcard_is_accepted() {
		let authz = config(&[("global_admin", entry(&["*"], &[]))]);
		let registry = registry_from_config(&authz).unwrap();
		assert!(registry
			.get_role(RoleId::GlobalAdmin)
			.unwrap()
			.capabilities
			.contains(&Capability::Wildcard));
	}

	#[test]
	fn unknown_role_name_rejected() {
		let authz = config(&[("floor_manager", entry(&[], &[]))]);
		assert!(matches!(
			registry_from_config(&authz),
			Err(RoleTableError::UnknownRole(name)) if name == "floor_manager"
		));
	}

	#[test]
	fn unknown_parent_name_rejected() {
		let authz = config(&[("store_admin", entry(&[], &["floor_manager"]))]);
		assert!(matches!(
			registry_from_config(&authz),
			Err(RoleTableError::UnknownRole(_))
		));
	}

	#[test]
	fn unknown_capability_rejected() {
		let authz = config(&[("sales_executive", entry(&["sell_boats"], &[]))]);
		let err = registry_from_config(&authz).unwrap_err();
		assert!(matches!(
			&err,
			RoleTableError::UnknownCapability { role: RoleId::SalesExecutive, capability }
				if capability == "sell_boats"
		));
	}

	#[test]
	fn cycle_rejected() {
		let authz = config(&[
			("sales_executive", entry(&[], &["store_admin"])),
			("store_admin", entry(&[], &["sales_executive"])),
		]);
		assert!(matches!(
			registry_from_config(&authz),
			Err(RoleTableError::Registry(RegistryError::Cycle(_)))
		));
	}

	#[test]
	fn undefined_parent_rejected() {
		let authz = config(&[("store_admin", entry(&[], &["sales_executive"]))]);
		assert!(matches!(
			registry_from_config(&authz),
			Err(RoleTableError::Registry(RegistryError::UndefinedParent { .. }))
		));
	}

	#[test]
	fn registry_from_config_file() {
		use std::io::Write;

		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(
			file,
			r#"
[authz.roles.procurement_executive]
capabilities = ["hunt_vehicles"]

[authz.roles.procurement_admin]
capabilities = ["approve_procurement_expenses"]
inherits = ["procurement_executive"]
"#
		)
		.unwrap();

		let config = dealer_server_config::load_config_with_file(file.path()).unwrap();
		let guard = build_guard(&config.authz).unwrap();
		assert!(guard
			.checker()
			.can(RoleId::ProcurementAdmin, "hunt_vehicles")
			.unwrap());
		assert!(guard
			.checker()
			.can(RoleId::SalesExecutive, "hunt_vehicles")
			.is_err());
	}

	#[test]
	fn empty_role_table_rejected() {
		let authz = config(&[]);
		assert!(matches!(
			registry_from_config(&authz),
			Err(RoleTableError::EmptyRoleTable)
		));
	}

	#[test]
	fn foreign_suffix_rejected() {
		let authz = AuthzConfig {
			ownership_suffix: "_mine".to_string(),
			..Default::default()
		};
		let err = build_guard(&authz).unwrap_err();
		assert!(matches!(
			&err,
			RoleTableError::UnscopedCapability { suffix, capability: Capability::ManageStoreOwn }
				if suffix == "_mine"
		));
		assert!(err.to_string().contains("manage_store_own"));
	}

	#[test]
	fn suffix_covering_only_some_owned_capabilities_rejected() {
		let authz = AuthzConfig {
			ownership_suffix: "_store_own".to_string(),
			..Default::default()
		};
		assert!(matches!(
			registry_from_config(&authz),
			Err(RoleTableError::UnscopedCapability {
				capability: Capability::ManageUsersOwn,
				..
			})
		));
	}

	#[test]
	fn configured_suffix_keeps_store_scoping() {
		let authz = AuthzConfig {
			ownership_suffix: "own".to_string(),
			..Default::default()
		};
		let guard = build_guard(&authz).unwrap();
		let store_a = StoreId::generate();

		let foreign = Principal::new(UserId::generate(), RoleId::StoreAdmin).with_store(store_a);
		let decision = guard
			.evaluate(
				&AuthContext::authenticated(foreign),
				&Requirement::new("manage_store_own").on_store(StoreId::generate()),
			)
			.unwrap();
		assert_eq!(decision, GuardDecision::Denied(DenyReason::OwnershipMismatch));

		let storeless = Principal::new(UserId::generate(), RoleId::StoreAdmin);
		let decision = guard
			.evaluate(
				&AuthContext::authenticated(storeless),
				&Requirement::new("manage_users_own").on_store(store_a),
			)
			.unwrap();
		assert_eq!(decision, GuardDecision::Denied(DenyReason::NoOwnedResource));
	}
}
