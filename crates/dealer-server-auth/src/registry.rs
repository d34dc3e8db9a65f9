// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role registry: the fixed role → capabilities → inherits table.
//!
//! The registry is built once at startup and never mutated. Construction runs a
//! topological validation pass so a misconfigured table (duplicate roles,
//! dangling parents, cycles) is rejected before any request is served.
//!
//! ```text
//!                    global_admin (*)
//!                    /              \
//!            store_admin        procurement_admin
//!                 |                     |
//!          sales_executive     procurement_executive
//! ```

use std::collections::{BTreeSet, HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::capability::Capability;
use crate::error::{AuthzError, AuthzResult, RegistryError};
use crate::RoleId;

/// One role's entry in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
	pub id: RoleId,
	pub capabilities: BTreeSet<Capability>,
	/// Parents, in declaration order.
	pub inherits: Vec<RoleId>,
}

impl RoleDefinition {
	pub fn new(id: RoleId) -> Self {
		Self {
			id,
			capabilities: BTreeSet::new(),
			inherits: Vec::new(),
		}
	}

	/// Builder: grant capabilities directly.
	pub fn grant(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
		self.capabilities.extend(capabilities);
		self
	}

	/// Builder: inherit from parent roles.
	pub fn inherit(mut self, parents: impl IntoIterator<Item = RoleId>) -> Self {
		self.inherits.extend(parents);
		self
	}
}

/// Immutable, validated role table.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
	roles: HashMap<RoleId, RoleDefinition>,
	/// Parents before children.
	order: Vec<RoleId>,
}

impl RoleRegistry {
	/// Build and validate a registry.
	///
	/// # Errors
	///
	/// Returns a [`RegistryError`] for duplicate definitions, self-inheritance,
	/// parents that are not defined, or any inheritance cycle.
	pub fn from_definitions(
		definitions: impl IntoIterator<Item = RoleDefinition>,
	) -> Result<Self, RegistryError> {
		let mut roles = HashMap::new();
		let mut declared = Vec::new();
		for def in definitions {
			if roles.contains_key(&def.id) {
				return Err(RegistryError::DuplicateRole(def.id));
			}
			declared.push(def.id);
			roles.insert(def.id, def);
		}

		for id in &declared {
			let def = &roles[id];
			for parent in &def.inherits {
				if *parent == def.id {
					return Err(RegistryError::SelfInheritance(def.id));
				}
				if !roles.contains_key(parent) {
					return Err(RegistryError::UndefinedParent {
						role: def.id,
						parent: *parent,
					});
				}
			}
		}

		let order = topological_order(&declared, &roles)?;
		debug!(roles = order.len(), "role registry validated");

		Ok(Self { roles, order })
	}

	/// Build a registry without validation.
	///
	/// Exists so callers can exercise the resolver against a broken table.
	/// Dangling parents are kept; the resolver ignores them.
	pub fn from_definitions_unchecked(
		definitions: impl IntoIterator<Item = RoleDefinition>,
	) -> Self {
		let mut roles = HashMap::new();
		let mut order = Vec::new();
		for def in definitions {
			if !roles.contains_key(&def.id) {
				order.push(def.id);
			}
			roles.insert(def.id, def);
		}
		Self { roles, order }
	}

	/// The built-in dealership table.
	pub fn dealership() -> Self {
		// The literal table is acyclic; validation cannot fail.
		Self::from_definitions(dealership_definitions()).unwrap_or_else(|e| {
			error!(error = %e, "built-in role table failed validation, loading it unchecked");
			Self::from_definitions_unchecked(dealership_definitions())
		})
	}

	/// Look up a role.
	///
	/// # Errors
	///
	/// [`AuthzError::UnknownRole`] if the role is not in this registry.
	pub fn get_role(&self, id: RoleId) -> AuthzResult<&RoleDefinition> {
		self
			.roles
			.get(&id)
			.ok_or_else(|| AuthzError::UnknownRole(id.to_string()))
	}

	/// Look up a role by name.
	pub fn get_role_by_name(&self, name: &str) -> AuthzResult<&RoleDefinition> {
		self.get_role(name.parse()?)
	}

	pub fn contains(&self, id: RoleId) -> bool {
		self.roles.contains_key(&id)
	}

	/// Registered roles, parents before children.
	pub fn roles(&self) -> impl Iterator<Item = RoleId> + '_ {
		self.order.iter().copied()
	}

	pub fn len(&self) -> usize {
		self.roles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.roles.is_empty()
	}
}

/// Definitions behind [`RoleRegistry::dealership`].
pub fn dealership_definitions() -> Vec<RoleDefinition> {
	use Capability::*;

	vec![
		RoleDefinition::new(RoleId::GlobalAdmin)
			.grant([Wildcard])
			.inherit([RoleId::StoreAdmin, RoleId::ProcurementAdmin]),
		RoleDefinition::new(RoleId::StoreAdmin)
			.grant([
				ApproveSales,
				ManageInventory,
				ManageStoreOwn,
				ManageUsersOwn,
				ViewAnalyticsOwn,
			])
			.inherit([RoleId::SalesExecutive]),
		RoleDefinition::new(RoleId::ProcurementAdmin)
			.grant([
				ApproveProcurementExpenses,
				ManageProcurement,
				ApproveInspections,
			])
			.inherit([RoleId::ProcurementExecutive]),
		RoleDefinition::new(RoleId::SalesExecutive).grant([ManageLeads, MatchLeads, ViewInventory]),
		RoleDefinition::new(RoleId::ProcurementExecutive).grant([
			HuntVehicles,
			SubmitInspections,
			ViewInventory,
		]),
	]
}

/// Kahn's algorithm over parent → child edges.
fn topological_order(
	declared: &[RoleId],
	roles: &HashMap<RoleId, RoleDefinition>,
) -> Result<Vec<RoleId>, RegistryError> {
	let mut pending: HashMap<RoleId, usize> = declared
		.iter()
		.map(|id| (*id, roles[id].inherits.len()))
		.collect();
	let mut children: HashMap<RoleId, Vec<RoleId>> = HashMap::new();
	for id in declared {
		for parent in &roles[id].inherits {
			children.entry(*parent).or_default().push(*id);
		}
	}

	let mut ready: VecDeque<RoleId> = declared
		.iter()
		.copied()
		.filter(|id| pending[id] == 0)
		.collect();
	let mut order = Vec::with_capacity(declared.len());

	while let Some(id) = ready.pop_front() {
		order.push(id);
		for child in children.get(&id).into_iter().flatten() {
			if let Some(count) = pending.get_mut(child) {
				*count -= 1;
				if *count == 0 {
					ready.push_back(*child);
				}
			}
		}
	}

	if order.len() < declared.len() {
		let stuck: Vec<RoleId> = declared
			.iter()
			.copied()
			.filter(|id| !order.contains(id))
			.collect();
		return Err(RegistryError::Cycle(stuck));
	}

	Ok(order)
}
