// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization configuration section.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn default_ownership_suffix() -> String {
	"_own".to_string()
}

/// One role entry in a custom role table.
///
/// Names are kept as strings here; the server resolves them against its
/// closed role and capability sets when it builds the registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleEntry {
	#[serde(default)]
	pub capabilities: Vec<String>,
	#[serde(default)]
	pub inherits: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthzConfigLayer {
	pub ownership_suffix: Option<String>,
	pub roles: Option<BTreeMap<String, RoleEntry>>,
}

impl AuthzConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.ownership_suffix.is_some() {
			self.ownership_suffix = other.ownership_suffix;
		}
		// A role table replaces the previous one wholesale; tables are never
		// merged role by role.
		if other.roles.is_some() {
			self.roles = other.roles;
		}
	}

	pub fn finalize(self) -> AuthzConfig {
		AuthzConfig {
			ownership_suffix: self
				.ownership_suffix
				.unwrap_or_else(default_ownership_suffix),
			roles: self.roles,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthzConfig {
	pub ownership_suffix: String,
	/// Replaces the built-in dealership table when set.
	pub roles: Option<BTreeMap<String, RoleEntry>>,
}

impl AuthzConfig {
	pub fn has_custom_roles(&self) -> bool {
		self.roles.is_some()
	}
}

impl Default for AuthzConfig {
	fn default() -> Self {
		Self {
			ownership_suffix: default_ownership_suffix(),
			roles: None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = AuthzConfig::default();
		assert_eq!(config.ownership_suffix, "_own");
		assert!(!config.has_custom_roles());
	}

	#[test]
	fn test_layer_finalize_defaults() {
		let config = AuthzConfigLayer::default().finalize();
		assert_eq!(config, AuthzConfig::default());
	}

	#[test]
	fn test_merge_overwrites_suffix() {
		let mut base = AuthzConfigLayer {
			ownership_suffix: Some("_own".to_string()),
			roles: None,
		};
		base.merge(AuthzConfigLayer {
			ownership_suffix: Some("_mine".to_string()),
			roles: None,
		});
		assert_eq!(base.ownership_suffix.as_deref(), Some("_mine"));
	}

	#[test]
	fn test_merge_replaces_role_table() {
		let mut first = BTreeMap::new();
		first.insert("sales_executive".to_string(), RoleEntry::default());
		first.insert("store_admin".to_string(), RoleEntry::default());

		let mut second = BTreeMap::new();
		second.insert("sales_executive".to_string(), RoleEntry::default());

		let mut base = AuthzConfigLayer {
			ownership_suffix: None,
			roles: Some(first),
		};
		base.merge(AuthzConfigLayer {
			ownership_suffix: None,
			roles: Some(second),
		});

		let roles = base.roles.unwrap();
		assert_eq!(roles.len(), 1);
		assert!(roles.contains_key("sales_executive"));
	}

	#[test]
	fn test_merge_keeps_roles_when_other_empty() {
		let mut roles = BTreeMap::new();
		roles.insert("sales_executive".to_string(), RoleEntry::default());
		let mut base = AuthzConfigLayer {
			ownership_suffix: None,
			roles: Some(roles),
		};
		base.merge(AuthzConfigLayer::default());
		assert!(base.roles.is_some());
	}

	#[test]
	fn test_deserialize_role_table() {
		let toml_str = r#"
ownership_suffix = "_own"

[roles.store_admin]
capabilities = ["approve_sales", "manage_store_own"]
inherits = ["sales_executive"]

[roles.sales_executive]
capabilities = ["manage_leads"]
"#;
		let layer: AuthzConfigLayer = toml::from_str(toml_str).unwrap();
		let roles = layer.roles.unwrap();
		assert_eq!(
			roles["store_admin"],
			RoleEntry {
				capabilities: vec!["approve_sales".to_string(), "manage_store_own".to_string()],
				inherits: vec!["sales_executive".to_string()],
			}
		);
		assert!(roles["sales_executive"].inherits.is_empty());
	}

	#[test]
	fn test_deserialize_layer_empty() {
		let layer: AuthzConfigLayer = toml::from_str("").unwrap();
		assert!(layer.ownership_suffix.is_none());
		assert!(layer.roles.is_none());
	}
}
