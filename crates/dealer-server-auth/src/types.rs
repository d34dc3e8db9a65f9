// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for dealership authorization.
//!
//! - **ID newtypes**: Type-safe wrappers around UUIDs ([`UserId`], [`StoreId`])
//!   preventing accidental mixing of user and store identifiers
//! - **Role ids**: The closed set of dealership roles ([`RoleId`])
//! - **Principal**: The authenticated actor a permission check is evaluated for
//!
//! All ID types implement transparent serde serialization (as UUID strings) and
//! provide conversion to/from [`uuid::Uuid`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AuthzError;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}

		impl FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Uuid::parse_str(s).map(Self)
			}
		}
	};
}

define_id_type!(UserId, "Unique identifier for a back-office user.");
define_id_type!(StoreId, "Unique identifier for a dealership store.");

// =============================================================================
// Roles
// =============================================================================

/// Dealership roles.
///
/// Capabilities and inheritance edges are not attached to the variants; they
/// live in a [`RoleRegistry`](crate::RoleRegistry) so the table can be
/// validated and swapped without touching the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleId {
	/// Unrestricted access across every store.
	GlobalAdmin,
	/// Runs a single store: sales approval, inventory, store staff.
	StoreAdmin,
	/// Runs procurement: expense approval, inspection sign-off.
	ProcurementAdmin,
	/// Works leads and matches them to vehicles.
	SalesExecutive,
	/// Hunts vehicles and submits inspections.
	ProcurementExecutive,
}

impl RoleId {
	/// Returns all dealership roles.
	pub fn all() -> &'static [RoleId] {
		&[
			RoleId::GlobalAdmin,
			RoleId::StoreAdmin,
			RoleId::ProcurementAdmin,
			RoleId::SalesExecutive,
			RoleId::ProcurementExecutive,
		]
	}

	/// The canonical snake_case name.
	pub fn as_str(self) -> &'static str {
		match self {
			RoleId::GlobalAdmin => "global_admin",
			RoleId::StoreAdmin => "store_admin",
			RoleId::ProcurementAdmin => "procurement_admin",
			RoleId::SalesExecutive => "sales_executive",
			RoleId::ProcurementExecutive => "procurement_executive",
		}
	}
}

impl fmt::Display for RoleId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for RoleId {
	type Err = AuthzError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		RoleId::all()
			.iter()
			.copied()
			.find(|role| role.as_str() == value)
			.ok_or_else(|| AuthzError::UnknownRole(value.to_string()))
	}
}

// =============================================================================
// Principal
// =============================================================================

/// The authenticated actor performing a request.
///
/// Produced by the authentication stage and discarded at request end. A
/// principal bound to a store can only use ownership-scoped capabilities
/// against that store, whatever its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
	pub user_id: UserId,
	pub role: RoleId,
	pub store_id: Option<StoreId>,
}

impl Principal {
	/// Create a principal with no associated store.
	pub fn new(user_id: UserId, role: RoleId) -> Self {
		Self {
			user_id,
			role,
			store_id: None,
		}
	}

	/// Builder: bind the principal to a store.
	pub fn with_store(mut self, store_id: StoreId) -> Self {
		self.store_id = Some(store_id);
		self
	}
}
