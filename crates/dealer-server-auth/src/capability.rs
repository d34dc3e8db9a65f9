// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Capability identifiers and resolved capability sets.
//!
//! Known dealership actions are a closed enum so call sites get exhaustiveness
//! checking. The wildcard `"*"` is a distinguished variant that satisfies every
//! well-formed capability name, including names this enum does not know.
//!
//! # Name grammar
//!
//! ```text
//! name     := "*" | lower ( lower | digit | "_" )*     (at most 64 bytes)
//! ```
//!
//! Anything else is malformed and can never be satisfied.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Sentinel granting every capability.
pub const WILDCARD: &str = "*";

/// Maximum length of a capability name.
pub const MAX_CAPABILITY_LEN: usize = 64;

/// A permitted dealership action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
	#[serde(rename = "*")]
	Wildcard,
	ManageInventory,
	ViewInventory,
	ManageLeads,
	MatchLeads,
	ApproveSales,
	ViewAnalytics,
	ManageStore,
	ManageStoreOwn,
	ManageUsersOwn,
	ViewAnalyticsOwn,
	ManageProcurement,
	HuntVehicles,
	SubmitInspections,
	ApproveInspections,
	ApproveProcurementExpenses,
}

impl Capability {
	/// Every capability, wildcard first.
	pub fn all() -> &'static [Capability] {
		&[
			Capability::Wildcard,
			Capability::ManageInventory,
			Capability::ViewInventory,
			Capability::ManageLeads,
			Capability::MatchLeads,
			Capability::ApproveSales,
			Capability::ViewAnalytics,
			Capability::ManageStore,
			Capability::ManageStoreOwn,
			Capability::ManageUsersOwn,
			Capability::ViewAnalyticsOwn,
			Capability::ManageProcurement,
			Capability::HuntVehicles,
			Capability::SubmitInspections,
			Capability::ApproveInspections,
			Capability::ApproveProcurementExpenses,
		]
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Capability::Wildcard => WILDCARD,
			Capability::ManageInventory => "manage_inventory",
			Capability::ViewInventory => "view_inventory",
			Capability::ManageLeads => "manage_leads",
			Capability::MatchLeads => "match_leads",
			Capability::ApproveSales => "approve_sales",
			Capability::ViewAnalytics => "view_analytics",
			Capability::ManageStore => "manage_store",
			Capability::ManageStoreOwn => "manage_store_own",
			Capability::ManageUsersOwn => "manage_users_own",
			Capability::ViewAnalyticsOwn => "view_analytics_own",
			Capability::ManageProcurement => "manage_procurement",
			Capability::HuntVehicles => "hunt_vehicles",
			Capability::SubmitInspections => "submit_inspections",
			Capability::ApproveInspections => "approve_inspections",
			Capability::ApproveProcurementExpenses => "approve_procurement_expenses",
		}
	}

	pub fn is_wildcard(self) -> bool {
		matches!(self, Capability::Wildcard)
	}
}

impl fmt::Display for Capability {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Returned when a name is not one of the known capabilities.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown capability: {0}")]
pub struct UnknownCapability(pub String);

impl FromStr for Capability {
	type Err = UnknownCapability;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		Capability::all()
			.iter()
			.copied()
			.find(|c| c.as_str() == value)
			.ok_or_else(|| UnknownCapability(value.to_string()))
	}
}

/// Returns true if `name` follows the capability name grammar.
pub fn is_well_formed(name: &str) -> bool {
	if name == WILDCARD {
		return true;
	}
	if name.is_empty() || name.len() > MAX_CAPABILITY_LEN {
		return false;
	}

	let mut bytes = name.bytes();
	let first_ok = bytes.next().is_some_and(|b| b.is_ascii_lowercase());
	first_ok && bytes.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// The closure of a role's capabilities after following inheritance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
	inner: HashSet<Capability>,
}

impl CapabilitySet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, capability: Capability) -> bool {
		self.inner.insert(capability)
	}

	pub fn contains(&self, capability: Capability) -> bool {
		self.inner.contains(&capability)
	}

	pub fn has_wildcard(&self) -> bool {
		self.contains(Capability::Wildcard)
	}

	/// Decides whether this set satisfies a typed capability.
	pub fn allows(&self, capability: Capability) -> bool {
		self.has_wildcard() || self.contains(capability)
	}

	/// Decides whether this set satisfies a capability name.
	///
	/// Malformed names are never satisfied. Well-formed names outside the
	/// known enum are satisfied only by the wildcard.
	pub fn allows_name(&self, name: &str) -> bool {
		if !is_well_formed(name) {
			return false;
		}
		if self.has_wildcard() {
			return true;
		}
		name.parse::<Capability>()
			.map(|c| self.contains(c))
			.unwrap_or(false)
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	/// Capabilities in a stable order, for display.
	pub fn sorted(&self) -> Vec<Capability> {
		let mut caps: Vec<_> = self.inner.iter().copied().collect();
		caps.sort();
		caps
	}
}

impl FromIterator<Capability> for CapabilitySet {
	fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
		Self {
			inner: iter.into_iter().collect(),
		}
	}
}

impl Extend<Capability> for CapabilitySet {
	fn extend<I: IntoIterator<Item = Capability>>(&mut self, iter: I) {
		self.inner.extend(iter);
	}
}
