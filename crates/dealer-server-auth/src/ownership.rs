// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ownership gate for store-scoped capabilities.
//!
//! A capability whose name ends in the ownership suffix (`_own` by default) is
//! only usable against the principal's own store. Passing the capability check
//! is necessary but not sufficient; the request's target store must also equal
//! the principal's store.

use crate::capability::Capability;
use crate::{Principal, StoreId};

/// Default suffix marking ownership-scoped capabilities.
pub const DEFAULT_OWNERSHIP_SUFFIX: &str = "_own";

/// Decides whether an action touches only the principal's own store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipGate {
	suffix: String,
}

impl Default for OwnershipGate {
	fn default() -> Self {
		Self {
			suffix: DEFAULT_OWNERSHIP_SUFFIX.to_string(),
		}
	}
}

impl OwnershipGate {
	pub fn new() -> Self {
		Self::default()
	}

	/// Use a custom ownership suffix. An empty suffix falls back to the default,
	/// since it would mark every capability as ownership-scoped.
	pub fn with_suffix(suffix: impl Into<String>) -> Self {
		let suffix = suffix.into();
		if suffix.is_empty() {
			return Self::default();
		}
		Self { suffix }
	}

	pub fn suffix(&self) -> &str {
		&self.suffix
	}

	/// True if `capability` is ownership-scoped.
	pub fn is_owned_action(&self, capability: &str) -> bool {
		capability.len() > self.suffix.len() && capability.ends_with(&self.suffix)
	}

	/// Known `_own` capabilities this gate would not treat as ownership-scoped.
	///
	/// Non-empty means the suffix lets those capabilities act on any store.
	pub fn unscoped_capabilities(&self) -> Vec<Capability> {
		Capability::all()
			.iter()
			.copied()
			.filter(|c| is_owned_action(c.as_str()) && !self.is_owned_action(c.as_str()))
			.collect()
	}

	/// True iff the principal has a store and it equals `target`.
	pub fn check_ownership(&self, principal: &Principal, target: Option<StoreId>) -> bool {
		match (principal.store_id, target) {
			(Some(owned), Some(target)) => owned == target,
			_ => false,
		}
	}
}

/// [`OwnershipGate::is_owned_action`] with the default suffix.
pub fn is_owned_action(capability: &str) -> bool {
	OwnershipGate::default().is_owned_action(capability)
}
