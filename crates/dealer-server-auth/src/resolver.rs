// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Capability resolution over the role inheritance graph.
//!
//! Every registered role is resolved once when the resolver is built. The
//! resulting map is never written again, so lookups from concurrent requests
//! need no synchronization.
//!
//! The walk keeps a visited set and never re-enters a role, which bounds it by
//! the number of registered roles even when handed an unchecked registry that
//! contains a cycle.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::capability::CapabilitySet;
use crate::error::{AuthzError, AuthzResult};
use crate::registry::RoleRegistry;
use crate::RoleId;

/// Memoized transitive capability sets, one per registered role.
#[derive(Debug, Clone)]
pub struct CapabilityResolver {
	registry: Arc<RoleRegistry>,
	resolved: HashMap<RoleId, Arc<CapabilitySet>>,
}

impl CapabilityResolver {
	/// Build a resolver and resolve every role in `registry`.
	pub fn new(registry: Arc<RoleRegistry>) -> Self {
		let resolved = registry
			.roles()
			.map(|role| (role, Arc::new(walk(&registry, role))))
			.collect::<HashMap<_, _>>();

		debug!(roles = resolved.len(), "capability resolver warmed");

		Self { registry, resolved }
	}

	/// The full capability set for `role`.
	///
	/// Returns the same allocation on every call.
	///
	/// # Errors
	///
	/// [`AuthzError::UnknownRole`] if the role is not registered.
	#[instrument(level = "trace", skip(self), fields(role = %role))]
	pub fn resolve(&self, role: RoleId) -> AuthzResult<Arc<CapabilitySet>> {
		self
			.resolved
			.get(&role)
			.cloned()
			.ok_or_else(|| AuthzError::UnknownRole(role.to_string()))
	}

	/// Resolve a role given by name.
	pub fn resolve_named(&self, name: &str) -> AuthzResult<Arc<CapabilitySet>> {
		self.resolve(name.parse()?)
	}

	pub fn registry(&self) -> &Arc<RoleRegistry> {
		&self.registry
	}
}

/// Iterative depth-first walk from `root` collecting direct capabilities.
fn walk(registry: &RoleRegistry, root: RoleId) -> CapabilitySet {
	let mut capabilities = CapabilitySet::new();
	let mut visited = HashSet::new();
	let mut stack = vec![root];

	while let Some(role) = stack.pop() {
		if !visited.insert(role) {
			debug!(root = %root, role = %role, "role already visited, skipping");
			continue;
		}

		let Ok(def) = registry.get_role(role) else {
			warn!(root = %root, role = %role, "inherited role is not registered, skipping");
			continue;
		};

		capabilities.extend(def.capabilities.iter().copied());
		stack.extend(def.inherits.iter().rev().copied());
	}

	capabilities
}
