// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Permission check: may a role perform a capability?
//!
//! `can` is a pure function of (role, capability). It only fails for roles the
//! registry does not know; an unknown or malformed capability is a plain
//! `false`.

use std::sync::Arc;

use tracing::trace;

use crate::capability::Capability;
use crate::error::AuthzResult;
use crate::resolver::CapabilityResolver;
use crate::RoleId;

/// Answers capability questions against a [`CapabilityResolver`].
#[derive(Debug, Clone)]
pub struct PermissionChecker {
	resolver: Arc<CapabilityResolver>,
}

impl PermissionChecker {
	pub fn new(resolver: Arc<CapabilityResolver>) -> Self {
		Self { resolver }
	}

	/// True iff the role holds `*` or the named capability.
	///
	/// # Errors
	///
	/// [`AuthzError::UnknownRole`](crate::AuthzError::UnknownRole) if the role
	/// is not registered.
	pub fn can(&self, role: RoleId, capability: &str) -> AuthzResult<bool> {
		let allowed = self.resolver.resolve(role)?.allows_name(capability);
		trace!(role = %role, capability, allowed, "permission check");
		Ok(allowed)
	}

	/// Typed variant of [`can`](Self::can).
	pub fn can_capability(&self, role: RoleId, capability: Capability) -> AuthzResult<bool> {
		Ok(self.resolver.resolve(role)?.allows(capability))
	}

	pub fn resolver(&self) -> &Arc<CapabilityResolver> {
		&self.resolver
	}
}
