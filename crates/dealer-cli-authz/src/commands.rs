// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subcommand logic. Each function returns what the binary prints.

use dealer_server_auth::{
	AuthContext, AuthzResult, GuardDecision, Principal, RequestGuard, Requirement, RoleId,
	RoleRegistry, StoreId, UserId,
};
use tracing::instrument;

/// Exit status for an allowed `check`.
pub const EXIT_ALLOWED: u8 = 0;
/// Exit status for a denied `check`.
pub const EXIT_DENIED: u8 = 1;
/// Exit status for any error.
pub const EXIT_ERROR: u8 = 2;

/// Evaluate `capability` for a synthetic principal holding `role`.
///
/// `store` is the store the principal owns; `target` the store the action
/// is aimed at.
#[instrument(level = "debug", skip(guard))]
pub fn check(
	guard: &RequestGuard,
	role: RoleId,
	capability: &str,
	store: Option<StoreId>,
	target: Option<StoreId>,
) -> AuthzResult<GuardDecision> {
	let principal = Principal {
		user_id: UserId::generate(),
		role,
		store_id: store,
	};
	let requirement = Requirement::new(capability).with_target(target);
	guard.evaluate(&AuthContext::authenticated(principal), &requirement)
}

pub fn format_decision(decision: GuardDecision) -> String {
	match decision {
		GuardDecision::Authorized => "allowed".to_string(),
		GuardDecision::Denied(reason) => format!("denied ({reason})"),
	}
}

pub fn exit_status(decision: GuardDecision) -> u8 {
	if decision.is_authorized() {
		EXIT_ALLOWED
	} else {
		EXIT_DENIED
	}
}

/// Effective capability names for `role`, sorted.
pub fn resolve(guard: &RequestGuard, role: RoleId) -> AuthzResult<Vec<&'static str>> {
	let set = guard.checker().resolver().resolve(role)?;
	let mut names: Vec<_> = set.sorted().into_iter().map(|c| c.as_str()).collect();
	names.sort_unstable();
	Ok(names)
}

/// One line per role, parents before children.
pub fn list_roles(registry: &RoleRegistry) -> Vec<String> {
	registry
		.roles()
		.filter_map(|id| registry.get_role(id).ok())
		.map(|def| {
			if def.inherits.is_empty() {
				def.id.to_string()
			} else {
				let parents: Vec<_> = def.inherits.iter().map(|p| p.as_str()).collect();
				format!("{} <- {}", def.id, parents.join(", "))
			}
		})
		.collect()
}
