// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request guard: the single enforcement point in front of protected handlers.
//!
//! Per request the guard moves through
//!
//! ```text
//! Unauthenticated ──► Authenticated ──┬──► Authorized  (handler runs)
//!        │                            └──► Denied      (handler never runs)
//!        └──────────────────────────────► Denied
//! ```
//!
//! A denial is final. There is no retry, elevation or partial grant.
//!
//! An action is permitted iff the role can perform the capability and, when
//! the capability is ownership-scoped, the principal owns the target store.

use std::fmt;
use std::future::Future;

use tracing::{debug, error, info};

use crate::error::{AuthzError, AuthzResult};
use crate::middleware::AuthContext;
use crate::ownership::OwnershipGate;
use crate::permission::PermissionChecker;
use crate::{is_well_formed, Capability, RoleId, StoreId};

/// What an endpoint needs from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
	pub capability: String,
	/// Store the request acts on, for ownership-scoped capabilities.
	pub target: Option<StoreId>,
}

impl Requirement {
	pub fn new(capability: impl Into<String>) -> Self {
		Self {
			capability: capability.into(),
			target: None,
		}
	}

	/// Builder: set the target store.
	pub fn on_store(mut self, store_id: StoreId) -> Self {
		self.target = Some(store_id);
		self
	}

	/// Builder: set an optional target store.
	pub fn with_target(mut self, target: Option<StoreId>) -> Self {
		self.target = target;
		self
	}
}

impl From<Capability> for Requirement {
	fn from(capability: Capability) -> Self {
		Self::new(capability.as_str())
	}
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyReason {
	Unauthenticated,
	MalformedCapability,
	MissingCapability,
	NoOwnedResource,
	MissingTarget,
	OwnershipMismatch,
}

impl DenyReason {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Unauthenticated => "unauthenticated",
			Self::MalformedCapability => "malformed_capability",
			Self::MissingCapability => "missing_capability",
			Self::NoOwnedResource => "no_owned_resource",
			Self::MissingTarget => "missing_target",
			Self::OwnershipMismatch => "ownership_mismatch",
		}
	}
}

impl fmt::Display for DenyReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Terminal state of a guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
	Authorized,
	Denied(DenyReason),
}

impl GuardDecision {
	pub fn is_authorized(&self) -> bool {
		matches!(self, Self::Authorized)
	}
}

/// Enforces capability and ownership requirements.
///
/// Built from an injected [`PermissionChecker`]; holds no per-request state.
#[derive(Debug, Clone)]
pub struct RequestGuard {
	checker: PermissionChecker,
	ownership: OwnershipGate,
}

impl RequestGuard {
	pub fn new(checker: PermissionChecker) -> Self {
		Self {
			checker,
			ownership: OwnershipGate::default(),
		}
	}

	/// Builder: replace the ownership gate.
	pub fn with_ownership_gate(mut self, ownership: OwnershipGate) -> Self {
		self.ownership = ownership;
		self
	}

	pub fn checker(&self) -> &PermissionChecker {
		&self.checker
	}

	pub fn ownership(&self) -> &OwnershipGate {
		&self.ownership
	}

	/// Evaluate a requirement.
	///
	/// # Errors
	///
	/// Only [`AuthzError::UnknownRole`]; every "no" is a
	/// [`GuardDecision::Denied`].
	pub fn evaluate(&self, ctx: &AuthContext, req: &Requirement) -> AuthzResult<GuardDecision> {
		let Some(principal) = ctx.principal() else {
			debug!(capability = %req.capability, "authz denied: not authenticated");
			return Ok(GuardDecision::Denied(DenyReason::Unauthenticated));
		};

		let decision = if !is_well_formed(&req.capability) {
			GuardDecision::Denied(DenyReason::MalformedCapability)
		} else if !self.can(principal.role, &req.capability)? {
			GuardDecision::Denied(DenyReason::MissingCapability)
		} else if !self.ownership.is_owned_action(&req.capability) {
			GuardDecision::Authorized
		} else if principal.store_id.is_none() {
			GuardDecision::Denied(DenyReason::NoOwnedResource)
		} else if req.target.is_none() {
			GuardDecision::Denied(DenyReason::MissingTarget)
		} else if !self.ownership.check_ownership(principal, req.target) {
			GuardDecision::Denied(DenyReason::OwnershipMismatch)
		} else {
			GuardDecision::Authorized
		};

		match decision {
			GuardDecision::Authorized => debug!(
				user_id = %principal.user_id,
				role = %principal.role,
				capability = %req.capability,
				"authz allowed"
			),
			GuardDecision::Denied(reason) => info!(
				user_id = %principal.user_id,
				role = %principal.role,
				capability = %req.capability,
				reason = %reason,
				"authz denied"
			),
		}

		Ok(decision)
	}

	/// Evaluate and convert a denial into an error.
	///
	/// # Errors
	///
	/// - [`AuthzError::AuthenticationRequired`] with no principal
	/// - [`AuthzError::Forbidden`] on any other denial
	/// - [`AuthzError::UnknownRole`] for an unregistered role
	pub fn check(&self, ctx: &AuthContext, req: &Requirement) -> AuthzResult<()> {
		match self.evaluate(ctx, req)? {
			GuardDecision::Authorized => Ok(()),
			GuardDecision::Denied(DenyReason::Unauthenticated) => {
				Err(AuthzError::AuthenticationRequired)
			}
			GuardDecision::Denied(_) => {
				let role = ctx
					.principal()
					.map(|p| p.role)
					.ok_or(AuthzError::AuthenticationRequired)?;
				Err(AuthzError::Forbidden {
					role,
					capability: req.capability.clone(),
				})
			}
		}
	}

	/// Run `handler` only if the requirement is met, passing its output through.
	pub fn run<T>(
		&self,
		ctx: &AuthContext,
		req: &Requirement,
		handler: impl FnOnce() -> T,
	) -> AuthzResult<T> {
		self.check(ctx, req)?;
		Ok(handler())
	}

	/// Async variant of [`run`](Self::run). The future is only created on allow.
	pub async fn run_async<F, Fut, T>(
		&self,
		ctx: &AuthContext,
		req: &Requirement,
		handler: F,
	) -> AuthzResult<T>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = T>,
	{
		self.check(ctx, req)?;
		Ok(handler().await)
	}

	fn can(&self, role: RoleId, capability: &str) -> AuthzResult<bool> {
		self.checker.can(role, capability).map_err(|e| {
			error!(role = %role, capability, error = %e, "authz failed: role not registered");
			e
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::registry::{RoleDefinition, RoleRegistry};
	use crate::resolver::CapabilityResolver;
	use crate::{Principal, UserId};
	use proptest::prelude::*;
	use std::cell::Cell;
	use std::sync::Arc;

	fn guard() -> RequestGuard {
		let resolver = CapabilityResolver::new(Arc::new(RoleRegistry::dealership()));
		RequestGuard::new(PermissionChecker::new(Arc::new(resolver)))
	}

	fn ctx(role: RoleId, store: Option<StoreId>) -> AuthContext {
		AuthContext::authenticated(Principal {
			user_id: UserId::generate(),
			role,
			store_id: store,
		})
	}

	mod capability {
		use super::*;

		#[test]
		fn unauthenticated_is_denied() {
			let decision = guard()
				.evaluate(&AuthContext::unauthenticated(), &Requirement::new("manage_leads"))
				.unwrap();
			assert_eq!(decision, GuardDecision::Denied(DenyReason::Unauthenticated));
		}

		#[test]
		fn unauthenticated_check_requires_auth() {
			let err = guard()
				.check(&AuthContext::unauthenticated(), &Requirement::new("manage_leads"))
				.unwrap_err();
			assert_eq!(err, AuthzError::AuthenticationRequired);
		}

		#[test]
		fn holder_is_authorized() {
			let decision = guard()
				.evaluate(&ctx(RoleId::SalesExecutive, None), &Requirement::new("manage_leads"))
				.unwrap();
			assert_eq!(decision, GuardDecision::Authorized);
		}

		#[test]
		fn non_holder_is_forbidden() {
			let err = guard()
				.check(
					&ctx(RoleId::SalesExecutive, None),
					&Requirement::from(Capability::ApproveSales),
				)
				.unwrap_err();
			assert_eq!(
				err,
				AuthzError::Forbidden {
					role: RoleId::SalesExecutive,
					capability: "approve_sales".to_string(),
				}
			);
		}

		#[test]
		fn malformed_capability_is_denied_even_for_global_admin() {
			let decision = guard()
				.evaluate(&ctx(RoleId::GlobalAdmin, None), &Requirement::new(""))
				.unwrap();
			assert_eq!(decision, GuardDecision::Denied(DenyReason::MalformedCapability));
		}

		#[test]
		fn unregistered_role_propagates() {
			let registry =
				RoleRegistry::from_definitions([RoleDefinition::new(RoleId::SalesExecutive)])
					.unwrap();
			let resolver = CapabilityResolver::new(Arc::new(registry));
			let guard = RequestGuard::new(PermissionChecker::new(Arc::new(resolver)));

			let err = guard
				.check(&ctx(RoleId::StoreAdmin, None), &Requirement::new("approve_sales"))
				.unwrap_err();
			assert_eq!(err, AuthzError::UnknownRole("store_admin".to_string()));
		}
	}

	mod ownership {
		use super::*;

		#[test]
		fn own_store_is_authorized() {
			let store = StoreId::generate();
			let decision = guard()
				.evaluate(
					&ctx(RoleId::StoreAdmin, Some(store)),
					&Requirement::new("manage_store_own").on_store(store),
				)
				.unwrap();
			assert_eq!(decision, GuardDecision::Authorized);
		}

		#[test]
		fn other_store_is_denied() {
			let decision = guard()
				.evaluate(
					&ctx(RoleId::StoreAdmin, Some(StoreId::generate())),
					&Requirement::new("manage_store_own").on_store(StoreId::generate()),
				)
				.unwrap();
			assert_eq!(decision, GuardDecision::Denied(DenyReason::OwnershipMismatch));
		}

		#[test]
		fn principal_without_store_is_denied() {
			let decision = guard()
				.evaluate(
					&ctx(RoleId::StoreAdmin, None),
					&Requirement::new("manage_store_own").on_store(StoreId::generate()),
				)
				.unwrap();
			assert_eq!(decision, GuardDecision::Denied(DenyReason::NoOwnedResource));
		}

		#[test]
		fn missing_target_is_denied() {
			let decision = guard()
				.evaluate(
					&ctx(RoleId::StoreAdmin, Some(StoreId::generate())),
					&Requirement::new("manage_users_own"),
				)
				.unwrap();
			assert_eq!(decision, GuardDecision::Denied(DenyReason::MissingTarget));
		}

		#[test]
		fn global_admin_bound_to_store_stays_scoped() {
			let decision = guard()
				.evaluate(
					&ctx(RoleId::GlobalAdmin, Some(StoreId::generate())),
					&Requirement::new("manage_store_own").on_store(StoreId::generate()),
				)
				.unwrap();
			assert_eq!(decision, GuardDecision::Denied(DenyReason::OwnershipMismatch));
		}

		#[test]
		fn capability_checked_before_ownership() {
			let store = StoreId::generate();
			let decision = guard()
				.evaluate(
					&ctx(RoleId::SalesExecutive, Some(store)),
					&Requirement::new("manage_store_own").on_store(store),
				)
				.unwrap();
			assert_eq!(decision, GuardDecision::Denied(DenyReason::MissingCapability));
		}

		#[test]
		fn unscoped_capability_ignores_target() {
			let decision = guard()
				.evaluate(
					&ctx(RoleId::StoreAdmin, Some(StoreId::generate())),
					&Requirement::new("approve_sales").on_store(StoreId::generate()),
				)
				.unwrap();
			assert_eq!(decision, GuardDecision::Authorized);
		}
	}

	mod handler {
		use super::*;

		#[test]
		fn runs_handler_on_allow() {
			let calls = Cell::new(0);
			let out = guard()
				.run(
					&ctx(RoleId::ProcurementExecutive, None),
					&Requirement::new("hunt_vehicles"),
					|| {
						calls.set(calls.get() + 1);
						"found 3 vehicles"
					},
				)
				.unwrap();
			assert_eq!(out, "found 3 vehicles");
			assert_eq!(calls.get(), 1);
		}

		#[test]
		fn never_runs_handler_on_deny() {
			let calls = Cell::new(0);
			let result = guard().run(
				&ctx(RoleId::ProcurementExecutive, None),
				&Requirement::new("approve_procurement_expenses"),
				|| calls.set(calls.get() + 1),
			);
			assert!(result.unwrap_err().is_forbidden());
			assert_eq!(calls.get(), 0);
		}

		#[tokio::test]
		async fn async_handler_passes_result_through() {
			let out = guard()
				.run_async(
					&ctx(RoleId::StoreAdmin, None),
					&Requirement::new("approve_sales"),
					|| async { 42 },
				)
				.await
				.unwrap();
			assert_eq!(out, 42);
		}

		#[tokio::test]
		async fn async_handler_skipped_on_deny() {
			let created = Cell::new(false);
			let result = guard()
				.run_async(
					&AuthContext::unauthenticated(),
					&Requirement::new("approve_sales"),
					|| {
						created.set(true);
						async {}
					},
				)
				.await;
			assert_eq!(result.unwrap_err(), AuthzError::AuthenticationRequired);
			assert!(!created.get());
		}
	}

	mod property_tests {
		use super::*;

		fn arb_role() -> impl Strategy<Value = RoleId> {
			proptest::sample::select(RoleId::all().to_vec())
		}

		fn arb_owned_capability() -> impl Strategy<Value = &'static str> {
			proptest::sample::select(vec![
				"manage_store_own",
				"manage_users_own",
				"view_analytics_own",
			])
		}

		proptest! {
			#[test]
			fn ownership_enforcement(
				role in arb_role(),
				capability in arb_owned_capability(),
				owned in any::<Option<u128>>(),
				target in any::<Option<u128>>(),
			) {
				let guard = guard();
				let owned = owned.map(|v| StoreId::new(uuid::Uuid::from_u128(v)));
				let target = target.map(|v| StoreId::new(uuid::Uuid::from_u128(v)));

				let can = guard.checker().can(role, capability).unwrap();
				let owns = owned.is_some() && owned == target;

				let result = guard.check(
					&ctx(role, owned),
					&Requirement::new(capability).with_target(target),
				);
				prop_assert_eq!(result.is_ok(), can && owns);
			}
		}
	}
}
