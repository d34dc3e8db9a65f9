// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role-based access control for the dealership back office.
//!
//! Every protected route declares the capability it needs. The guard resolves
//! the caller's role through the inheritance graph and either lets the request
//! through or stops it before the handler runs.
//!
//! ```text
//! RoleRegistry ──► CapabilityResolver ──► PermissionChecker ──► RequestGuard ──► RequireCapability
//!  (static table)   (memoized closure)     (role, capability)    (+ ownership)     (tower layer)
//! ```
//!
//! # Design Principles
//!
//! - **Built once**: the role table is validated at startup and never mutated
//! - **Injected, not global**: callers own the registry and pass it down
//! - **Fail closed**: malformed capabilities, missing stores and mismatched
//!   targets all deny; only an unregistered role is an error
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use dealer_server_auth::{
//!     AuthContext, CapabilityResolver, PermissionChecker, Principal, RequestGuard, Requirement,
//!     RoleId, RoleRegistry, UserId,
//! };
//!
//! let registry = Arc::new(RoleRegistry::dealership());
//! let checker = PermissionChecker::new(Arc::new(CapabilityResolver::new(registry)));
//! assert!(checker.can(RoleId::ProcurementAdmin, "hunt_vehicles").unwrap());
//!
//! let guard = RequestGuard::new(checker);
//! let principal = Principal::new(UserId::generate(), RoleId::SalesExecutive);
//! let ctx = AuthContext::authenticated(principal);
//! assert!(guard.check(&ctx, &Requirement::new("approve_sales")).is_err());
//! ```

pub mod capability;
pub mod error;
pub mod guard;
pub mod layer;
pub mod middleware;
pub mod ownership;
pub mod permission;
pub mod registry;
pub mod resolver;
pub mod types;

pub use capability::{is_well_formed, Capability, CapabilitySet, UnknownCapability, WILDCARD};
pub use error::{AuthzError, AuthzResult, RegistryError};
pub use guard::{DenyReason, GuardDecision, RequestGuard, Requirement};
pub use layer::{RequireCapability, RequireCapabilityService};
pub use middleware::{AuthContext, TargetExtractor, STORE_ID_HEADER};
pub use ownership::{is_owned_action, OwnershipGate, DEFAULT_OWNERSHIP_SUFFIX};
pub use permission::PermissionChecker;
pub use registry::{dealership_definitions, RoleDefinition, RoleRegistry};
pub use resolver::CapabilityResolver;
pub use types::{Principal, RoleId, StoreId, UserId};
