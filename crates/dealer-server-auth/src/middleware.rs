// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request-side helpers for the authorization pipeline.
//!
//! This module provides:
//! - [`AuthContext`] - the authentication outcome the guard consumes
//! - [`TargetExtractor`] - how a route names the store it acts on
//! - Helper functions for pulling a store id out of a path or header
//!
//! # Flow
//!
//! ```text
//! Request → authentication (external) → AuthContext in extensions
//!         → TargetExtractor → Requirement → RequestGuard → handler | 401/403
//! ```
//!
//! Authentication itself (sessions, tokens, password checks) is not done here.

use http::{HeaderMap, HeaderName, Uri};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AuthzError;
use crate::{Principal, StoreId};

/// Header carrying the target store id when routes do not embed it in the path.
pub const STORE_ID_HEADER: &str = "x-store-id";

/// Authentication state for a request.
///
/// The authentication stage inserts this into request extensions. A request
/// with no context is treated as unauthenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
	pub principal: Option<Principal>,
}

impl AuthContext {
	/// Create a new unauthenticated context.
	pub fn unauthenticated() -> Self {
		Self { principal: None }
	}

	/// Create a new authenticated context.
	pub fn authenticated(principal: Principal) -> Self {
		Self {
			principal: Some(principal),
		}
	}

	pub fn is_authenticated(&self) -> bool {
		self.principal.is_some()
	}

	pub fn principal(&self) -> Option<&Principal> {
		self.principal.as_ref()
	}

	/// Require authentication, returning the principal or an error.
	pub fn require_principal(&self) -> Result<&Principal, AuthzError> {
		self.principal.as_ref().ok_or(AuthzError::AuthenticationRequired)
	}
}

/// Where a route finds the store it operates on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TargetExtractor {
	/// The route has no target store.
	#[default]
	None,
	/// Zero-based path segment, e.g. `1` for `/stores/{id}/users`.
	PathSegment(usize),
	/// A request header.
	Header(HeaderName),
}

impl TargetExtractor {
	/// The conventional `x-store-id` header.
	pub fn store_header() -> Self {
		Self::Header(HeaderName::from_static(STORE_ID_HEADER))
	}

	/// Pull the target store out of a request. Unparsable ids count as absent.
	pub fn extract(&self, uri: &Uri, headers: &HeaderMap) -> Option<StoreId> {
		match self {
			Self::None => None,
			Self::PathSegment(index) => store_id_from_path(uri.path(), *index),
			Self::Header(name) => store_id_from_header(headers, name),
		}
	}
}

/// Extract a store id from the `index`-th non-empty path segment.
///
/// # Returns
///
/// The parsed id, or `None` if the segment is missing or not a UUID.
pub fn store_id_from_path(path: &str, index: usize) -> Option<StoreId> {
	path
		.split('/')
		.filter(|segment| !segment.is_empty())
		.nth(index)?
		.parse()
		.ok()
}

/// Extract a store id from a header.
#[instrument(level = "trace", skip_all, fields(header = %name))]
pub fn store_id_from_header(headers: &HeaderMap, name: &HeaderName) -> Option<StoreId> {
	headers.get(name)?.to_str().ok()?.trim().parse().ok()
}
