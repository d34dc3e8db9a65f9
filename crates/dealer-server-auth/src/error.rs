// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization and registry error types.

use http::StatusCode;
use thiserror::Error;

use crate::RoleId;

/// Errors produced while evaluating an authorization request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
	/// No principal was resolved for the request.
	#[error("authentication required")]
	AuthenticationRequired,

	/// The principal is not allowed to perform the requested capability.
	///
	/// This is the normal "no" outcome, not a fault.
	#[error("forbidden: role {role} may not {capability}")]
	Forbidden { role: RoleId, capability: String },

	/// The role is not registered. Indicates a configuration bug.
	#[error("unknown role: {0}")]
	UnknownRole(String),
}

impl AuthzError {
	/// Returns true for the expected deny outcome.
	pub fn is_forbidden(&self) -> bool {
		matches!(self, Self::Forbidden { .. })
	}

	/// HTTP status the surrounding server should answer with.
	pub fn status_code(&self) -> StatusCode {
		match self {
			Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
			Self::Forbidden { .. } => StatusCode::FORBIDDEN,
			Self::UnknownRole(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

/// Errors raised while validating a role table at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
	#[error("role {0} is defined more than once")]
	DuplicateRole(RoleId),

	#[error("role {role} inherits from undefined role {parent}")]
	UndefinedParent { role: RoleId, parent: RoleId },

	#[error("role {0} inherits from itself")]
	SelfInheritance(RoleId),

	#[error("role inheritance cycle through: {}", format_roles(.0))]
	Cycle(Vec<RoleId>),
}

fn format_roles(roles: &[RoleId]) -> String {
	roles
		.iter()
		.map(|r| r.as_str())
		.collect::<Vec<_>>()
		.join(", ")
}

pub type AuthzResult<T> = Result<T, AuthzError>;
