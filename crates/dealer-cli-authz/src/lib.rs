// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Library half of the `dealer-authz` operator CLI.

pub mod commands;
pub mod roles;

pub use roles::{build_guard, registry_from_config, RoleTableError};
