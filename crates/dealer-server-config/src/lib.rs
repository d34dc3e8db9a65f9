// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the dealership server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`DEALER_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use dealer_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("ownership suffix: {}", config.authz.ownership_suffix);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub authz: AuthzConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`DEALER_SERVER_*`)
/// 2. Config file (`/etc/dealer/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	let mut merged = ServerConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let authz = layer.authz.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&authz)?;

	info!(
		ownership_suffix = %authz.ownership_suffix,
		custom_roles = authz.has_custom_roles(),
		log_level = %logging.level,
		"Server configuration loaded"
	);

	Ok(ServerConfig { authz, logging })
}

/// Validate cross-field configuration rules.
fn validate_config(authz: &AuthzConfig) -> Result<(), ConfigError> {
	let suffix = &authz.ownership_suffix;
	if suffix.is_empty() {
		return Err(ConfigError::Validation(
			"authz.ownership_suffix is empty. Every capability would be treated as \
			 ownership-scoped; leave it unset to use the default \"_own\"."
				.to_string(),
		));
	}

	if !suffix
		.bytes()
		.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
	{
		return Err(ConfigError::InvalidValue {
			key: "authz.ownership_suffix".to_string(),
			message: format!("'{suffix}' may only contain lowercase letters, digits and '_'"),
		});
	}

	Ok(())
}
