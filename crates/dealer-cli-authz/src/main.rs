// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `dealer-authz`: inspect roles and answer permission questions offline.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dealer_cli_authz::commands::{self, EXIT_ERROR};
use dealer_cli_authz::{build_guard, registry_from_config};
use dealer_server_auth::{RoleId, StoreId};
use dealer_server_config::{LoggingConfig, ServerConfig};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Dealership authorization tool
#[derive(Parser, Debug)]
#[command(name = "dealer-authz", version, about, long_about = None)]
struct Args {
	/// Path to custom configuration file
	#[arg(short, long, env = "DEALER_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Decide whether a role may perform a capability
	Check {
		#[arg(long)]
		role: RoleId,

		#[arg(long)]
		capability: String,

		/// Store the principal owns
		#[arg(long)]
		store: Option<StoreId>,

		/// Store the action targets
		#[arg(long)]
		target: Option<StoreId>,
	},

	/// Print a role's effective capabilities
	Resolve {
		#[arg(long)]
		role: RoleId,
	},

	/// List roles, parents first
	Roles,

	/// Validate the configured role table
	Validate,
}

fn init_tracing(logging: &LoggingConfig) {
	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| logging.level.clone().into()))
		.with(fmt::layer().with_writer(std::io::stderr))
		.init();
}

fn load_config(path: Option<&PathBuf>) -> Result<ServerConfig> {
	match path {
		Some(path) => dealer_server_config::load_config_with_file(path)
			.with_context(|| format!("failed to load configuration from {}", path.display())),
		None => dealer_server_config::load_config().context("failed to load configuration"),
	}
}

fn run(args: Args) -> Result<u8> {
	let config = load_config(args.config.as_ref())?;
	init_tracing(&config.logging);

	info!(
		ownership_suffix = %config.authz.ownership_suffix,
		custom_roles = config.authz.has_custom_roles(),
		"starting dealer-authz"
	);

	match args.command {
		Command::Check {
			role,
			capability,
			store,
			target,
		} => {
			let guard = build_guard(&config.authz).context("failed to build role registry")?;
			let decision = commands::check(&guard, role, &capability, store, target)?;
			println!("{}", commands::format_decision(decision));
			Ok(commands::exit_status(decision))
		}
		Command::Resolve { role } => {
			let guard = build_guard(&config.authz).context("failed to build role registry")?;
			for name in commands::resolve(&guard, role)? {
				println!("{name}");
			}
			Ok(commands::EXIT_ALLOWED)
		}
		Command::Roles => {
			let registry =
				registry_from_config(&config.authz).context("failed to build role registry")?;
			for line in commands::list_roles(&registry) {
				println!("{line}");
			}
			Ok(commands::EXIT_ALLOWED)
		}
		Command::Validate => {
			let registry = registry_from_config(&config.authz).context("role table is invalid")?;
			println!("ok: {} roles", registry.len());
			Ok(commands::EXIT_ALLOWED)
		}
	}
}

fn main() -> ExitCode {
	let args = Args::parse();

	match run(args) {
		Ok(status) => ExitCode::from(status),
		Err(e) => {
			eprintln!("error: {e:#}");
			ExitCode::from(EXIT_ERROR)
		}
	}
}
