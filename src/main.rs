#![allow(
    clippy::collapsible_else_if,
    clippy::collapsible_if,
    clippy::module_inception,
    clippy::new_without_default,
    clippy::result_map_unit_fn
)]
#![deny(
    clippy::get_unwrap,
    clippy::panic,
    clippy::print_stdout,
    clippy::unwrap_used,
    clippy::use_debug,
    clippy::used_underscore_binding,
    clippy::used_underscore_items
)]

mod actions;
mod config;
mod jail;
mod logger;
mod platform;
mod types;
mod util;

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser};
use clap_complete::CompleteEnv;
use config::{cli, preflight, resolve_config};
use jail::Supervised;
use log::{Log, error};
use platform::LinuxPlatform;
use util::resolve_identity;

pub fn main() -> Result<()> {
    let logger = logger::JailLogger::new(log::LevelFilter::Trace)
        .init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;
    let cli: cli::Args = cli::Args::parse();

    logger.set_level(cli.log_level.unwrap_or(log::LevelFilter::Info));

    let origin = resolve_identity().context("Resolving invoking user")?;
    let config =
        resolve_config(cli.clone(), origin).context("Resolving config")?;

    // Tab completion. Doesn't return if completion was requested.
    if std::env::var("COMPLETE").is_ok() {
        CompleteEnv::with_factory(cli::Args::command).complete();
        return Ok(());
    }

    // The level is final now, flush whatever was logged while loading config
    logger.set_level(config.log_level);
    logger.print_deferred();

    if let Some(cli::Action::Config { keys }) = cli.action {
        let result = actions::config(&config, keys);
        logger.flush();
        return result;
    }

    let scratch_root = preflight(&config, origin)?;

    let command = match cli.command {
        Some(command) if !command.is_empty() => command,
        _ => vec![std::env::var("SHELL").unwrap_or("sh".to_string())],
    };

    let supervised = jail::run(
        &LinuxPlatform::new(),
        &config,
        &scratch_root,
        origin,
        &command,
    )?;

    match supervised {
        Supervised::Supervisor(_) => {
            logger.flush();
            Ok(())
        }
        Supervised::Jailed(e) => {
            // Never unwind back into the supervisor's half of main
            error!("{:#}", e);
            logger.flush();
            std::process::exit(1);
        }
    }
}
