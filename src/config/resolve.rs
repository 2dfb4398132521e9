use super::impls::parse_env_bool;
use super::{Config, DEFAULT_OVERLAY_HELPER, DEFAULT_UNMOUNT_HELPER, PartialConfig};
use crate::types::{BindTargets, Identity};
use crate::util::{
    can_access, check_path_for_mount_option_compatibility, expand_tilde_path,
    lookup_home,
};
use anyhow::{Context, Result, anyhow};
use log::trace;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::{env, str::FromStr};

use super::cli::Args;

pub fn resolve_config(cli: Args, identity: Identity) -> Result<Config> {
    let (mut partial_config, mut sources) =
        load_partial(cli.no_config, identity)?;

    // Environment overrides config files
    if let Ok(log_level) = env::var("COWJAIL_LOG_LEVEL") {
        if let Ok(log_level) = log::LevelFilter::from_str(&log_level) {
            partial_config.log_level = Some(log_level);
            sources.insert("log_level".into(), "environment".into());
        } else {
            return Err(anyhow!("Invalid log level: {}", log_level));
        }
    }

    if let Ok(target) = env::var("COWJAIL_TARGET") {
        if !target.is_empty() {
            partial_config.target = Some(target);
            sources.insert("target".into(), "environment".into());
        }
    }

    // Bind mounts are additive across every source
    if let Ok(binds_env) = env::var("COWJAIL_BIND") {
        let env_binds: Vec<String> = binds_env
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if !env_binds.is_empty() {
            match &mut partial_config.bind {
                Some(existing) => existing.extend(env_binds),
                None => partial_config.bind = Some(env_binds),
            }
            sources.insert("bind".into(), "environment".into());
        }
    }

    for (var, key) in [
        ("COWJAIL_NO_HOME", "no_home"),
        ("COWJAIL_NO_CHROOT", "no_chroot"),
    ] {
        if let Ok(value) = env::var(var) {
            let parsed = parse_env_bool(&value).ok_or_else(|| {
                anyhow!("Invalid value for {}: {}", var, value)
            })?;
            match key {
                "no_home" => partial_config.no_home = Some(parsed),
                _ => partial_config.no_chroot = Some(parsed),
            }
            sources.insert(key.into(), "environment".into());
        }
    }

    if let Ok(helper) = env::var("COWJAIL_OVERLAY_HELPER") {
        if !helper.is_empty() {
            partial_config.overlay_helper = Some(helper);
            sources.insert("overlay_helper".into(), "environment".into());
        }
    }

    if let Ok(helper) = env::var("COWJAIL_UNMOUNT_HELPER") {
        if !helper.is_empty() {
            partial_config.unmount_helper = Some(helper);
            sources.insert("unmount_helper".into(), "environment".into());
        }
    }

    // CLI has the final word
    if let Some(log_level) = cli.log_level {
        partial_config.log_level = Some(log_level);
        sources.insert("log_level".into(), "cli".into());
    }

    if let Some(target) = cli.target {
        partial_config.target = Some(target);
        sources.insert("target".into(), "cli".into());
    }

    if let Some(cli_binds) = cli.bind {
        match &mut partial_config.bind {
            Some(existing) => existing.extend(cli_binds),
            None => partial_config.bind = Some(cli_binds),
        }
        sources.insert("bind".into(), "cli".into());
    }

    if cli.no_home {
        partial_config.no_home = Some(true);
        sources.insert("no_home".into(), "cli".into());
    }

    if cli.no_chroot {
        partial_config.no_chroot = Some(true);
        sources.insert("no_chroot".into(), "cli".into());
    }

    finalize(partial_config, sources, identity)
}

/* Fills in defaults and turns the raw strings into checked paths. */
fn finalize(
    partial_config: PartialConfig,
    mut sources: HashMap<String, String>,
    identity: Identity,
) -> Result<Config> {
    let target = partial_config
        .target
        .map(|t| expand_tilde_path(Path::new(&t), identity))
        .transpose()
        .context("Resolving target directory")?;

    let mut binds = BindTargets::new();
    for bind in partial_config.bind.unwrap_or_default() {
        let path = resolve_bind_path(&bind, identity)?;
        binds.push(path)?;
    }

    for key in [
        "log_level",
        "target",
        "bind",
        "no_home",
        "no_chroot",
        "overlay_helper",
        "unmount_helper",
    ] {
        sources.entry(key.into()).or_insert_with(|| "default".into());
    }

    let config = Config {
        log_level: partial_config.log_level.unwrap_or(log::LevelFilter::Info),
        target,
        binds,
        no_home: partial_config.no_home.unwrap_or(false),
        no_chroot: partial_config.no_chroot.unwrap_or(false),
        overlay_helper: partial_config
            .overlay_helper
            .unwrap_or(DEFAULT_OVERLAY_HELPER.to_string()),
        unmount_helper: partial_config
            .unmount_helper
            .unwrap_or(DEFAULT_UNMOUNT_HELPER.to_string()),
        sources,
    };

    if let Some(target) = &config.target {
        trace!("Target: {}", target.display());
    }
    trace!("Binds: {}", config.binds);

    Ok(config)
}

/* Bind paths become absolute and symlink free, so the same directory given
 * two different ways is still caught as a duplicate. */
fn resolve_bind_path(bind: &str, identity: Identity) -> Result<PathBuf> {
    let expanded = expand_tilde_path(Path::new(bind), identity)?;
    let path = std::fs::canonicalize(&expanded)
        .context(format!("Bind mount {} does not exist", bind))?;
    check_path_for_mount_option_compatibility(&path)
        .context(format!("Bind mount {} can't be mirrored", bind))?;
    Ok(path)
}

pub fn load_partial(
    no_config: bool,
    identity: Identity,
) -> Result<(PartialConfig, HashMap<String, String>)> {
    let config_paths = if no_config {
        vec![]
    } else {
        find_config_files(identity)?
    };
    let mut sources = HashMap::new();
    if config_paths.is_empty() {
        trace!("No config files found, using default config");
        return Ok((PartialConfig::default(), sources));
    }

    let mut merged_config = PartialConfig::default();
    for path in config_paths.iter() {
        let config_str = std::fs::read_to_string(path).context(format!(
            "Failed to read config file {}",
            path.display()
        ))?;

        let config: PartialConfig = toml::from_str(&config_str).context(
            format!("Failed to parse config file {}", path.display()),
        )?;

        merge_configs(
            &mut merged_config,
            &mut sources,
            config,
            &path.display().to_string(),
        );
        trace!("Loaded config file: {}", path.display());
    }

    Ok((merged_config, sources))
}

/** Config files that exist and are readable, lowest precedence first */
fn find_config_files(identity: Identity) -> Result<Vec<PathBuf>> {
    let home = lookup_home(identity.uid).ok();
    let mut paths_to_check = Vec::new();

    // .cowjail.toml in the current directory and its parents, up to home
    let mut current_dir = std::env::current_dir()?;
    loop {
        paths_to_check.push(current_dir.join(".cowjail.toml"));
        if Some(&current_dir) == home.as_ref() || !current_dir.pop() {
            break;
        }
    }

    if let Some(home) = &home {
        paths_to_check.push(home.join(".config/cowjail/config.toml"));
    }

    paths_to_check.push(PathBuf::from("/etc/cowjail.toml"));

    paths_to_check.reverse();

    Ok(paths_to_check
        .into_iter()
        .filter(|path| {
            path.is_file()
                && can_access(path, identity, nix::unistd::AccessFlags::R_OK)
                    .is_ok()
        })
        .collect())
}

fn merge_configs(
    base: &mut PartialConfig,
    sources: &mut HashMap<String, String>,
    override_config: PartialConfig,
    source: &str,
) {
    if let Some(log_level) = override_config.log_level {
        base.log_level = Some(log_level);
        sources.insert("log_level".into(), source.into());
    }
    if let Some(target) = override_config.target {
        base.target = Some(target);
        sources.insert("target".into(), source.into());
    }
    if let Some(no_home) = override_config.no_home {
        base.no_home = Some(no_home);
        sources.insert("no_home".into(), source.into());
    }
    if let Some(no_chroot) = override_config.no_chroot {
        base.no_chroot = Some(no_chroot);
        sources.insert("no_chroot".into(), source.into());
    }
    if let Some(helper) = override_config.overlay_helper {
        base.overlay_helper = Some(helper);
        sources.insert("overlay_helper".into(), source.into());
    }
    if let Some(helper) = override_config.unmount_helper {
        base.unmount_helper = Some(helper);
        sources.insert("unmount_helper".into(), source.into());
    }
    if let Some(binds) = override_config.bind {
        match &mut base.bind {
            Some(existing) => existing.extend(binds),
            None => base.bind = Some(binds),
        }
        sources.insert("bind".into(), source.into());
    }
}
