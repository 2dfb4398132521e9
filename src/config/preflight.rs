use super::Config;
use crate::types::Identity;
use crate::util::{can_access, check_path_for_mount_option_compatibility};
use anyhow::{Context, Result, anyhow};
use log::debug;
use nix::unistd::AccessFlags;
use std::path::PathBuf;

/**
 * Validates everything we can before touching the filesystem, so a bad
 * invocation never leaves anything behind. Returns the canonical scratch
 * root.
 *
 * Bind paths were already made absolute, checked for existence, option
 * characters and duplicates while the config was being resolved.
 */
pub fn preflight(config: &Config, origin: Identity) -> Result<PathBuf> {
    let Some(target) = &config.target else {
        return Err(anyhow!(
            "No jail directory given, use --target <DIR> (or set target in a config file)"
        ));
    };

    let target = std::fs::canonicalize(target)
        .context(format!("Jail directory {} does not exist", target.display()))?;

    if !target.is_dir() {
        return Err(anyhow!("{} is not a directory", target.display()));
    }

    can_access(&target, origin, AccessFlags::R_OK | AccessFlags::W_OK)
        .context(format!(
            "Jail directory {} must be readable and writable by {}",
            target.display(),
            origin
        ))?;

    check_path_for_mount_option_compatibility(&target)?;

    debug!("Jail directory: {}", target.display());
    Ok(target)
}
