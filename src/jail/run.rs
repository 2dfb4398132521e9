use super::privilege::try_elevate;
use super::{Jail, MountTooling, Supervised};
use crate::config::Config;
use crate::platform::Platform;
use crate::types::{Capabilities, Identity};
use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::Path;

/**
 * Builds a jail under `scratch_root`, runs `command` in it and tears it all
 * down again.
 *
 * Returns in both processes: the supervisor once the command has finished
 * and the jail is gone, the jailed process only if exec failed. A setup
 * failure is cleaned up before the error is returned.
 */
pub fn run<P: Platform>(
    platform: &P,
    config: &Config,
    scratch_root: &Path,
    origin: Identity,
    command: &[String],
) -> Result<Supervised> {
    let capabilities = Capabilities::resolve(
        try_elevate(platform),
        config.no_chroot,
        config.no_home,
    );
    debug!(
        "elevated={} isolate={} chroot={} home={}",
        capabilities.can_elevate,
        capabilities.can_isolate_namespace,
        capabilities.can_chroot,
        capabilities.can_auto_mount_home
    );

    let home = if capabilities.can_auto_mount_home {
        match platform.home_dir(origin.uid) {
            Ok(home) => Some(home),
            Err(e) => {
                warn!("Not mirroring home directory: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    let mut jail = Jail::new(
        platform,
        scratch_root,
        origin,
        capabilities,
        MountTooling::from(config),
    );

    if let Err(e) = jail.build(&config.binds, home.as_deref()) {
        jail.cleanup();
        return Err(e).context("Failed to set up the jail");
    }

    match jail.supervise(command) {
        Ok(supervised) => Ok(supervised),
        Err(e) => {
            jail.cleanup();
            Err(e)
        }
    }
}
