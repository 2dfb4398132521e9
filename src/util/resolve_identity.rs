use crate::types::Identity;
use anyhow::{Context, Result, anyhow};
use nix::unistd::{Gid, Uid, User, getresgid, getresuid};
use std::path::PathBuf;

/**
 * Figures out who invoked us, before we touch our ids at all.
 *
 * Installed setuid-root, the real ids are the caller. Run through sudo, both
 * real and effective ids are root and SUDO_UID/SUDO_GID tell us who asked, so
 * the jailed command still runs as that user instead of root.
 */
pub fn resolve_identity() -> Result<Identity> {
    let resuid = getresuid()?;
    let resgid = getresgid()?;

    if !resuid.real.is_root() {
        return Ok(Identity::new(resuid.real, resgid.real));
    }

    let uid = match std::env::var("SUDO_UID") {
        Ok(uid) => match uid.parse::<u32>() {
            Ok(uid) => Uid::from_raw(uid),
            Err(_) => {
                return Err(anyhow!("Failed to parse SUDO_UID '{}'", uid));
            }
        },
        Err(_) => resuid.real,
    };

    let gid = match std::env::var("SUDO_GID") {
        Ok(gid) => match gid.parse::<u32>() {
            Ok(gid) => Gid::from_raw(gid),
            Err(_) => {
                return Err(anyhow!("Failed to parse SUDO_GID '{}'", gid));
            }
        },
        Err(_) => resgid.real,
    };

    Ok(Identity::new(uid, gid))
}

/// Home directory of `uid` from the passwd database.
pub fn lookup_home(uid: Uid) -> Result<PathBuf> {
    let user = User::from_uid(uid)
        .context(format!("Failed to look up user {}", uid))?
        .ok_or_else(|| anyhow!("No passwd entry for uid {}", uid))?;

    if !user.dir.is_absolute() {
        return Err(anyhow!(
            "Home directory is not absolute: {}",
            user.dir.display()
        ));
    }

    Ok(user.dir)
}
