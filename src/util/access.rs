use crate::types::Identity;
use anyhow::{Result, anyhow};
use log::trace;
use nix::unistd::{AccessFlags, eaccess, getegid, geteuid, setegid, seteuid};
use std::path::Path;

/**
 * Checks access to `path` as `identity` would see it, rather than as whatever
 * we happen to be running as (which may be root by now).
 */
pub fn can_access(
    path: &Path,
    identity: Identity,
    mode: AccessFlags,
) -> Result<()> {
    let current = Identity::new(geteuid(), getegid());

    trace!(
        "checking access mode {:#o} on {} as {} (currently {})",
        mode.bits(),
        path.display(),
        identity,
        current
    );

    let res = if current == identity {
        eaccess(path, mode)
    } else {
        setegid(identity.gid)?;
        seteuid(identity.uid)?;
        let res = eaccess(path, mode);
        seteuid(current.uid)?;
        setegid(current.gid)?;
        res
    };

    match res {
        Ok(_) => Ok(()),
        Err(e) => Err(anyhow!("Failed to access {}: {}", path.display(), e)),
    }
}
