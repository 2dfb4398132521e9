use crate::types::Identity;
use anyhow::{Context, Result};
use log::{trace, warn};
use nix::unistd::{User, initgroups, setgid, setgroups, setuid};
use std::ffi::CString;

/**
 * Permanently switches to `identity`. Must be called while still root.
 *
 * Supplementary groups are reset first, otherwise a jail launched through
 * sudo would keep root's groups after the uid/gid switch.
 */
pub fn drop_privileges(identity: Identity) -> Result<()> {
    match User::from_uid(identity.uid) {
        Ok(Some(user)) => {
            let name = CString::new(user.name.as_str())
                .context("user name contains a NUL byte")?;
            trace!("initgroups({}, {})", user.name, identity.gid);
            initgroups(&name, identity.gid).context(format!(
                "failed to initialize groups for {}",
                user.name
            ))?;
        }
        _ => {
            warn!(
                "No passwd entry for uid {}, clearing supplementary groups",
                identity.uid
            );
            setgroups(&[identity.gid])
                .context("failed to clear supplementary groups")?;
        }
    }
    setgid(identity.gid)?;
    setuid(identity.uid)?;
    Ok(())
}
