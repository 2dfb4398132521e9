use super::Jail;
use crate::platform::Platform;
use anyhow::{Context, Result, anyhow};
use log::{debug, info, trace};

/// Attempts to become root. Not being able to is not an error, it just
/// means running in fallback mode.
pub fn try_elevate<P: Platform>(platform: &P) -> bool {
    match platform.elevate() {
        Ok(()) => {
            debug!("Running with root privileges");
            true
        }
        Err(e) => {
            info!(
                "Not running as root ({:#}), using user-space overlays without a chroot",
                e
            );
            false
        }
    }
}

impl<P: Platform> Jail<'_, P> {
    /**
     * Permanently drops back to the identity that started us, then checks
     * that it actually happened. Anything else and the jailed command
     * must not run.
     */
    pub(super) fn restore_origin_identity(&self) -> Result<()> {
        trace!("Dropping privileges to {}", self.origin);
        self.platform
            .drop_privileges(self.origin)
            .context(format!("Failed to drop privileges to {}", self.origin))?;

        let real = self.platform.real_identity()?;
        let effective = self.platform.effective_identity()?;
        if real != self.origin || effective != self.origin {
            return Err(anyhow!(
                "Still running as {} (effective {}) after dropping privileges to {}",
                real,
                effective,
                self.origin
            ));
        }
        Ok(())
    }
}
