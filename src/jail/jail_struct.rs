use super::ResourceTracker;
use crate::config::Config;
use crate::platform::Platform;
use crate::types::{Capabilities, Identity};
use log::debug;
use std::path::{Path, PathBuf};

/// The user-space programs used when we couldn't become root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountTooling {
    pub overlay_helper: String,
    pub unmount_helper: String,
}

impl From<&Config> for MountTooling {
    fn from(config: &Config) -> Self {
        MountTooling {
            overlay_helper: config.overlay_helper.clone(),
            unmount_helper: config.unmount_helper.clone(),
        }
    }
}

pub struct Jail<'p, P: Platform> {
    pub(super) platform: &'p P,
    pub scratch_root: PathBuf,
    pub root: PathBuf, // <scratch_root>/root, becomes / inside the jail
    pub origin: Identity,
    pub capabilities: Capabilities,
    pub tooling: MountTooling,
    pub(super) tracker: ResourceTracker,
}

impl<'p, P: Platform> Jail<'p, P> {
    pub fn new(
        platform: &'p P,
        scratch_root: &Path,
        origin: Identity,
        capabilities: Capabilities,
        tooling: MountTooling,
    ) -> Self {
        Jail {
            platform,
            scratch_root: scratch_root.to_path_buf(),
            root: scratch_root.join("root"),
            origin,
            capabilities,
            tooling,
            tracker: ResourceTracker::new(),
        }
    }

    #[cfg(test)]
    pub fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }
}

/* Safety net for early returns. The explicit cleanup paths empty the
 * tracker, so this only does work when one of them was skipped. */
impl<P: Platform> Drop for Jail<'_, P> {
    fn drop(&mut self) {
        if !self.tracker.is_empty() {
            debug!(
                "Jail in {} dropped while still holding resources, cleaning up",
                self.scratch_root.display()
            );
            self.cleanup();
        }
    }
}
