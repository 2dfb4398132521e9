use super::Jail;
use crate::platform::Platform;
use crate::types::MountMode;
use log::{debug, warn};

impl<P: Platform> Jail<'_, P> {
    /// Unmounts then removes everything this jail created, newest first.
    /// Keeps going past failures. Returns how many resources were left
    /// behind.
    pub fn cleanup(&mut self) -> usize {
        let platform = self.platform;
        let mode = self.capabilities.mount_mode();
        let helper = &self.tooling.unmount_helper;

        let mut failures = self.tracker.teardown_mounts(|path| match mode {
            MountMode::Kernel => platform.unmount(path),
            MountMode::Helper => platform.unmount_helper(helper, path),
        });
        failures += self
            .tracker
            .teardown_directories(|path| platform.remove_tree(path));

        if failures > 0 {
            warn!(
                "{} jail resources could not be removed from {}",
                failures,
                self.scratch_root.display()
            );
        } else {
            debug!("Cleaned up {}", self.scratch_root.display());
        }
        failures
    }
}
