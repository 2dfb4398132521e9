use super::Jail;
use crate::platform::Platform;
use crate::types::{MountMode, OverlaySpec};
use anyhow::{Context, Result};
use log::debug;
use std::path::Path;

impl<P: Platform> Jail<'_, P> {
    /// Creates `path`, tracks it, and hands it to the origin user.
    pub(super) fn create_tracked_dir(&mut self, path: &Path) -> Result<()> {
        self.platform.create_dir(path)?;
        self.tracker.register_directory(path)?;
        self.platform.chown(path, self.origin)
    }

    /**
     * Mounts a copy-on-write view of `lower` at `target`, with its upper and
     * work layers living under the scratch root.
     *
     * Everything created along the way is tracked as soon as it exists. On
     * failure nothing is undone here; whatever was tracked gets released by
     * the caller's cleanup.
     */
    pub fn build_overlay(
        &mut self,
        target: &Path,
        name: &str,
        lower: &Path,
    ) -> Result<()> {
        debug!(
            "Building overlay {} of {} at {}",
            name,
            lower.display(),
            target.display()
        );

        let upper = self.platform.create_unique_dir(&format!(
            "{}/{}_upper_",
            self.scratch_root.display(),
            name
        ))?;
        self.tracker.register_directory(&upper)?;
        self.platform.chown(&upper, self.origin)?;

        let work = self.scratch_root.join(format!("{}_work", name));
        self.create_tracked_dir(&work)?;
        // created by the overlay filesystem itself on mount
        self.tracker.register_directory(work.join("work"))?;

        let spec = OverlaySpec {
            lower: lower.to_path_buf(),
            upper,
            work,
            target: target.to_path_buf(),
        };

        match self.capabilities.mount_mode() {
            MountMode::Kernel => self.platform.mount_overlay(&spec),
            MountMode::Helper => self
                .platform
                .mount_overlay_helper(&self.tooling.overlay_helper, &spec),
        }
        .context(format!(
            "Failed to mount overlay of {} at {}",
            lower.display(),
            target.display()
        ))?;

        self.tracker.register_mount(target)
    }
}
