use super::Jail;
use crate::platform::Platform;
use crate::types::BindTargets;
use anyhow::{Context, Result};
use log::debug;
use std::path::Path;

const SPECIAL_MOUNTS: [(&str, &str); 2] = [("sysfs", "sys"), ("proc", "proc")];

impl<P: Platform> Jail<'_, P> {
    /**
     * Lays out the jail under the scratch root: the root overlay of /, the
     * pseudo filesystems when we'll be chrooting, then the home directory and
     * the bind targets, each mirrored through its own overlay.
     *
     * Stops at the first failure. Whatever was created is still tracked.
     */
    pub fn build(
        &mut self,
        binds: &BindTargets,
        home: Option<&Path>,
    ) -> Result<()> {
        let root = self.root.clone();
        self.create_tracked_dir(&root)?;
        self.build_overlay(&root, "root", Path::new("/"))?;

        if self.capabilities.can_chroot {
            for (fstype, dir) in SPECIAL_MOUNTS {
                let target = root.join(dir);
                self.platform.mount_special(fstype, &target).context(
                    format!("Failed to mount {} at {}", fstype, target.display()),
                )?;
                self.tracker.register_mount(target)?;
            }
        }

        match home {
            Some(home) if self.capabilities.can_auto_mount_home => {
                if binds.contains(home) {
                    debug!("{} is bound explicitly", home.display());
                } else {
                    self.mirror(home)?;
                }
            }
            _ => {}
        }

        for path in binds.iter() {
            self.mirror(path)?;
        }

        debug!("Jail built in {}", self.scratch_root.display());
        Ok(())
    }
}
