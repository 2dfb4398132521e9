/**
 * What this run is allowed to do. Computed exactly once, right after we try to
 * become root, and never changed afterwards.
 *
 * Without root we can't unshare a mount namespace, chroot, or mount the
 * overlay filesystem ourselves, so everything degrades to the user-space
 * helpers and a plain chdir into the jail root.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub can_elevate: bool,
    pub can_isolate_namespace: bool,
    pub can_chroot: bool,
    pub can_auto_mount_home: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountMode {
    /// mount(2)/umount2(2) issued directly
    Kernel,
    /// fuse-overlayfs and fusermount (or whatever is configured)
    Helper,
}

impl Capabilities {
    pub fn resolve(elevated: bool, no_chroot: bool, no_home: bool) -> Self {
        Capabilities {
            can_elevate: elevated,
            can_isolate_namespace: elevated && !no_chroot,
            can_chroot: elevated && !no_chroot,
            can_auto_mount_home: elevated && !no_home,
        }
    }

    pub fn mount_mode(&self) -> MountMode {
        if self.can_elevate {
            MountMode::Kernel
        } else {
            MountMode::Helper
        }
    }
}
