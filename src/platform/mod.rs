//! Every side effect the jail has on the host goes through [`Platform`].
//!
//! [`LinuxPlatform`] is the real thing. Tests swap in a recording fake so the
//! ordering of privileged operations can be checked without being root.

mod linux;

#[cfg(test)]
pub mod fake;

pub use linux::LinuxPlatform;

use crate::types::{Identity, OverlaySpec};
use crate::util::Removal;
use anyhow::Result;
use nix::sys::signal::Signal;
use nix::unistd::{Pid, Uid};
use std::convert::Infallible;
use std::path::{Path, PathBuf};

/// Which side of the fork we ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fork {
    Parent(Pid),
    Child,
}

/// How the jailed process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JailExit {
    Exited(i32),
    Signaled(Signal),
}

impl std::fmt::Display for JailExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JailExit::Exited(code) => write!(f, "exited with status {}", code),
            JailExit::Signaled(sig) => write!(f, "was killed by {}", sig.as_str()),
        }
    }
}

pub trait Platform {
    fn create_dir(&self, path: &Path) -> Result<()>;
    /// Creates `<prefix><random>` and returns its path.
    fn create_unique_dir(&self, prefix: &str) -> Result<PathBuf>;
    fn chown(&self, path: &Path, identity: Identity) -> Result<()>;
    fn remove_tree(&self, path: &Path) -> Result<Removal>;

    fn mount_overlay(&self, spec: &OverlaySpec) -> Result<()>;
    fn mount_overlay_helper(&self, helper: &str, spec: &OverlaySpec)
    -> Result<()>;
    fn mount_special(&self, fstype: &str, target: &Path) -> Result<()>;
    fn unmount(&self, target: &Path) -> Result<()>;
    fn unmount_helper(&self, helper: &str, target: &Path) -> Result<()>;

    fn elevate(&self) -> Result<()>;
    fn drop_privileges(&self, identity: Identity) -> Result<()>;
    fn real_identity(&self) -> Result<Identity>;
    fn effective_identity(&self) -> Result<Identity>;
    fn home_dir(&self, uid: Uid) -> Result<PathBuf>;

    fn isolate_mount_namespace(&self) -> Result<()>;
    /// chdir into `root`, then chroot there.
    fn change_root(&self, root: &Path) -> Result<()>;
    fn change_dir(&self, path: &Path) -> Result<()>;
    fn current_dir(&self) -> Result<PathBuf>;
    /// Replaces the process image. Only ever returns with an error.
    fn exec(&self, argv: &[String], env: &[(&str, String)])
    -> Result<Infallible>;

    fn fork(&self) -> Result<Fork>;
    fn ignore_interrupts(&self) -> Result<()>;
    fn wait_for(&self, child: Pid) -> Result<JailExit>;
}
