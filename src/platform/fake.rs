use super::{Fork, JailExit, Platform};
use crate::types::{Identity, OverlaySpec};
use crate::util::Removal;
use anyhow::{Result, anyhow};
use nix::unistd::{Gid, Pid, Uid};
use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateDir(PathBuf),
    Chown(PathBuf, Identity),
    RemoveTree(PathBuf),
    MountOverlay(OverlaySpec),
    MountOverlayHelper(String, OverlaySpec),
    MountSpecial(String, PathBuf),
    Unmount(PathBuf),
    UnmountHelper(String, PathBuf),
    Elevate,
    DropPrivileges(Identity),
    IsolateMountNamespace,
    ChangeRoot(PathBuf),
    ChangeDir(PathBuf),
    Exec(Vec<String>, Vec<(String, String)>),
    Fork,
    IgnoreInterrupts,
    WaitFor(Pid),
}

impl Call {
    /// The path this call acts on, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Call::CreateDir(p)
            | Call::Chown(p, _)
            | Call::RemoveTree(p)
            | Call::MountSpecial(_, p)
            | Call::Unmount(p)
            | Call::UnmountHelper(_, p)
            | Call::ChangeRoot(p)
            | Call::ChangeDir(p) => Some(p),
            Call::MountOverlay(spec) | Call::MountOverlayHelper(_, spec) => {
                Some(&spec.target)
            }
            _ => None,
        }
    }

    pub fn is_mount(&self) -> bool {
        matches!(
            self,
            Call::MountOverlay(_)
                | Call::MountOverlayHelper(_, _)
                | Call::MountSpecial(_, _)
        )
    }
}

pub const ORIGIN_UID: u32 = 1000;
pub const ORIGIN_GID: u32 = 1000;

pub fn origin() -> Identity {
    Identity::new(Uid::from_raw(ORIGIN_UID), Gid::from_raw(ORIGIN_GID))
}

/**
 * Records every call in order. Calls can be made to fail either by exact
 * match, or by the path they touch.
 */
pub struct FakePlatform {
    calls: RefCell<Vec<Call>>,
    fail_calls: RefCell<Vec<Call>>,
    fail_paths: RefCell<Vec<PathBuf>>,
    missing: RefCell<Vec<PathBuf>>,
    unique_counter: Cell<u32>,
    pub allow_elevate: bool,
    /// When set, drop_privileges "succeeds" without changing anything.
    pub sticky_root: bool,
    pub real: Cell<Identity>,
    pub effective: Cell<Identity>,
    pub cwd: Option<PathBuf>,
    pub home: Option<PathBuf>,
    pub fork_result: Fork,
    pub exit: JailExit,
}

impl FakePlatform {
    pub fn new() -> Self {
        FakePlatform {
            calls: RefCell::new(Vec::new()),
            fail_calls: RefCell::new(Vec::new()),
            fail_paths: RefCell::new(Vec::new()),
            missing: RefCell::new(Vec::new()),
            unique_counter: Cell::new(0),
            allow_elevate: true,
            sticky_root: false,
            real: Cell::new(origin()),
            effective: Cell::new(Identity::root()),
            cwd: Some(PathBuf::from("/home/user/project")),
            home: Some(PathBuf::from("/home/user")),
            fork_result: Fork::Parent(Pid::from_raw(4242)),
            exit: JailExit::Exited(0),
        }
    }

    /// A platform we're not allowed to become root on.
    pub fn unprivileged() -> Self {
        let platform = FakePlatform {
            allow_elevate: false,
            ..FakePlatform::new()
        };
        platform.effective.set(origin());
        platform
    }

    pub fn fail_call(&self, call: Call) {
        self.fail_calls.borrow_mut().push(call);
    }

    pub fn fail_path<P: AsRef<Path>>(&self, path: P) {
        self.fail_paths.borrow_mut().push(path.as_ref().to_path_buf());
    }

    /// remove_tree on `path` reports it as already gone.
    pub fn mark_missing<P: AsRef<Path>>(&self, path: P) {
        self.missing.borrow_mut().push(path.as_ref().to_path_buf());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: Call) -> Result<()> {
        let fails = self.fail_calls.borrow().contains(&call)
            || call
                .path()
                .map(|p| self.fail_paths.borrow().iter().any(|f| f == p))
                .unwrap_or(false);
        let index = self.calls.borrow().len();
        self.calls.borrow_mut().push(call);
        if fails {
            Err(anyhow!("injected failure at call #{}", index))
        } else {
            Ok(())
        }
    }
}

impl Platform for FakePlatform {
    fn create_dir(&self, path: &Path) -> Result<()> {
        self.record(Call::CreateDir(path.to_path_buf()))
    }

    fn create_unique_dir(&self, prefix: &str) -> Result<PathBuf> {
        let n = self.unique_counter.get();
        self.unique_counter.set(n + 1);
        let path = PathBuf::from(format!("{}{:012}", prefix, n));
        self.record(Call::CreateDir(path.clone()))?;
        Ok(path)
    }

    fn chown(&self, path: &Path, identity: Identity) -> Result<()> {
        self.record(Call::Chown(path.to_path_buf(), identity))
    }

    fn remove_tree(&self, path: &Path) -> Result<Removal> {
        self.record(Call::RemoveTree(path.to_path_buf()))?;
        if self.missing.borrow().iter().any(|m| m == path) {
            Ok(Removal::Missing)
        } else {
            Ok(Removal::Removed)
        }
    }

    fn mount_overlay(&self, spec: &OverlaySpec) -> Result<()> {
        self.record(Call::MountOverlay(spec.clone()))
    }

    fn mount_overlay_helper(
        &self,
        helper: &str,
        spec: &OverlaySpec,
    ) -> Result<()> {
        self.record(Call::MountOverlayHelper(helper.to_string(), spec.clone()))
    }

    fn mount_special(&self, fstype: &str, target: &Path) -> Result<()> {
        self.record(Call::MountSpecial(
            fstype.to_string(),
            target.to_path_buf(),
        ))
    }

    fn unmount(&self, target: &Path) -> Result<()> {
        self.record(Call::Unmount(target.to_path_buf()))
    }

    fn unmount_helper(&self, helper: &str, target: &Path) -> Result<()> {
        self.record(Call::UnmountHelper(
            helper.to_string(),
            target.to_path_buf(),
        ))
    }

    fn elevate(&self) -> Result<()> {
        self.record(Call::Elevate)?;
        if !self.allow_elevate {
            return Err(anyhow!("EPERM"));
        }
        self.real.set(Identity::root());
        self.effective.set(Identity::root());
        Ok(())
    }

    fn drop_privileges(&self, identity: Identity) -> Result<()> {
        self.record(Call::DropPrivileges(identity))?;
        if !self.sticky_root {
            self.real.set(identity);
            self.effective.set(identity);
        }
        Ok(())
    }

    fn real_identity(&self) -> Result<Identity> {
        Ok(self.real.get())
    }

    fn effective_identity(&self) -> Result<Identity> {
        Ok(self.effective.get())
    }

    fn home_dir(&self, uid: Uid) -> Result<PathBuf> {
        self.home
            .clone()
            .ok_or_else(|| anyhow!("no home directory for uid {}", uid))
    }

    fn isolate_mount_namespace(&self) -> Result<()> {
        self.record(Call::IsolateMountNamespace)
    }

    fn change_root(&self, root: &Path) -> Result<()> {
        self.record(Call::ChangeRoot(root.to_path_buf()))
    }

    fn change_dir(&self, path: &Path) -> Result<()> {
        self.record(Call::ChangeDir(path.to_path_buf()))
    }

    fn current_dir(&self) -> Result<PathBuf> {
        self.cwd
            .clone()
            .ok_or_else(|| anyhow!("current directory was removed"))
    }

    fn exec(
        &self,
        argv: &[String],
        env: &[(&str, String)],
    ) -> Result<Infallible> {
        self.record(Call::Exec(
            argv.to_vec(),
            env.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        ))?;
        Err(anyhow!("exec is not available in tests"))
    }

    fn fork(&self) -> Result<Fork> {
        self.record(Call::Fork)?;
        Ok(self.fork_result)
    }

    fn ignore_interrupts(&self) -> Result<()> {
        self.record(Call::IgnoreInterrupts)
    }

    fn wait_for(&self, child: Pid) -> Result<JailExit> {
        self.record(Call::WaitFor(child))?;
        Ok(self.exit)
    }
}
