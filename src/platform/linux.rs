use super::{Fork, JailExit, Platform};
use crate::types::{Identity, OverlaySpec};
use crate::util::{
    Removal, chown_dir, drop_privileges, lookup_home, mkdir, mkdir_unique,
    mount, remove_tree, unmount_detached,
};
use anyhow::{Context, Result, anyhow};
use log::trace;
use nix::errno::Errno;
use nix::mount::MsFlags;
use nix::sched::{CloneFlags, unshare};
use nix::sys::signal::{SigHandler, Signal, signal};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{
    ForkResult, Pid, Uid, chdir, chroot, execvpe, fork, getresgid, getresuid,
    setuid,
};
use std::convert::Infallible;
use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxPlatform;

impl LinuxPlatform {
    pub fn new() -> Self {
        LinuxPlatform
    }
}

/* Runs a mount helper to completion, we don't go through a shell so paths
 * with spaces are passed through untouched. */
fn run_helper(command: &mut Command) -> Result<()> {
    trace!(
        "Running {} {}",
        command.get_program().to_string_lossy(),
        command
            .get_args()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );
    let program = command.get_program().to_string_lossy().to_string();
    let status = command
        .status()
        .context(format!("Failed to run {}", program))?;
    if status.success() {
        Ok(())
    } else {
        match status.code() {
            Some(code) => Err(anyhow!("{} exited with status {}", program, code)),
            None => Err(anyhow!("{} was killed by a signal", program)),
        }
    }
}

impl Platform for LinuxPlatform {
    fn create_dir(&self, path: &Path) -> Result<()> {
        mkdir(path)
    }

    fn create_unique_dir(&self, prefix: &str) -> Result<PathBuf> {
        mkdir_unique(prefix)
    }

    fn chown(&self, path: &Path, identity: Identity) -> Result<()> {
        chown_dir(path, identity.uid, identity.gid)
    }

    fn remove_tree(&self, path: &Path) -> Result<Removal> {
        remove_tree(path)
    }

    fn mount_overlay(&self, spec: &OverlaySpec) -> Result<()> {
        mount(
            Some("overlay"),
            &spec.target,
            Some("overlay"),
            MsFlags::empty(),
            Some(spec.options().as_str()),
        )
    }

    fn mount_overlay_helper(
        &self,
        helper: &str,
        spec: &OverlaySpec,
    ) -> Result<()> {
        run_helper(
            Command::new(helper)
                .arg("-o")
                .arg(spec.options())
                .arg(&spec.target),
        )
    }

    fn mount_special(&self, fstype: &str, target: &Path) -> Result<()> {
        mount(Some("none"), target, Some(fstype), MsFlags::empty(), None)
    }

    fn unmount(&self, target: &Path) -> Result<()> {
        unmount_detached(target)
    }

    fn unmount_helper(&self, helper: &str, target: &Path) -> Result<()> {
        let mut command = Command::new(helper);
        // umount(8) spells lazy unmount differently from fusermount
        if Path::new(helper).file_name().and_then(|n| n.to_str())
            == Some("umount")
        {
            command.arg("-l");
        } else {
            command.args(["-u", "-z"]);
        }
        run_helper(command.arg(target))
    }

    fn elevate(&self) -> Result<()> {
        setuid(Uid::from_raw(0)).context("setuid(0) failed")
    }

    fn drop_privileges(&self, identity: Identity) -> Result<()> {
        drop_privileges(identity)
    }

    fn real_identity(&self) -> Result<Identity> {
        Ok(Identity::new(getresuid()?.real, getresgid()?.real))
    }

    fn effective_identity(&self) -> Result<Identity> {
        Ok(Identity::new(getresuid()?.effective, getresgid()?.effective))
    }

    fn home_dir(&self, uid: Uid) -> Result<PathBuf> {
        let home = lookup_home(uid)?;
        std::fs::canonicalize(&home)
            .context(format!("Home directory {} is missing", home.display()))
    }

    fn isolate_mount_namespace(&self) -> Result<()> {
        unshare(CloneFlags::CLONE_NEWNS)
            .context("unshare(CLONE_NEWNS) failed")?;

        /* Without this, a shared / (the systemd default) would propagate
         * the jail's mount events back into the host namespace. */
        mount(
            None,
            Path::new("/"),
            None,
            MsFlags::MS_REC | MsFlags::MS_PRIVATE,
            None,
        )
        .context("failed to make / private in the new mount namespace")
    }

    fn change_root(&self, root: &Path) -> Result<()> {
        chdir(root).context(format!("failed to chdir to {}", root.display()))?;
        chroot(".").context(format!("failed to chroot to {}", root.display()))
    }

    fn change_dir(&self, path: &Path) -> Result<()> {
        chdir(path).context(format!("failed to chdir to {}", path.display()))
    }

    fn current_dir(&self) -> Result<PathBuf> {
        std::env::current_dir().context("failed to get current directory")
    }

    fn exec(
        &self,
        argv: &[String],
        env: &[(&str, String)],
    ) -> Result<Infallible> {
        let Some(program) = argv.first() else {
            return Err(anyhow!("Command must not be empty"));
        };
        let program = CString::new(program.as_str())?;
        let args = argv
            .iter()
            .map(|s| CString::new(s.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        let environment = std::env::vars()
            .filter(|(key, _)| !env.iter().any(|(k, _)| k == key))
            .chain(env.iter().map(|(k, v)| (k.to_string(), v.clone())))
            .map(|(key, value)| {
                CString::new(format!("{}={}", key, value)).context(
                    "Failed to create CString for environment variable",
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let Err(e) = execvpe(&program, &args, &environment);
        Err(anyhow!("Failed to execute {}: {}", argv.join(" "), e))
    }

    fn fork(&self) -> Result<Fork> {
        match unsafe { fork() }.context("fork failed")? {
            ForkResult::Parent { child } => Ok(Fork::Parent(child)),
            ForkResult::Child => Ok(Fork::Child),
        }
    }

    fn ignore_interrupts(&self) -> Result<()> {
        for sig in [Signal::SIGINT, Signal::SIGQUIT] {
            unsafe { signal(sig, SigHandler::SigIgn) }
                .context(format!("failed to ignore {}", sig.as_str()))?;
        }
        Ok(())
    }

    fn wait_for(&self, child: Pid) -> Result<JailExit> {
        loop {
            match waitpid(child, None) {
                Ok(WaitStatus::Exited(_, code)) => {
                    return Ok(JailExit::Exited(code));
                }
                Ok(WaitStatus::Signaled(_, sig, _)) => {
                    return Ok(JailExit::Signaled(sig));
                }
                Ok(_) | Err(Errno::EINTR) => continue,
                Err(e) => {
                    return Err(e)
                        .context(format!("failed to wait for pid {}", child));
                }
            }
        }
    }
}
