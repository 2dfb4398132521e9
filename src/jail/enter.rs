use super::Jail;
use crate::platform::Platform;
use anyhow::{Context, Result};
use log::{trace, warn};
use std::convert::Infallible;
use std::fmt;

/// How far the jailed process has got on its way to exec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JailStage {
    Init,
    NamespaceIsolated,
    RootEntered,
    CwdRestored,
    PrivilegeDropped,
    Exec,
}

impl fmt::Display for JailStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JailStage::Init => "init",
            JailStage::NamespaceIsolated => "namespace isolated",
            JailStage::RootEntered => "root entered",
            JailStage::CwdRestored => "cwd restored",
            JailStage::PrivilegeDropped => "privilege dropped",
            JailStage::Exec => "exec",
        };
        write!(f, "{}", name)
    }
}

fn advance(
    stage: &mut JailStage,
    next: JailStage,
    result: Result<()>,
) -> Result<()> {
    result.context(format!("Jail setup failed going from {} to {}", stage, next))?;
    trace!("{} -> {}", stage, next);
    *stage = next;
    Ok(())
}

impl<P: Platform> Jail<'_, P> {
    /**
     * Runs in the jailed process: enters the jail and replaces ourselves with
     * `command`. Only ever returns with an error.
     *
     * Not being able to get back to the original working directory is only
     * a warning, the command then starts at the jail's root.
     */
    pub fn enter_and_exec(&self, command: &[String]) -> Result<Infallible> {
        let mut stage = JailStage::Init;
        let cwd = self.platform.current_dir();

        if self.capabilities.can_isolate_namespace {
            advance(
                &mut stage,
                JailStage::NamespaceIsolated,
                self.platform.isolate_mount_namespace(),
            )?;
        }

        if self.capabilities.can_chroot {
            advance(
                &mut stage,
                JailStage::RootEntered,
                self.platform.change_root(&self.root),
            )?;

            match cwd.and_then(|cwd| {
                self.platform.change_dir(&cwd).map(|_| cwd)
            }) {
                Ok(cwd) => trace!("Working directory is {}", cwd.display()),
                Err(e) => warn!(
                    "Unable to restore the working directory inside the jail, starting in /: {:#}",
                    e
                ),
            }
            advance(&mut stage, JailStage::CwdRestored, Ok(()))?;
        } else if let Err(e) = self.platform.change_dir(&self.root) {
            warn!("{:#}", e);
        }

        if self.capabilities.can_elevate {
            advance(
                &mut stage,
                JailStage::PrivilegeDropped,
                self.restore_origin_identity(),
            )?;
        }

        advance(&mut stage, JailStage::Exec, Ok(()))?;
        let env = [("COWJAIL_ROOT", self.scratch_root.display().to_string())];
        self.platform
            .exec(command, &env)
            .context(format!("Jailed command {} did not start", command.join(" ")))
    }
}
