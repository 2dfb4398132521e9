use super::Jail;
use crate::platform::{Fork, JailExit, Platform};
use anyhow::Result;
use log::{error, info, trace, warn};

/// Which process we are once supervision returns.
pub enum Supervised {
    /// The jailed command is done and everything has been cleaned up.
    /// `None` if we lost track of it.
    Supervisor(Option<JailExit>),
    /// We're the jailed process and the command could not be started.
    Jailed(anyhow::Error),
}

impl<P: Platform> Jail<'_, P> {
    /**
     * Forks. The parent ignores keyboard interrupts so they only reach the
     * jailed command, waits for it, and cleans up. The child gives up its
     * claim on the tracked resources and enters the jail.
     */
    pub fn supervise(&mut self, command: &[String]) -> Result<Supervised> {
        match self.platform.fork()? {
            Fork::Parent(child) => {
                trace!("Supervising jailed process {}", child);
                if let Err(e) = self.platform.ignore_interrupts() {
                    warn!("{:#}", e);
                }

                let exit = match self.platform.wait_for(child) {
                    Ok(exit) => {
                        match exit {
                            JailExit::Exited(0) => trace!("Jailed command {}", exit),
                            _ => info!("Jailed command {}", exit),
                        }
                        Some(exit)
                    }
                    Err(e) => {
                        error!("{:#}", e);
                        None
                    }
                };

                self.cleanup();
                Ok(Supervised::Supervisor(exit))
            }
            Fork::Child => {
                self.tracker.disown();
                let Err(e) = self.enter_and_exec(command);
                Ok(Supervised::Jailed(e))
            }
        }
    }
}
