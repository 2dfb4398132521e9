use nix::unistd::{Gid, Uid};
use std::fmt;

/// A uid/gid pair. Used both for the identity captured at startup and for
/// checking what we are currently running as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub uid: Uid,
    pub gid: Gid,
}

impl Identity {
    pub fn new(uid: Uid, gid: Gid) -> Self {
        Identity { uid, gid }
    }

    #[cfg(test)]
    pub fn root() -> Self {
        Identity {
            uid: Uid::from_raw(0),
            gid: Gid::from_raw(0),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.uid, self.gid)
    }
}
