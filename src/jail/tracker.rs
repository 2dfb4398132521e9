use crate::util::Removal;
use anyhow::{Result, anyhow};
use log::{debug, error, trace};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedKind {
    Directory,
    Mount,
}

impl fmt::Display for TrackedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackedKind::Directory => write!(f, "directory"),
            TrackedKind::Mount => write!(f, "mount"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntry {
    pub path: PathBuf,
    pub kind: TrackedKind,
}

/**
 * Everything a run has created, in creation order.
 *
 * Registering never creates anything, and entries are only ever consumed by
 * teardown, newest first. Teardown is best-effort: a failure is logged and
 * counted, and the entry is dropped from the list either way, so tearing down
 * twice never repeats work.
 */
#[derive(Debug, Default)]
pub struct ResourceTracker {
    entries: Vec<TrackedEntry>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        ResourceTracker::default()
    }

    pub fn register_directory<P: Into<PathBuf>>(&mut self, path: P) -> Result<()> {
        self.register(path.into(), TrackedKind::Directory)
    }

    pub fn register_mount<P: Into<PathBuf>>(&mut self, path: P) -> Result<()> {
        self.register(path.into(), TrackedKind::Mount)
    }

    fn register(&mut self, path: PathBuf, kind: TrackedKind) -> Result<()> {
        if self.contains(kind, &path) {
            return Err(anyhow!(
                "{} {} is already tracked",
                kind,
                path.display()
            ));
        }
        trace!("Tracking {} {}", kind, path.display());
        self.entries.push(TrackedEntry { path, kind });
        Ok(())
    }

    pub fn contains(&self, kind: TrackedKind, path: &Path) -> bool {
        self.entries.iter().any(|e| e.kind == kind && e.path == path)
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[TrackedEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything without releasing it. Used by the jailed process,
    /// whose copy of the tracker belongs to the supervisor.
    pub fn disown(&mut self) {
        trace!("Disowning {} tracked entries", self.entries.len());
        self.entries.clear();
    }

    /* Removes all entries of `kind` from the list, newest first. */
    fn take(&mut self, kind: TrackedKind) -> Vec<PathBuf> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.kind == kind);
        self.entries = kept;
        taken.into_iter().rev().map(|e| e.path).collect()
    }

    /// Unmounts every tracked mount, newest first. Returns the number of
    /// mounts that could not be unmounted.
    pub fn teardown_mounts<F>(&mut self, mut unmount: F) -> usize
    where
        F: FnMut(&Path) -> Result<()>,
    {
        let mut failures = 0;
        for path in self.take(TrackedKind::Mount) {
            debug!("Unmounting {}", path.display());
            if let Err(e) = unmount(&path) {
                error!("Failed to unmount {}: {:#}", path.display(), e);
                failures += 1;
            }
        }
        failures
    }

    /// Removes every tracked directory, newest first. Returns the number of
    /// directories that could not be removed.
    pub fn teardown_directories<F>(&mut self, mut remove: F) -> usize
    where
        F: FnMut(&Path) -> Result<Removal>,
    {
        let mut failures = 0;
        for path in self.take(TrackedKind::Directory) {
            match remove(&path) {
                Ok(Removal::Removed) => trace!("Removed {}", path.display()),
                Ok(Removal::Missing) => {
                    debug!("{} was never created, skipping", path.display())
                }
                Err(e) => {
                    error!("Failed to remove {}: {:#}", path.display(), e);
                    failures += 1;
                }
            }
        }
        failures
    }
}
