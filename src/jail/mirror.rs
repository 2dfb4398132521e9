use super::Jail;
use crate::platform::Platform;
use anyhow::{Context, Result};
use data_encoding::BASE32_NOPAD;
use sha2::{Digest, Sha256};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/* Longest plain name that still fits NAME_MAX once "_upper_<12 hex>" is
 * appended. */
const MAX_PLAIN_NAME: usize = 200;
const LONG_NAME_PREFIX: usize = 64;

/// Flat name for the layers backing the mirror of `path`. Base32 keeps it
/// reversible, so two different paths never share layers. Paths too long
/// for that are named by a readable prefix plus the base32 of their sha256,
/// the `_` keeps the two forms from ever colliding.
pub fn mount_name(path: &Path) -> String {
    let bytes = path.as_os_str().as_bytes();
    let plain = BASE32_NOPAD.encode(bytes);
    if plain.len() <= MAX_PLAIN_NAME {
        return plain;
    }
    format!(
        "{}_{}",
        &plain[..LONG_NAME_PREFIX],
        BASE32_NOPAD.encode(&Sha256::digest(bytes))
    )
}

/// Where `path` shows up under the jail root.
pub fn mirrored_path(root: &Path, path: &Path) -> PathBuf {
    root.join(path.strip_prefix("/").unwrap_or(path))
}

impl<P: Platform> Jail<'_, P> {
    /// Makes a copy-on-write view of host `path` visible at the same
    /// location inside the jail.
    pub fn mirror(&mut self, path: &Path) -> Result<()> {
        let target = mirrored_path(&self.root, path);
        self.build_overlay(&target, &mount_name(path), path)
            .context(format!("Failed to mirror {} into the jail", path.display()))
    }
}
