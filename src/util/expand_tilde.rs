use crate::types::Identity;
use crate::util::lookup_home;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Expands a leading `~` to the home directory of `identity`
pub fn expand_tilde_path(path: &Path, identity: Identity) -> Result<PathBuf> {
    let Some(path_str) = path.to_str() else {
        return Ok(path.to_path_buf());
    };
    if path_str == "~" {
        return lookup_home(identity.uid);
    }
    if let Some(rest) = path_str.strip_prefix("~/") {
        return Ok(lookup_home(identity.uid)?.join(rest));
    }
    Ok(path.to_path_buf())
}
