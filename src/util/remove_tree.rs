use anyhow::{Context, Result, anyhow};
use nix::{errno::Errno, sys::stat::SFlag};
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    Missing,
}

/**
 * Removes a directory we created along with anything written into it (the
 * upper layers collect whatever the jailed command wrote).
 *
 * Never crosses onto another filesystem: if `path` itself is still a mount
 * point, or anything below it is, we stop and report instead of deleting
 * through the mount.
 *
 * The upper layers belong to the invoking user while we may still be root,
 * so the deletion itself goes through `remove_dir_all`, which works relative
 * to open directory handles and never follows a symlink swapped in under it.
 */
pub fn remove_tree(path: &Path) -> Result<Removal> {
    let metadata = match nix::sys::stat::lstat(path) {
        Ok(metadata) => metadata,
        Err(Errno::ENOENT) => return Ok(Removal::Missing),
        Err(e) => {
            return Err(e).context(format!("Failed to stat {}", path.display()));
        }
    };

    if metadata.st_mode & SFlag::S_IFMT.bits() != SFlag::S_IFDIR.bits() {
        return Err(anyhow!("{} is not a directory", path.display()));
    }

    if let Some(parent) = path.parent() {
        let parent_metadata = nix::sys::stat::lstat(parent)
            .context(format!("Failed to stat {}", parent.display()))?;
        if parent_metadata.st_dev != metadata.st_dev {
            return Err(anyhow!(
                "{} is still a mount point, leaving it in place",
                path.display()
            ));
        }
    }

    // Only looks, never deletes
    for entry in WalkDir::new(path).min_depth(1) {
        let entry = entry.context(format!("Failed to walk {}", path.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let dev = entry
            .metadata()
            .context(format!("Failed to stat {}", entry.path().display()))?
            .dev();
        if dev != metadata.st_dev {
            return Err(anyhow!(
                "{} is still mounted, leaving {} in place",
                entry.path().display(),
                path.display()
            ));
        }
    }

    std::fs::remove_dir_all(path)
        .context(format!("Failed to remove directory {}", path.display()))?;

    Ok(Removal::Removed)
}
