use anyhow::{Context, Result, anyhow};
use nix::{
    errno::Errno,
    sys::stat::Mode,
    unistd::{Gid, Uid, chown},
};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/* Creates a single directory with mode 0700. Unlike create_dir_all this fails
 * if the directory is already there, we only ever want to track (and later
 * remove) directories that we created ourselves. */
pub fn mkdir(path: &Path) -> Result<()> {
    match nix::unistd::mkdir(path, Mode::S_IRWXU) {
        Ok(()) => Ok(()),
        Err(Errno::EEXIST) => {
            Err(anyhow!("Directory {} already exists", path.display()))
        }
        Err(e) => Err(e)
            .context(format!("Failed to create directory {}", path.display())),
    }
}

/* Like mkdir, but appends a random suffix to `prefix` and returns the path
 * that was created. */
pub fn mkdir_unique(prefix: &str) -> Result<PathBuf> {
    let suffix = Uuid::new_v4().simple().to_string();
    let path = PathBuf::from(format!("{}{}", prefix, &suffix[..12]));
    mkdir(&path)?;
    Ok(path)
}

pub fn chown_dir(path: &Path, uid: Uid, gid: Gid) -> Result<()> {
    chown(path, Some(uid), Some(gid)).context(format!(
        "Failed to chown directory {} to {}/{}",
        path.display(),
        uid,
        gid
    ))
}
