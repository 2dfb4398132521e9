use anyhow::{Context, Result, anyhow};
use nix::mount::{MntFlags, MsFlags};
use std::path::Path;

/* Characters the kernel (and fuse-overlayfs) treat as separators or escapes
 * when parsing lowerdir=/upperdir=/workdir= options. */
const OVERLAY_OPTION_SPECIALS: [char; 3] = [',', ':', '\\'];

pub fn mount(
    source: Option<&str>,
    target: &Path,
    fstype: Option<&str>,
    flags: MsFlags,
    data: Option<&str>,
) -> Result<()> {
    let result = nix::mount::mount(source, target, fstype, flags, data);

    if let Err(e) = result {
        let err_context = format!(
            "failed to mount {} {} [type={}, flags={}, data={}]",
            source.unwrap_or(""),
            target.display(),
            fstype.unwrap_or(""),
            flags.bits(),
            data.unwrap_or(""),
        );

        // lowerdir=/ on a host whose root is already an overlay (containers,
        // nested jails) trips the kernel's stacking limit
        if e == nix::errno::Errno::EINVAL
            && fstype == Some("overlay")
            && data.map(|d| d.starts_with("lowerdir=/")).unwrap_or(false)
        {
            return Err(anyhow!(
                "Maximum overlayfs stacking depth exceeded. \
                The lower directory is probably already on an overlay filesystem."
            ))
            .context(err_context);
        }

        return Err(e).context(err_context);
    }

    Ok(())
}

pub fn unmount_detached(target: &Path) -> Result<()> {
    nix::mount::umount2(target, MntFlags::MNT_DETACH)
        .context(format!("failed to unmount {}", target.display()))
}

/**
 * Checks that a path can be embedded in overlay mount options as-is.
 *
 * Overlayfs splits on ',' and ':' and honours '\' escapes; rather than try to
 * escape these we refuse such paths up front.
 */
pub fn check_path_for_mount_option_compatibility(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(anyhow!("Path is empty"));
    }

    let path_str = path.to_str().ok_or_else(|| {
        anyhow!("Path {} is not valid UTF-8", path.display())
    })?;

    if let Some(c) = path_str
        .chars()
        .find(|c| OVERLAY_OPTION_SPECIALS.contains(c) || c.is_control())
    {
        return Err(anyhow!(
            "Path {} contains '{}', which cannot be used in overlay mount options",
            path_str.escape_default(),
            c.escape_default()
        ));
    }

    Ok(())
}
