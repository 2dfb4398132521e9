use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};

/**
 * Host paths to mirror into the jail, in the order they were asked for.
 *
 * Each path gets its own overlay mounted at the same location under the jail
 * root, so a path may only appear once.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindTargets {
    paths: Vec<PathBuf>,
}

impl BindTargets {
    pub fn new() -> Self {
        BindTargets { paths: Vec::new() }
    }

    pub fn push<P: Into<PathBuf>>(&mut self, path: P) -> Result<()> {
        let path = path.into();
        if path == Path::new("/") {
            return Err(anyhow!(
                "bind mount / is always provided, it is the jail root"
            ));
        }
        if self.contains(&path) {
            return Err(anyhow!(
                "bind mount {} already provided",
                path.display()
            ));
        }
        self.paths.push(path);
        Ok(())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl std::fmt::Display for BindTargets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "{}", joined)
    }
}
