use anyhow::Result;
use log::warn;
use rand::Rng;
use rstest::*;
use std::path::{Path, PathBuf};
use std::process::Command;

const ENV_VARS: [&str; 7] = [
    "COWJAIL_LOG_LEVEL",
    "COWJAIL_TARGET",
    "COWJAIL_BIND",
    "COWJAIL_NO_HOME",
    "COWJAIL_NO_CHROOT",
    "COWJAIL_OVERLAY_HELPER",
    "COWJAIL_UNMOUNT_HELPER",
];

pub fn rid() -> String {
    let mut rng = rand::rng();
    (0..10)
        .map(|_| rng.sample(rand::distr::Alphanumeric) as char)
        .collect()
}

pub fn get_jail_bin() -> PathBuf {
    let project_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let path = project_root.join("target/debug/cowjail");
    path.canonicalize().unwrap_or(path)
}

/**
 * Runs the cowjail binary as whoever runs the tests (no sudo) with a scratch
 * area of its own under the temp dir, and an environment scrubbed of any
 * COWJAIL_* settings the developer may have.
 */
pub struct JailManager {
    pub base: PathBuf,
    pub last_stdout: String,
    pub last_stderr: String,
    pub jail_bin: PathBuf,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    /* When debug mode is on, the scratch area is left behind for inspection */
    pub debug_mode: bool,
}

impl JailManager {
    pub fn new() -> Self {
        let base = std::env::temp_dir().join(format!("cowjail-test-{}", rid()));

        #[allow(clippy::panic)]
        if let Err(e) = std::fs::create_dir_all(&base) {
            panic!("Failed to create {}: {}", base.display(), e);
        }

        Self {
            base,
            last_stdout: String::new(),
            last_stderr: String::new(),
            jail_bin: get_jail_bin(),
            cwd: None,
            env: Vec::new(),
            debug_mode: false,
        }
    }

    /// A fresh, empty directory inside the scratch area.
    pub fn mkdir(&self, name: &str) -> PathBuf {
        let path = self.base.join(name);
        std::fs::create_dir_all(&path).unwrap();
        path
    }

    #[allow(dead_code)]
    pub fn set_env(&mut self, key: &str, value: &str) {
        self.env.push((key.to_string(), value.to_string()));
    }

    pub fn run(&mut self, args: &[&str]) -> Result<std::process::Output> {
        let mut cmd = Command::new(&self.jail_bin);
        for var in ENV_VARS {
            cmd.env_remove(var);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.args(args);
        println!(
            "Running command: {} {}",
            cmd.get_program().to_string_lossy(),
            args.join(" ")
        );

        let output = cmd.output()?;
        self.last_stdout = String::from_utf8_lossy(&output.stdout).to_string();
        self.last_stderr = String::from_utf8_lossy(&output.stderr).to_string();
        Ok(output)
    }

    pub fn pass(&mut self, args: &[&str]) -> bool {
        match self.run(args) {
            Ok(output) if output.status.success() => true,
            _ => {
                println!("last_stderr: {}", self.last_stderr);
                println!("last_stdout: {}", self.last_stdout);
                false
            }
        }
    }

    pub fn xfail(&mut self, args: &[&str]) -> bool {
        match self.run(args) {
            Ok(output) => !output.status.success(),
            Err(_) => true,
        }
    }

    pub fn is_empty(path: &Path) -> bool {
        std::fs::read_dir(path)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false)
    }
}

impl Drop for JailManager {
    fn drop(&mut self) {
        if self.debug_mode {
            warn!("Debug mode is on, *NOT* cleaning up {}", self.base.display());
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.base) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", self.base.display(), e);
            }
        }
    }
}

#[fixture]
pub fn jail() -> JailManager {
    JailManager::new()
}
