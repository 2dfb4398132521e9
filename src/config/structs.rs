use super::impls::deserialize_level_filter;
use crate::types::BindTargets;
use serde::Deserialize;
use std::{collections::HashMap, path::PathBuf};

pub const DEFAULT_OVERLAY_HELPER: &str = "fuse-overlayfs";
pub const DEFAULT_UNMOUNT_HELPER: &str = "fusermount";

#[derive(Deserialize, Default, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    #[serde(deserialize_with = "deserialize_level_filter", default)]
    pub log_level: Option<log::LevelFilter>,
    pub target: Option<String>,
    #[serde(default)]
    pub bind: Option<Vec<String>>,
    pub no_home: Option<bool>,
    pub no_chroot: Option<bool>,
    pub overlay_helper: Option<String>,
    pub unmount_helper: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub log_level: log::LevelFilter,
    /// Scratch root. Only optional so `config` can run without one.
    pub target: Option<PathBuf>,
    pub binds: BindTargets,
    pub no_home: bool,
    pub no_chroot: bool,
    pub overlay_helper: String,
    pub unmount_helper: String,
    pub sources: HashMap<String, String>,
}
