use crate::config::Config;
use crate::outln;
use anyhow::{Result, anyhow};
use log::debug;

const KEYS: [&str; 7] = [
    "target",
    "bind",
    "no_home",
    "no_chroot",
    "log_level",
    "overlay_helper",
    "unmount_helper",
];

/// `key=value` pairs for `keys`, in the order asked for.
pub fn config_values(
    config: &Config,
    keys: &[String],
) -> Result<Vec<(&'static str, String)>> {
    keys.iter()
        .map(|key| {
            let key = key.replace('-', "_");
            let (key, value) = match key.as_str() {
                "target" => (
                    "target",
                    config
                        .target
                        .as_ref()
                        .map(|t| t.display().to_string())
                        .unwrap_or_default(),
                ),
                "bind" => ("bind", config.binds.to_string()),
                "no_home" => ("no_home", config.no_home.to_string()),
                "no_chroot" => ("no_chroot", config.no_chroot.to_string()),
                "log_level" => {
                    ("log_level", config.log_level.as_str().to_lowercase())
                }
                "overlay_helper" => {
                    ("overlay_helper", config.overlay_helper.clone())
                }
                "unmount_helper" => {
                    ("unmount_helper", config.unmount_helper.clone())
                }
                _ => return Err(anyhow!("Unknown key: {}", key)),
            };
            Ok((key, value))
        })
        .collect()
}

pub fn config(config: &Config, keys: Option<Vec<String>>) -> Result<()> {
    let keys = keys
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| KEYS.map(String::from).to_vec());
    let multi_line = keys.len() > 1;

    for (key, value) in config_values(config, &keys)? {
        if let Some(source) = config.sources.get(key) {
            debug!("{}={} set from {}", key, value, source);
        }
        if multi_line {
            outln!("{}={}", key, value);
        } else {
            outln!("{}", value);
        }
    }

    Ok(())
}
