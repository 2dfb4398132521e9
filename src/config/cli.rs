use clap::Parser;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Parser, Clone, Debug)]
#[command(version, about = "Run a command in a throwaway copy-on-write view of the host filesystem",
    long_about = None,
    override_usage = "\n    cowjail -t <TARGET> [OPTIONS] [-- COMMAND [ARGS...]]\n    cowjail [OPTIONS] config [KEYS...]")]
pub struct Args {
    /// Set the log level to one of trace, debug, info, warn, or error.
    /// `-v` is shorthand for enabling verbose (trace) logging.
    #[arg(short = 'v',
        long,
        global = true,
        default_missing_value = "trace",
        num_args = 0..=1,
        require_equals = true,
        value_parser = parse_log_level
    )]
    pub log_level: Option<log::LevelFilter>,

    /// Directory to store the jail root and its overlays in. It must already
    /// exist and be readable and writable by you. Everything created in it is
    /// removed when the command exits.
    #[arg(short = 't', long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub target: Option<String>,

    /// Make a host path visible (copy-on-write) inside the jail at the same
    /// location. Can be given multiple times or as a comma-separated list.
    #[arg(
        short = 'b',
        long,
        global = true,
        value_delimiter = ',',
        action = clap::ArgAction::Append,
        value_hint = clap::ValueHint::AnyPath
    )]
    pub bind: Option<Vec<String>>,

    /// Do not mirror your home directory into the jail.
    #[arg(short = 'u', long, global = true, action = clap::ArgAction::SetTrue)]
    pub no_home: bool,

    /// Do not enter a new mount namespace or chroot into the jail, just run
    /// the command from the jail root directory.
    #[arg(short = 'c', long, global = true, action = clap::ArgAction::SetTrue)]
    pub no_chroot: bool,

    /// Do not load config files.
    #[arg(long, global = true, action = clap::ArgAction::SetTrue)]
    pub no_config: bool,

    #[command(subcommand)]
    pub action: Option<Action>,

    /// The command to run in the jail. Defaults to your shell.
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 0..,
        value_parser = validate_command,
        help_heading = "Jailed Command",
    )]
    pub command: Option<Vec<String>>,
}

#[derive(clap::Subcommand, Clone, Debug)]
#[command(subcommand_help_heading = "Actions")]
pub enum Action {
    /// Print the resolved configuration
    Config {
        /// The keys to print, all of them if none are given
        #[arg(value_name = "KEYS", num_args = 0..)]
        keys: Option<Vec<String>>,
    },
}

static ARG_COUNT: AtomicUsize = AtomicUsize::new(0);

// An unknown option ends up here as the first word of the command, so reject
// anything that looks like a flag in that position.
fn validate_command(s: &str) -> Result<String, String> {
    ARG_COUNT.fetch_add(1, Ordering::Relaxed);
    if ARG_COUNT.load(Ordering::Relaxed) == 1
        && s.starts_with('-')
        && s != "--"
    {
        Err(String::from("Unknown option"))
    } else {
        Ok(s.to_string())
    }
}

fn parse_log_level(s: &str) -> Result<log::LevelFilter, String> {
    s.parse::<log::LevelFilter>().map_err(|e| e.to_string())
}
