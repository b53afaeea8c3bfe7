//! Command-line interface for rotel_launch

use crate::runtime::LauncherConfig;
use argh::FromArgs;

/// Launch Rotel configured from a Fluent Bit configuration file
#[derive(FromArgs, Debug)]
pub struct LaunchArgs {
    /// path to Fluent Bit configuration file
    #[argh(option)]
    pub fluent_bit_config: String,

    /// path to rotel executable
    #[argh(option)]
    pub rotel_path: String,

    /// show launch plan without downloading or executing
    #[argh(switch)]
    pub dry_run: bool,

    /// log level (error, warn, info, debug, trace)
    #[argh(option, short = 'l', default = "String::from(\"info\")")]
    pub log_level: String,
}

impl LaunchArgs {
    /// Launcher configuration for these arguments
    pub fn launcher_config(&self) -> LauncherConfig {
        LauncherConfig::new(&self.fluent_bit_config, &self.rotel_path)
    }

    /// Log filter for env_logger, `info` for unknown levels
    pub fn log_filter(&self) -> &'static str {
        match self.log_level.to_lowercase().as_str() {
            "error" => "error",
            "warn" => "warn",
            "info" => "info",
            "debug" => "debug",
            "trace" => "trace",
            _ => "info",
        }
    }
}
