//! CLI argument definitions for flowgate-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use flowgate_core::config::FlowgateConfig;

/// Flowgate XDP packet filter daemon.
///
/// Loads the XDP dispatcher with its ban filter and rate limiter stages,
/// attaches it to a network interface and logs discard events.
#[derive(Parser, Debug)]
#[command(name = "flowgate-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to flowgate.toml configuration file.
    #[arg(short, long, default_value = "/etc/flowgate/flowgate.toml")]
    pub config: PathBuf,

    /// Override the network interface the XDP program is attached to.
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Apply command-line overrides on top of the loaded configuration.
    ///
    /// The caller is expected to re-validate the result.
    pub fn apply_overrides(&self, config: &mut FlowgateConfig) {
        if let Some(interface) = &self.interface {
            config.filter.interface.clone_from(interface);
        }
        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.general.log_format.clone_from(format);
        }
    }
}
