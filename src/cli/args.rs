use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_DIR;

const CONFIG_HELP: &str = "\
CONFIG_FILE is a configuration file, whose filename is the interface name
followed by `.conf'. Otherwise, INTERFACE is an interface name, with
configuration found at <CONFIG_DIR>/INTERFACE.conf. It is to be readable
by wg(8)'s `setconf' sub-command, with the exception of the following additions
to the [Interface] section, which are handled by wg-quick:

  - Address: may be specified one or more times and contains one or more
    IP addresses (with an optional CIDR mask) to be set for the interface.
  - MTU: an optional MTU for the interface; if unspecified, auto-calculated.
  - DNS: an optional DNS server to use while the device is up.

See wg-quick(8) for more info and examples.";

#[derive(Parser, Debug)]
#[command(
    name = "wg-quick",
    about = "Set up a WireGuard interface simply",
    version,
    after_help = CONFIG_HELP
)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory holding INTERFACE.conf files
    #[arg(long, global = true, env = "WG_QUICK_CONFIG_DIR", default_value = DEFAULT_CONFIG_DIR)]
    pub config_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bring up a WireGuard interface
    Up {
        /// Config file path or interface name
        #[arg(value_name = "CONFIG_FILE | INTERFACE")]
        target: String,
    },

    /// Bring down a WireGuard interface
    Down {
        /// Config file path or interface name
        #[arg(value_name = "CONFIG_FILE | INTERFACE")]
        target: String,
    },
}

impl Cli {
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
