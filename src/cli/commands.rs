use std::path::Path;

use crate::config::parse_config;
use crate::error::Result;
use crate::platform::ProcessGateway;
use crate::tunnel::Orchestrator;

/// Execute the 'up' command
pub async fn cmd_up(target: &str, config_dir: &Path) -> Result<()> {
    let config = parse_config(target, config_dir)?;

    tracing::info!("Bringing up {}", config.name);

    Orchestrator::new(ProcessGateway::new()).up(&config).await
}

/// Execute the 'down' command
pub async fn cmd_down(target: &str, config_dir: &Path) -> Result<()> {
    let config = parse_config(target, config_dir)?;

    tracing::info!("Bringing down {}", config.name);

    Orchestrator::new(ProcessGateway::new()).down(&config.name).await
}

/// Re-run this invocation through `su` unless already root.
///
/// Only returns when no escalation was needed; a failed exec is an error.
pub fn escalate() -> Result<()> {
    use std::os::unix::process::CommandExt;

    // SAFETY: getuid has no preconditions and cannot fail
    if unsafe { libc::getuid() } == 0 {
        return Ok(());
    }

    println!("[$] su -p -c wg-quick");

    let err = std::process::Command::new("su")
        .args(["-p", "-c"])
        .args(std::env::args_os())
        .exec();
    Err(err.into())
}
