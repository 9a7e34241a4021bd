//! Command gateway and the per-tool adapters built on top of it
//!
//! Everything wg-quick does to the system goes through [`CommandGateway`].
//! The `ip`, `wg` and `ndc` modules wrap one external tool each and own all
//! scraping of that tool's human-readable output.

pub mod command;
pub mod ip;
pub mod ndc;
pub mod traits;
pub mod wg;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub mod linux;

pub use command::Invocation;
pub use ndc::ControlService;
pub use traits::{CommandGateway, LineSource};

#[cfg(any(target_os = "linux", target_os = "android"))]
pub use linux::ProcessGateway;

use crate::error::Result;

/// Echo a mutating command the way wg-quick always has
pub fn announce(cmd: &Invocation) {
    println!("[#] {}", cmd);
}

/// Run a command after echoing it
pub async fn run_announced(gateway: &dyn CommandGateway, cmd: Invocation) -> Result<()> {
    announce(&cmd);
    gateway.run(&cmd).await
}

/// Restartable reader over command output
///
/// Each [`start`](Self::start) drops whatever command was running before and
/// yields the first line of the new one; [`next_line`](Self::next_line)
/// continues until the output is exhausted.
pub struct CommandOutput<'a> {
    gateway: &'a dyn CommandGateway,
    source: Option<Box<dyn LineSource>>,
}

impl<'a> CommandOutput<'a> {
    pub fn new(gateway: &'a dyn CommandGateway) -> Self {
        Self {
            gateway,
            source: None,
        }
    }

    pub async fn start(&mut self, cmd: &Invocation) -> Result<Option<String>> {
        self.source = None;
        self.source = Some(self.gateway.spawn_lines(cmd).await?);
        self.next_line().await
    }

    pub async fn next_line(&mut self) -> Result<Option<String>> {
        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };

        let line = source.next_line().await?;
        if line.is_none() {
            self.source = None;
        }
        Ok(line)
    }
}
