use async_trait::async_trait;

use crate::error::Result;

use super::command::Invocation;

/// Runs external privileged commands on behalf of the lifecycle code
#[async_trait]
pub trait CommandGateway: Send + Sync {
    /// Run a command to completion; a nonzero exit status is an error
    async fn run(&self, cmd: &Invocation) -> Result<()>;

    /// Run a command to completion with `input` written to its stdin
    async fn run_with_input(&self, cmd: &Invocation, input: &[u8]) -> Result<()>;

    /// Start a command and hand back its stdout as a line source
    ///
    /// The exit status of the command is not checked.
    async fn spawn_lines(&self, cmd: &Invocation) -> Result<Box<dyn LineSource>>;
}

/// Lazily yields the output lines of one running command
#[async_trait]
pub trait LineSource: Send {
    /// Next line without its terminator, or None once the output is exhausted
    async fn next_line(&mut self) -> Result<Option<String>>;
}
