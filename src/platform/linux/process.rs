use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout};

use crate::error::{CommandError, Result};
use crate::platform::command::Invocation;
use crate::platform::traits::{CommandGateway, LineSource};

/// Gateway that runs commands as child processes of this one
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessGateway;

impl ProcessGateway {
    pub fn new() -> Self {
        Self
    }
}

fn spawn_error(cmd: &Invocation, source: std::io::Error) -> CommandError {
    CommandError::Spawn {
        command: cmd.to_string(),
        source,
    }
}

fn check_status(cmd: &Invocation, status: std::process::ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    tracing::debug!("`{}' exited with {}", cmd, status);
    Err(CommandError::Failed {
        command: cmd.to_string(),
        code: status.code(),
    }
    .into())
}

#[async_trait]
impl CommandGateway for ProcessGateway {
    async fn run(&self, cmd: &Invocation) -> Result<()> {
        tracing::debug!("Running {}", cmd);

        let status = cmd
            .to_command()
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| spawn_error(cmd, e))?;

        check_status(cmd, status)
    }

    async fn run_with_input(&self, cmd: &Invocation, input: &[u8]) -> Result<()> {
        tracing::debug!("Running {} with {} bytes on stdin", cmd, input.len());

        let mut child = cmd
            .to_command()
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error(cmd, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input)
                .await
                .map_err(|e| spawn_error(cmd, e))?;
            // Dropping stdin closes the pipe so the reader sees EOF.
        }

        let status = child.wait().await.map_err(|e| spawn_error(cmd, e))?;
        check_status(cmd, status)
    }

    async fn spawn_lines(&self, cmd: &Invocation) -> Result<Box<dyn LineSource>> {
        tracing::debug!("Reading output of {}", cmd);

        let mut child = cmd
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(cmd, e))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            spawn_error(
                cmd,
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout not captured"),
            )
        })?;

        Ok(Box::new(ChildLines {
            command: cmd.to_string(),
            child: Some(child),
            lines: BufReader::new(stdout).lines(),
        }))
    }
}

/// Output lines of a running child; the child is reaped at end of output
struct ChildLines {
    command: String,
    child: Option<Child>,
    lines: Lines<BufReader<ChildStdout>>,
}

#[async_trait]
impl LineSource for ChildLines {
    async fn next_line(&mut self) -> Result<Option<String>> {
        match self.lines.next_line().await {
            Ok(Some(line)) => Ok(Some(line)),
            Ok(None) => {
                if let Some(mut child) = self.child.take() {
                    if let Err(e) = child.wait().await {
                        tracing::debug!("Unable to reap `{}': {}", self.command, e);
                    }
                }
                Ok(None)
            }
            Err(source) => Err(CommandError::Read {
                command: self.command.clone(),
                source,
            }
            .into()),
        }
    }
}
