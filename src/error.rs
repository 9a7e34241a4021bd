use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Exit status for an interface that is already present on `up`.
pub const EXIT_ALREADY_EXISTS: i32 = 92;
/// Exit status for `down` on a name `wg` does not know.
pub const EXIT_NOT_WIREGUARD: i32 = 43;
/// Exit status for an `ndc` command that did not answer `200 0`.
pub const EXIT_CONTROL_SERVICE: i32 = 29;
/// Exit status for a config file not named `<interface>.conf`.
pub const EXIT_INVALID_NAME: i32 = 77;
/// Exit status for usage errors.
pub const EXIT_USAGE: i32 = 1;

#[derive(Error, Debug)]
pub enum WgError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    ControlService(#[from] ControlServiceError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Interrupted by {name}")]
    Interrupted { name: &'static str, signal: i32 },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to open configuration file `{}': {source}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("The config file must be a valid interface name, followed by .conf")]
    InvalidName(PathBuf),

    #[error("Unable to read configuration file `{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("{0} is not a WireGuard interface")]
    NotAWireguardInterface(String),
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Unable to run `{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}' exited with {}", describe_status(.code))]
    Failed { command: String, code: Option<i32> },

    #[error("Unable to read output of `{command}': {source}")]
    Read {
        command: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ControlServiceError {
    #[error("{response}")]
    Rejected { command: String, response: String },

    #[error("`{command}' gave no response")]
    NoResponse { command: String },
}

fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

fn errno_of(err: &io::Error) -> i32 {
    err.raw_os_error().filter(|code| *code != 0).unwrap_or(1)
}

impl WgError {
    /// Process exit status that identifies this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            WgError::Config(ConfigError::NotFound { source, .. })
            | WgError::Config(ConfigError::Read { source, .. }) => errno_of(source),
            WgError::Config(ConfigError::InvalidName(_)) => EXIT_INVALID_NAME,
            WgError::Device(DeviceError::AlreadyExists(_)) => EXIT_ALREADY_EXISTS,
            WgError::Device(DeviceError::NotAWireguardInterface(_)) => EXIT_NOT_WIREGUARD,
            WgError::Command(CommandError::Spawn { source, .. })
            | WgError::Command(CommandError::Read { source, .. }) => errno_of(source),
            WgError::Command(CommandError::Failed { code, .. }) => match code {
                Some(code) if *code != 0 => *code,
                _ => 1,
            },
            WgError::ControlService(_) => EXIT_CONTROL_SERVICE,
            WgError::Io(e) => errno_of(e),
            WgError::Interrupted { signal, .. } => 128 + signal,
        }
    }
}

pub type Result<T> = std::result::Result<T, WgError>;
