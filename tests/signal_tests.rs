//! Signal delivery during bring-up
//!
//! Kept in its own test binary: the signal reaches every listener in the
//! process, so it must not race other lifecycle tests.

mod common;

use async_trait::async_trait;
use tokio::signal::unix::{signal, SignalKind};

use common::{config, FakeHost};
use wgquick::error::{Result, WgError};
use wgquick::platform::{CommandGateway, Invocation, LineSource};
use wgquick::tunnel::Orchestrator;

/// Raises `signo` once a command starting with `prefix` is issued, then never
/// lets that command finish
struct SignalOn {
    host: FakeHost,
    prefix: &'static str,
    signo: libc::c_int,
}

impl SignalOn {
    async fn check(&self, cmd: &Invocation) {
        if cmd.to_string().starts_with(self.prefix) {
            // SAFETY: raise only delivers a signal to this process.
            unsafe {
                libc::raise(self.signo);
            }
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl CommandGateway for SignalOn {
    async fn run(&self, cmd: &Invocation) -> Result<()> {
        self.check(cmd).await;
        self.host.run(cmd).await
    }

    async fn run_with_input(&self, cmd: &Invocation, input: &[u8]) -> Result<()> {
        self.check(cmd).await;
        self.host.run_with_input(cmd, input).await
    }

    async fn spawn_lines(&self, cmd: &Invocation) -> Result<Box<dyn LineSource>> {
        self.check(cmd).await;
        self.host.spawn_lines(cmd).await
    }
}

#[tokio::test]
async fn test_sigterm_during_up_rolls_back() {
    // Install the handler up front so the raised signal can never take the
    // default action and kill the test process.
    let _term = signal(SignalKind::terminate()).unwrap();

    let orchestrator = Orchestrator::new(SignalOn {
        host: FakeHost::new().with_allowed_ips("10.0.0.0/24"),
        prefix: "ndc network users add",
        signo: libc::SIGTERM,
    });

    let err = orchestrator.up(&config("wg0")).await.unwrap_err();
    assert!(matches!(
        err,
        WgError::Interrupted {
            name: "SIGTERM",
            ..
        }
    ));
    assert_eq!(err.exit_code(), 128 + libc::SIGTERM);

    let host = &orchestrator.gateway().host;
    assert!(host.links().is_empty());
    assert!(host.networks().is_empty());
    assert_eq!(host.position("ndc network route add"), None);
}
