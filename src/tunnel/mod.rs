pub mod cleanup;
pub mod lifecycle;

pub use cleanup::PendingCleanup;
pub use lifecycle::{LinkState, Orchestrator, Teardown, TUNNEL_FWMARK};
