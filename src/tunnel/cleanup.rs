use crate::network::NetworkId;

/// An interface that has been created but not yet fully brought up.
///
/// Armed right before the link is created and disarmed once the last step of
/// `up` succeeded. Until then the orchestrator owns the obligation to tear the
/// interface (and any policy network recorded here) back down.
#[must_use = "an armed cleanup must be disarmed or rolled back"]
#[derive(Debug)]
pub struct PendingCleanup {
    iface: Option<String>,
    network: Option<NetworkId>,
}

impl PendingCleanup {
    pub fn arm(iface: impl Into<String>) -> Self {
        Self {
            iface: Some(iface.into()),
            network: None,
        }
    }

    pub fn iface(&self) -> Option<&str> {
        self.iface.as_deref()
    }

    /// Remember a policy network created for the interface
    pub fn record_network(&mut self, netid: NetworkId) {
        self.network = Some(netid);
    }

    pub fn network(&self) -> Option<NetworkId> {
        self.network
    }

    pub fn is_armed(&self) -> bool {
        self.iface.is_some()
    }

    /// The interface is fully up; nothing to undo
    pub fn disarm(mut self) {
        self.iface = None;
    }

    /// Hand over what must be torn down, leaving the guard disarmed
    pub fn take(mut self) -> Option<(String, Option<NetworkId>)> {
        let iface = self.iface.take()?;
        Some((iface, self.network))
    }
}

impl Drop for PendingCleanup {
    fn drop(&mut self) {
        if let Some(iface) = &self.iface {
            tracing::error!(
                "{} was abandoned half-configured; remove it with `ip link del {}`",
                iface,
                iface
            );
        }
    }
}
