use futures::FutureExt;
use std::panic::AssertUnwindSafe;

use crate::config::parser::leading_number;
use crate::config::InterfaceConfig;
use crate::error::{DeviceError, Result, WgError};
use crate::network::{estimate_mtu, NetworkId};
use crate::platform::ip::Ip;
use crate::platform::wg::Wg;
use crate::platform::{CommandGateway, ControlService};

use super::cleanup::PendingCleanup;

/// Firewall mark put on the tunnel's own UDP packets so netd routes them outside it
pub const TUNNEL_FWMARK: u32 = 0x20000;

/// Where an interface is in the `up` sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Absent,
    Created,
    Configured,
    Active,
}

impl LinkState {
    /// The only state `up` may move to from here
    pub fn advance(self) -> Self {
        match self {
            LinkState::Absent => LinkState::Created,
            LinkState::Created => LinkState::Configured,
            LinkState::Configured | LinkState::Active => LinkState::Active,
        }
    }
}

/// How teardown reacts to a failing step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    /// Stop at the first failure (`down`)
    Strict,
    /// Log failures and keep going (rolling back a failed `up`)
    BestEffort,
}

impl Teardown {
    fn absorb(self, err: WgError) -> Result<()> {
        match self {
            Teardown::Strict => Err(err),
            Teardown::BestEffort => {
                tracing::warn!("Ignoring failure during cleanup: {}", err);
                Ok(())
            }
        }
    }
}

/// Drives an interface through bring-up and teardown
pub struct Orchestrator<G> {
    gateway: G,
}

impl<G: CommandGateway> Orchestrator<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Create, configure and activate the interface described by `config`.
    ///
    /// If anything fails once the link exists (including a signal or a
    /// panic), the link and its policy network are removed again before the
    /// error is returned.
    pub async fn up(&self, config: &InterfaceConfig) -> Result<()> {
        let iface = config.name.as_str();

        if Ip::new(&self.gateway).link_exists(iface).await? {
            return Err(DeviceError::AlreadyExists(iface.to_string()).into());
        }

        let mut cleanup = PendingCleanup::arm(iface);

        let outcome = {
            let bring_up = AssertUnwindSafe(self.bring_up(config, &mut cleanup)).catch_unwind();
            tokio::select! {
                outcome = bring_up => outcome,
                err = interrupted() => Ok(Err(err)),
            }
        };

        match outcome {
            Ok(Ok(())) => {
                cleanup.disarm();
                tracing::info!("{} is up", iface);
                Ok(())
            }
            Ok(Err(err)) => {
                tracing::error!("Bringing up {} failed: {}", iface, err);
                self.rollback(cleanup).await;
                Err(err)
            }
            Err(panic) => {
                self.rollback(cleanup).await;
                std::panic::resume_unwind(panic)
            }
        }
    }

    /// Tear down an interface the WireGuard driver currently knows about
    pub async fn down(&self, iface: &str) -> Result<()> {
        let interfaces = Wg::new(&self.gateway).interfaces().await?;
        if !interfaces.iter().any(|name| name == iface) {
            return Err(DeviceError::NotAWireguardInterface(iface.to_string()).into());
        }

        self.teardown(iface, Teardown::Strict, None).await?;
        tracing::info!("{} is down", iface);
        Ok(())
    }

    /// Delete the link and destroy the policy network routing into it.
    ///
    /// The network is looked up from the live rule table; `known` covers a
    /// network that was created but never had the interface attached.
    pub async fn teardown(
        &self,
        iface: &str,
        mode: Teardown,
        known: Option<NetworkId>,
    ) -> Result<()> {
        let ip = Ip::new(&self.gateway);
        let ndc = ControlService::new(&self.gateway);

        let netid = match ip.policy_network(iface).await {
            Ok(found) => found.or(known),
            Err(err) => {
                mode.absorb(err)?;
                known
            }
        };

        if let Err(err) = ip.delete_link(iface).await {
            mode.absorb(err)?;
        }

        match netid {
            Some(netid) => {
                if let Err(err) = ndc.destroy_network(netid).await {
                    mode.absorb(err)?;
                }
            }
            None => tracing::debug!("No policy network routes into {}", iface),
        }

        Ok(())
    }

    async fn rollback(&self, cleanup: PendingCleanup) {
        let Some((iface, netid)) = cleanup.take() else {
            return;
        };
        tracing::info!("Rolling back {}", iface);
        if let Err(err) = self.teardown(&iface, Teardown::BestEffort, netid).await {
            tracing::error!("Rolling back {} failed: {}", iface, err);
        }
    }

    async fn bring_up(&self, config: &InterfaceConfig, cleanup: &mut PendingCleanup) -> Result<()> {
        let iface = config.name.as_str();
        let ip = Ip::new(&self.gateway);
        let wg = Wg::new(&self.gateway);
        let mut state = LinkState::Absent;

        ip.add_wireguard_link(iface).await?;
        state = self.enter(iface, state);

        wg.setconf(iface, &config.residual_config).await?;
        self.set_mtu(iface, config.mtu).await?;
        self.set_addresses(iface, &config.addresses).await?;

        let netid = NetworkId::allocate();
        self.attach_network(iface, netid, cleanup).await?;
        state = self.enter(iface, state);

        self.set_dns(netid, &config.dns_servers).await?;
        self.set_routes(iface, netid).await?;
        self.enter(iface, state);

        Ok(())
    }

    fn enter(&self, iface: &str, state: LinkState) -> LinkState {
        let next = state.advance();
        tracing::info!("{}: {:?} -> {:?}", iface, state, next);
        next
    }

    async fn set_mtu(&self, iface: &str, mtu: Option<u32>) -> Result<()> {
        let mtu = match mtu {
            Some(mtu) => mtu,
            None => estimate_mtu(&self.gateway, iface).await?,
        };
        ControlService::new(&self.gateway).set_mtu(iface, mtu).await
    }

    async fn set_addresses(&self, iface: &str, addresses: &[String]) -> Result<()> {
        let ndc = ControlService::new(&self.gateway);
        let ip = Ip::new(&self.gateway);

        for addr in addresses {
            if !is_safe_argument(addr) {
                tracing::warn!("Skipping address with quote or backslash: {}", addr);
                continue;
            }

            if addr.contains(':') {
                ndc.enable_ipv6(iface).await?;
                ip.add_ipv6_address(iface, addr).await?;
            } else {
                let (host, prefix) = match addr.split_once('/') {
                    Some((host, prefix)) => (host, leading_number(prefix)),
                    None => (addr.as_str(), 32),
                };
                ndc.set_ipv4_address(iface, host, prefix).await?;
            }
        }
        Ok(())
    }

    async fn attach_network(
        &self,
        iface: &str,
        netid: NetworkId,
        cleanup: &mut PendingCleanup,
    ) -> Result<()> {
        let ndc = ControlService::new(&self.gateway);

        Wg::new(&self.gateway).set_fwmark(iface, TUNNEL_FWMARK).await?;
        ndc.set_interface_up(iface).await?;
        ndc.create_vpn_network(netid).await?;
        cleanup.record_network(netid);
        ndc.add_interface(netid, iface).await?;
        ndc.add_all_users(netid).await
    }

    async fn set_dns(&self, netid: NetworkId, servers: &[String]) -> Result<()> {
        let safe: Vec<&str> = servers
            .iter()
            .map(String::as_str)
            .filter(|server| {
                let ok = is_safe_argument(server);
                if !ok {
                    tracing::warn!("Skipping DNS server with quote or backslash: {}", server);
                }
                ok
            })
            .collect();

        if safe.is_empty() {
            return Ok(());
        }
        ControlService::new(&self.gateway).set_dns(netid, &safe).await
    }

    async fn set_routes(&self, iface: &str, netid: NetworkId) -> Result<()> {
        let ndc = ControlService::new(&self.gateway);
        for route in Wg::new(&self.gateway).allowed_ips(iface).await? {
            ndc.add_route(netid, iface, &route).await?;
        }
        Ok(())
    }
}

/// Values from the config file must not carry quoting characters
fn is_safe_argument(value: &str) -> bool {
    !value.contains(|c: char| c == '\'' || c == '\\')
}

/// Resolves once SIGINT or SIGTERM arrives
async fn interrupted() -> WgError {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => WgError::Interrupted { name: "SIGINT", signal: libc::SIGINT },
        _ = terminate => WgError::Interrupted { name: "SIGTERM", signal: libc::SIGTERM },
    }
}
