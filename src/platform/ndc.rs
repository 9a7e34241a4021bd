//! `ndc` adapter: requests to the netd network-policy daemon

use crate::error::{ControlServiceError, Result};
use crate::network::NetworkId;

use super::{announce, CommandGateway, CommandOutput, Invocation};

const NDC: &str = "ndc";

/// Token netd puts in the first response line when a command succeeded
pub const SUCCESS_TOKEN: &str = "200 0";

/// UID range authorized on tunnel networks
const ALL_USERS: &str = "0-99999";

pub struct ControlService<'a> {
    gateway: &'a dyn CommandGateway,
}

impl<'a> ControlService<'a> {
    pub fn new(gateway: &'a dyn CommandGateway) -> Self {
        Self { gateway }
    }

    /// Send one request and insist on a success response
    pub async fn call<I, S>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cmd = Invocation::new(NDC).args(args);
        announce(&cmd);

        let mut output = CommandOutput::new(self.gateway);
        match output.start(&cmd).await? {
            Some(response) if response.contains(SUCCESS_TOKEN) => Ok(()),
            Some(response) => Err(ControlServiceError::Rejected {
                command: cmd.to_string(),
                response,
            }
            .into()),
            None => Err(ControlServiceError::NoResponse {
                command: cmd.to_string(),
            }
            .into()),
        }
    }

    pub async fn enable_ipv6(&self, iface: &str) -> Result<()> {
        self.call(["interface", "ipv6", iface, "enable"]).await
    }

    pub async fn set_ipv4_address(&self, iface: &str, addr: &str, prefix: u32) -> Result<()> {
        let prefix = prefix.to_string();
        self.call(["interface", "setcfg", iface, addr, prefix.as_str()])
            .await
    }

    pub async fn set_interface_up(&self, iface: &str) -> Result<()> {
        self.call(["interface", "setcfg", iface, "up"]).await
    }

    pub async fn set_mtu(&self, iface: &str, mtu: u32) -> Result<()> {
        let mtu = mtu.to_string();
        self.call(["interface", "setmtu", iface, mtu.as_str()]).await
    }

    /// Create a VPN network with secure and bypassable flags set
    pub async fn create_vpn_network(&self, netid: NetworkId) -> Result<()> {
        let netid = netid.to_string();
        self.call(["network", "create", netid.as_str(), "vpn", "1", "1"])
            .await
    }

    pub async fn destroy_network(&self, netid: NetworkId) -> Result<()> {
        let netid = netid.to_string();
        self.call(["network", "destroy", netid.as_str()]).await
    }

    pub async fn add_interface(&self, netid: NetworkId, iface: &str) -> Result<()> {
        let netid = netid.to_string();
        self.call(["network", "interface", "add", netid.as_str(), iface])
            .await
    }

    pub async fn add_all_users(&self, netid: NetworkId) -> Result<()> {
        let netid = netid.to_string();
        self.call(["network", "users", "add", netid.as_str(), ALL_USERS])
            .await
    }

    /// Bind resolvers to a network; the empty argument is the search domain list
    pub async fn set_dns(&self, netid: NetworkId, servers: &[&str]) -> Result<()> {
        let netid = netid.to_string();
        let args = ["resolver", "setnetdns", netid.as_str(), ""]
            .into_iter()
            .chain(servers.iter().copied());
        self.call(args).await
    }

    pub async fn add_route(&self, netid: NetworkId, iface: &str, route: &str) -> Result<()> {
        let netid = netid.to_string();
        self.call(["network", "route", "add", netid.as_str(), iface, route])
            .await
    }
}
