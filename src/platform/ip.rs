//! `ip(8)` adapter: links, addresses, route lookups and policy rules

use crate::config::parser::leading_number;
use crate::error::Result;
use crate::network::NetworkId;

use super::{run_announced, CommandGateway, CommandOutput, Invocation};

const IP: &str = "ip";

/// Destination for a route lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget<'a> {
    /// The default route (`ip -o route show default`)
    Default,
    /// The route the kernel would pick for a host (`ip -o route get <host>`)
    Host(&'a str),
}

pub struct Ip<'a> {
    gateway: &'a dyn CommandGateway,
}

impl<'a> Ip<'a> {
    pub fn new(gateway: &'a dyn CommandGateway) -> Self {
        Self { gateway }
    }

    /// Whether any link with this name exists
    pub async fn link_exists(&self, iface: &str) -> Result<bool> {
        let mut output = CommandOutput::new(self.gateway);
        let cmd = Invocation::new(IP).args(["link", "show", "dev", iface]).quiet();
        Ok(output.start(&cmd).await?.is_some())
    }

    pub async fn add_wireguard_link(&self, iface: &str) -> Result<()> {
        let cmd = Invocation::new(IP).args(["link", "add", iface, "type", "wireguard"]);
        run_announced(self.gateway, cmd).await
    }

    pub async fn delete_link(&self, iface: &str) -> Result<()> {
        let cmd = Invocation::new(IP).args(["link", "del", iface]);
        run_announced(self.gateway, cmd).await
    }

    pub async fn add_ipv6_address(&self, iface: &str, addr: &str) -> Result<()> {
        let cmd = Invocation::new(IP).args(["-6", "addr", "add", addr, "dev", iface]);
        run_announced(self.gateway, cmd).await
    }

    /// MTU of the route to `target`, falling back to the MTU of its device
    ///
    /// Returns None when the output carries neither an MTU nor a device.
    pub async fn route_mtu(&self, target: RouteTarget<'_>) -> Result<Option<u32>> {
        let cmd = match target {
            RouteTarget::Default => Invocation::new(IP).args(["-o", "route", "show", "default"]),
            RouteTarget::Host(host) => Invocation::new(IP).args(["-o", "route", "get", host]),
        };

        let mut route = CommandOutput::new(self.gateway);
        let Some(line) = route.start(&cmd).await? else {
            return Ok(None);
        };

        if let Some(mtu) = extract_mtu(&line) {
            return Ok(Some(mtu));
        }
        let Some(dev) = extract_dev(&line) else {
            return Ok(None);
        };

        let mut link = CommandOutput::new(self.gateway);
        let cmd = Invocation::new(IP).args(["-o", "link", "show", "dev", dev]);
        Ok(link.start(&cmd).await?.as_deref().and_then(extract_mtu))
    }

    /// Policy network whose fwmark rule routes into `iface`, if any
    pub async fn policy_network(&self, iface: &str) -> Result<Option<NetworkId>> {
        let mut rules = CommandOutput::new(self.gateway);
        let mut line = rules
            .start(&Invocation::new(IP).args(["rule", "show"]))
            .await?;

        while let Some(rule) = line {
            if let Some(netid) = network_from_rule(&rule, iface) {
                return Ok(Some(netid));
            }
            line = rules.next_line().await?;
        }
        Ok(None)
    }
}

/// `mtu N` (or `mtu lock N`) anywhere in a route or link line
pub fn extract_mtu(line: &str) -> Option<u32> {
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        if token != "mtu" {
            continue;
        }
        let mut value = tokens.next()?;
        if value == "lock" {
            value = tokens.next()?;
        }
        if value.starts_with(|c: char| c.is_ascii_digit()) {
            return Some(leading_number(value));
        }
    }
    None
}

/// Output device (`dev X`) of a route line
pub fn extract_dev(line: &str) -> Option<&str> {
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "dev" {
            return tokens.next();
        }
    }
    None
}

/// Network id from a netd rule such as `from all fwmark 0xc0064/0xcffff lookup wg0`
pub fn network_from_rule(line: &str, iface: &str) -> Option<NetworkId> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    tokens.windows(3).find_map(|window| {
        let [mark, lookup, table] = window else {
            return None;
        };
        if *lookup != "lookup" || *table != iface {
            return None;
        }
        let hex = mark.strip_prefix("0xc")?.strip_suffix("/0xcffff")?;
        if hex.is_empty() || !hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok().map(NetworkId::new)
    })
}
