//! `wg(8)` adapter: device configuration and peer queries

use crate::error::Result;

use super::{announce, run_announced, CommandGateway, CommandOutput, Invocation};

const WG: &str = "wg";

/// Placeholder `wg show` prints for an unset field
const NONE: &str = "(none)";

pub struct Wg<'a> {
    gateway: &'a dyn CommandGateway,
}

impl<'a> Wg<'a> {
    pub fn new(gateway: &'a dyn CommandGateway) -> Self {
        Self { gateway }
    }

    /// Apply a config through `wg setconf`, feeding it on stdin
    pub async fn setconf(&self, iface: &str, config: &[u8]) -> Result<()> {
        let cmd = Invocation::new(WG).args(["setconf", iface, "/proc/self/fd/0"]);
        announce(&cmd);
        self.gateway.run_with_input(&cmd, config).await
    }

    pub async fn set_fwmark(&self, iface: &str, mark: u32) -> Result<()> {
        let mark = format!("0x{:x}", mark);
        let cmd = Invocation::new(WG).args(["set", iface, "fwmark", mark.as_str()]);
        run_announced(self.gateway, cmd).await
    }

    /// Names of all WireGuard interfaces the driver knows about
    pub async fn interfaces(&self) -> Result<Vec<String>> {
        let lines = self.lines(Invocation::new(WG).args(["show", "interfaces"])).await?;
        Ok(lines
            .iter()
            .flat_map(|line| line.split_whitespace())
            .map(String::from)
            .collect())
    }

    /// Endpoint hosts of every peer that has one, ports and brackets stripped
    pub async fn endpoint_hosts(&self, iface: &str) -> Result<Vec<String>> {
        let lines = self.lines(Invocation::new(WG).args(["show", iface, "endpoints"])).await?;
        Ok(lines
            .iter()
            .filter_map(|line| endpoint_host(line))
            .map(String::from)
            .collect())
    }

    /// Every allowed-IP range of every peer, in the order `wg` lists them
    pub async fn allowed_ips(&self, iface: &str) -> Result<Vec<String>> {
        let lines = self.lines(Invocation::new(WG).args(["show", iface, "allowed-ips"])).await?;
        Ok(lines
            .iter()
            .flat_map(|line| allowed_ips_of(line))
            .map(String::from)
            .collect())
    }

    async fn lines(&self, cmd: Invocation) -> Result<Vec<String>> {
        let mut output = CommandOutput::new(self.gateway);
        let mut lines = Vec::new();
        let mut line = output.start(&cmd).await?;
        while let Some(l) = line {
            lines.push(l);
            line = output.next_line().await?;
        }
        Ok(lines)
    }
}

/// Second tab-separated field of a `wg show` line, or the line itself
fn value_field(line: &str) -> &str {
    line.split_once('\t').map_or(line, |(_, value)| value).trim()
}

/// Host part of `<pubkey>\t<endpoint>`, where endpoint is `host:port` or `[v6]:port`
pub fn endpoint_host(line: &str) -> Option<&str> {
    let endpoint = value_field(line);
    let (host, port) = endpoint.rsplit_once(':')?;
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let host = host.strip_prefix('[').unwrap_or(host);
    let host = host.strip_suffix(']').unwrap_or(host);
    let valid = !host.is_empty()
        && host
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b':' | b'.'));
    valid.then_some(host)
}

/// Ranges listed on one `<pubkey>\t<cidr> <cidr>...` line
pub fn allowed_ips_of(line: &str) -> impl Iterator<Item = &str> {
    let ranges = line.split_once('\t').map_or("", |(_, ranges)| ranges);
    ranges.split_whitespace().filter(|range| *range != NONE)
}
