//! In-memory stand-in for ip, wg and ndc

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Mutex;

use wgquick::config::InterfaceConfig;
use wgquick::error::{CommandError, Result};
use wgquick::platform::{CommandGateway, Invocation, LineSource};

#[derive(Default)]
struct HostState {
    links: BTreeSet<String>,
    wireguard: BTreeSet<String>,
    networks: BTreeMap<u32, Vec<String>>,
    dns: BTreeMap<u32, Vec<String>>,
    routes: Vec<(u32, String, String)>,
    log: Vec<String>,
    setconf: Option<Vec<u8>>,
    fail_prefixes: Vec<String>,
    panic_prefix: Option<String>,
    default_route: Vec<String>,
    route_get: HashMap<String, String>,
    link_show: HashMap<String, String>,
    endpoints: Vec<String>,
    allowed_ips: Vec<String>,
}

#[derive(Default)]
pub struct FakeHost {
    state: Mutex<HostState>,
}

pub const PEER_KEY: &str = "xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=";

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every command whose text starts with `prefix`
    pub fn fail_on(self, prefix: &str) -> Self {
        self.state.lock().unwrap().fail_prefixes.push(prefix.to_string());
        self
    }

    pub fn panic_on(self, prefix: &str) -> Self {
        self.state.lock().unwrap().panic_prefix = Some(prefix.to_string());
        self
    }

    pub fn with_link(self, name: &str) -> Self {
        self.state.lock().unwrap().links.insert(name.to_string());
        self
    }

    pub fn with_default_route(self, line: &str) -> Self {
        self.state.lock().unwrap().default_route = vec![line.to_string()];
        self
    }

    pub fn with_route_to(self, host: &str, line: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .route_get
            .insert(host.to_string(), line.to_string());
        self
    }

    pub fn with_link_mtu(self, dev: &str, mtu: u32) -> Self {
        let line = format!(
            "3: {}: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu {} qdisc mq state UP mode DEFAULT",
            dev, mtu
        );
        self.state
            .lock()
            .unwrap()
            .link_show
            .insert(dev.to_string(), line);
        self
    }

    pub fn with_endpoint(self, endpoint: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .endpoints
            .push(format!("{}\t{}", PEER_KEY, endpoint));
        self
    }

    pub fn with_allowed_ips(self, ranges: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .allowed_ips
            .push(format!("{}\t{}", PEER_KEY, ranges));
        self
    }

    pub fn links(&self) -> Vec<String> {
        self.state.lock().unwrap().links.iter().cloned().collect()
    }

    pub fn networks(&self) -> Vec<u32> {
        self.state.lock().unwrap().networks.keys().copied().collect()
    }

    pub fn network_members(&self, netid: u32) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .networks
            .get(&netid)
            .cloned()
            .unwrap_or_default()
    }

    pub fn dns(&self, netid: u32) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .dns
            .get(&netid)
            .cloned()
            .unwrap_or_default()
    }

    pub fn routes(&self) -> Vec<(u32, String, String)> {
        self.state.lock().unwrap().routes.clone()
    }

    pub fn setconf_input(&self) -> Option<Vec<u8>> {
        self.state.lock().unwrap().setconf.clone()
    }

    /// Every command issued so far, in order
    pub fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    /// Position of the first logged command starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.log().iter().position(|cmd| cmd.starts_with(prefix))
    }

    fn begin(&self, cmd: &Invocation) -> (String, bool) {
        let text = cmd.to_string();
        let mut state = self.state.lock().unwrap();
        state.log.push(text.clone());
        let fail = state.fail_prefixes.iter().any(|p| text.starts_with(p));
        let panic = state
            .panic_prefix
            .as_deref()
            .is_some_and(|p| text.starts_with(p));
        drop(state);

        if panic {
            panic!("injected panic at `{}'", text);
        }
        (text, fail)
    }
}

fn failed(command: String) -> wgquick::WgError {
    CommandError::Failed {
        command,
        code: Some(1),
    }
    .into()
}

fn args(cmd: &Invocation) -> Vec<&str> {
    cmd.arguments().iter().map(String::as_str).collect()
}

#[async_trait]
impl CommandGateway for FakeHost {
    async fn run(&self, cmd: &Invocation) -> Result<()> {
        let (text, fail) = self.begin(cmd);
        if fail {
            return Err(failed(text));
        }

        let mut state = self.state.lock().unwrap();
        match (cmd.program(), args(cmd).as_slice()) {
            ("ip", ["link", "add", name, "type", "wireguard"]) => {
                if !state.links.insert(name.to_string()) {
                    return Err(failed(text));
                }
                state.wireguard.insert(name.to_string());
            }
            ("ip", ["link", "del", name]) => {
                if !state.links.remove(*name) {
                    return Err(failed(text));
                }
                state.wireguard.remove(*name);
            }
            ("ip", ["-6", "addr", "add", _, "dev", name]) if !state.links.contains(*name) => {
                return Err(failed(text));
            }
            ("wg", ["set", name, "fwmark", _]) if !state.wireguard.contains(*name) => {
                return Err(failed(text));
            }
            _ => {}
        }
        Ok(())
    }

    async fn run_with_input(&self, cmd: &Invocation, input: &[u8]) -> Result<()> {
        let (text, fail) = self.begin(cmd);
        if fail {
            return Err(failed(text));
        }
        self.state.lock().unwrap().setconf = Some(input.to_vec());
        Ok(())
    }

    async fn spawn_lines(&self, cmd: &Invocation) -> Result<Box<dyn LineSource>> {
        let (_, fail) = self.begin(cmd);
        let mut state = self.state.lock().unwrap();

        let lines: Vec<String> = match (cmd.program(), args(cmd).as_slice()) {
            ("ndc", _) if fail => vec!["400 0 Command failed".to_string()],
            (_, _) if fail => Vec::new(),
            ("ndc", request) => ndc(&mut state, request),
            ("ip", ["link", "show", "dev", name]) => {
                if state.links.contains(*name) {
                    vec![format!("9: {}: <POINTOPOINT,NOARP,UP,LOWER_UP> mtu 1420", name)]
                } else {
                    Vec::new()
                }
            }
            ("ip", ["-o", "route", "show", "default"]) => state.default_route.clone(),
            ("ip", ["-o", "route", "get", host]) => {
                state.route_get.get(*host).cloned().into_iter().collect()
            }
            ("ip", ["-o", "link", "show", "dev", dev]) => {
                state.link_show.get(*dev).cloned().into_iter().collect()
            }
            ("ip", ["rule", "show"]) => {
                let mut rules = vec!["0:\tfrom all lookup local".to_string()];
                for (netid, members) in &state.networks {
                    for member in members {
                        rules.push(format!(
                            "13000:\tfrom all fwmark 0xc{:04x}/0xcffff lookup {}",
                            netid, member
                        ));
                    }
                }
                rules.push("32000:\tfrom all unreachable".to_string());
                rules
            }
            ("wg", ["show", "interfaces"]) => {
                if state.wireguard.is_empty() {
                    Vec::new()
                } else {
                    vec![state.wireguard.iter().cloned().collect::<Vec<_>>().join(" ")]
                }
            }
            ("wg", ["show", _, "endpoints"]) => state.endpoints.clone(),
            ("wg", ["show", _, "allowed-ips"]) => state.allowed_ips.clone(),
            _ => Vec::new(),
        };

        Ok(Box::new(FakeLines(lines.into())))
    }
}

/// netd's side of an `ndc` request
fn ndc(state: &mut HostState, request: &[&str]) -> Vec<String> {
    const OK: &str = "200 0 success";
    const ERR: &str = "400 0 Command failed";

    let ok = match request {
        ["network", "create", netid, "vpn", "1", "1"] => match netid.parse::<u32>() {
            Ok(id) if !state.networks.contains_key(&id) => {
                state.networks.insert(id, Vec::new());
                true
            }
            _ => false,
        },
        ["network", "destroy", netid] => netid
            .parse::<u32>()
            .map(|id| state.networks.remove(&id).is_some())
            .unwrap_or(false),
        ["network", "interface", "add", netid, iface] => {
            let linked = state.links.contains(*iface);
            match netid.parse::<u32>().ok().and_then(|id| state.networks.get_mut(&id)) {
                Some(members) if linked => {
                    members.push(iface.to_string());
                    true
                }
                _ => false,
            }
        }
        ["network", "users", "add", netid, _] | ["network", "route", "add", netid, _, _]
            if !netid
                .parse::<u32>()
                .is_ok_and(|id| state.networks.contains_key(&id)) =>
        {
            false
        }
        ["network", "route", "add", netid, iface, route] => {
            let id = netid.parse::<u32>().unwrap_or_default();
            state.routes.push((id, iface.to_string(), route.to_string()));
            true
        }
        ["resolver", "setnetdns", netid, "", servers @ ..] => {
            let id = netid.parse::<u32>().unwrap_or_default();
            state
                .dns
                .insert(id, servers.iter().map(|s| s.to_string()).collect());
            true
        }
        ["interface", _, iface, ..] => state.links.contains(*iface),
        _ => true,
    };

    vec![if ok { OK } else { ERR }.to_string()]
}

struct FakeLines(VecDeque<String>);

#[async_trait]
impl LineSource for FakeLines {
    async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.0.pop_front())
    }
}

pub fn config(name: &str) -> InterfaceConfig {
    InterfaceConfig {
        name: name.to_string(),
        residual_config: format!(
            "[Interface]\nPrivateKey = yAnz5TF+lXXJte14tji3zlMNq+hd2rYUIgJBgB3fBmk=\n[Peer]\nPublicKey = {}\n",
            PEER_KEY
        )
        .into_bytes(),
        addresses: vec!["10.0.0.2/24".to_string()],
        dns_servers: vec!["1.1.1.1".to_string()],
        mtu: Some(1420),
    }
}
