/// Interface-level settings pulled out of a tunnel config file.
///
/// Everything `wg setconf` understands stays in `residual_config`; only the
/// keys handled by wg-quick itself are lifted into typed fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceConfig {
    /// Interface name, taken from the `<name>.conf` file name
    pub name: String,
    /// Config bytes handed verbatim to `wg setconf`
    pub residual_config: Vec<u8>,
    /// Addresses in first-seen order (e.g., 10.0.0.1/24)
    pub addresses: Vec<String>,
    /// DNS servers in first-seen order
    pub dns_servers: Vec<String>,
    /// MTU override (None = estimate from routes)
    pub mtu: Option<u32>,
}

impl InterfaceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Checks a name against the interface grammar `[A-Za-z0-9_=+.-]{1,16}`.
pub fn is_valid_interface_name(name: &str) -> bool {
    (1..=16).contains(&name.len())
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'=' | b'+' | b'.' | b'-'))
}
