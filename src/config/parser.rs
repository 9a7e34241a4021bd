use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

use super::types::{is_valid_interface_name, InterfaceConfig};

/// Default directory searched when an interface name is given instead of a path
pub const DEFAULT_CONFIG_DIR: &str = "/data/misc/wireguard";

const INTERFACE_SECTION: &str = "[Interface]";

/// Resolve a command-line argument to a config file path.
///
/// A bare interface name maps to `<config_dir>/<name>.conf`; anything else is
/// taken as a literal path.
pub fn resolve_config_path(arg: &str, config_dir: &Path) -> PathBuf {
    if is_valid_interface_name(arg) {
        config_dir.join(format!("{}.conf", arg))
    } else {
        PathBuf::from(arg)
    }
}

/// Load a tunnel config for an interface name or config file path
pub fn parse_config(arg: &str, config_dir: &Path) -> Result<InterfaceConfig> {
    parse_config_file(resolve_config_path(arg, config_dir))
}

/// Parse a WireGuard configuration file, splitting out the keys wg-quick handles
pub fn parse_config_file<P: AsRef<Path>>(path: P) -> Result<InterfaceConfig> {
    let path = path.as_ref();

    let file = File::open(path).map_err(|source| ConfigError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let name = interface_name_from_path(path)
        .ok_or_else(|| ConfigError::InvalidName(path.to_path_buf()))?;

    warn_if_accessible(&file, path);

    let mut config = InterfaceConfig::new(name);
    let mut reader = BufReader::new(file);
    let mut line = Vec::new();
    let mut in_interface_section = false;

    loop {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        if n == 0 {
            break;
        }

        // Matching happens on a whitespace-free copy; the untouched line is what
        // gets passed through.
        let clean: Vec<u8> = line.iter().copied().filter(|b| !is_space(*b)).collect();

        if clean.first() == Some(&b'[') {
            in_interface_section = false;
        }
        if clean.eq_ignore_ascii_case(INTERFACE_SECTION.as_bytes()) {
            in_interface_section = true;
        }

        if in_interface_section && consume_interface_key(&clean, &mut config) {
            continue;
        }

        config.residual_config.extend_from_slice(&line);
    }

    tracing::debug!(
        "Parsed {}: {} address(es), {} DNS server(s), mtu {:?}",
        path.display(),
        config.addresses.len(),
        config.dns_servers.len(),
        config.mtu
    );

    Ok(config)
}

/// Extract the interface name from a `<name>.conf` path
pub fn interface_name_from_path(path: &Path) -> Option<String> {
    let path = path.to_str()?;
    let file_name = path.rsplit('/').next()?;
    let stem = file_name.strip_suffix(".conf")?;

    is_valid_interface_name(stem).then(|| stem.to_string())
}

/// Whitespace as the C locale's `isspace` sees it
fn is_space(b: u8) -> bool {
    b.is_ascii_whitespace() || b == 0x0b
}

/// Lift Address/DNS/MTU out of an [Interface] line; returns false to pass it through
fn consume_interface_key(clean: &[u8], config: &mut InterfaceConfig) -> bool {
    if let Some(value) = key_value(clean, "Address=") {
        config.addresses.extend(split_list(value));
    } else if let Some(value) = key_value(clean, "DNS=") {
        config.dns_servers.extend(split_list(value));
    } else if let Some(value) = key_value(clean, "MTU=") {
        let mtu = leading_number(&String::from_utf8_lossy(value));
        config.mtu = Some(mtu).filter(|mtu| *mtu > 0);
    } else {
        return false;
    }
    true
}

/// Case-insensitive `Key=` prefix match that requires a non-empty value
fn key_value<'a>(clean: &'a [u8], key: &str) -> Option<&'a [u8]> {
    let key = key.as_bytes();
    if clean.len() > key.len() && clean[..key.len()].eq_ignore_ascii_case(key) {
        return Some(&clean[key.len()..]);
    }
    None
}

fn split_list(value: &[u8]) -> impl Iterator<Item = String> + '_ {
    value
        .split(|b| *b == b',')
        .filter(|item| !item.is_empty())
        .map(|item| String::from_utf8_lossy(item).into_owned())
}

/// Parse the leading decimal digits of `s`; anything unparsable is 0.
pub fn leading_number(s: &str) -> u32 {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    s[..end].parse().unwrap_or(0)
}

#[cfg(unix)]
fn warn_if_accessible(file: &File, path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    match file.metadata() {
        Ok(meta) if meta.permissions().mode() & 0o077 != 0 => {
            tracing::warn!("`{}' is group or world accessible", path.display());
        }
        Ok(_) => {}
        Err(e) => tracing::debug!("Unable to stat {}: {}", path.display(), e),
    }
}

#[cfg(not(unix))]
fn warn_if_accessible(_file: &File, _path: &Path) {}
