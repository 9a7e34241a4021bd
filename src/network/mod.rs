pub mod mtu;
pub mod netid;

pub use mtu::{estimate_mtu, FALLBACK_MTU, WIREGUARD_OVERHEAD};
pub use netid::NetworkId;
