use crate::error::Result;
use crate::platform::ip::{Ip, RouteTarget};
use crate::platform::wg::Wg;
use crate::platform::CommandGateway;

/// MTU assumed when no route says otherwise
pub const FALLBACK_MTU: u32 = 1500;

/// Bytes of IP, UDP and WireGuard headers around every tunnelled packet
pub const WIREGUARD_OVERHEAD: u32 = 80;

/// Work out an MTU for `iface` from the routes its traffic will take.
///
/// Takes the smallest MTU among the default route and the route to every
/// peer endpoint, then leaves room for encapsulation. Lookups that yield
/// nothing usable are skipped.
pub async fn estimate_mtu(gateway: &dyn CommandGateway, iface: &str) -> Result<u32> {
    let ip = Ip::new(gateway);
    let wg = Wg::new(gateway);

    let mut mtu = match ip.route_mtu(RouteTarget::Default).await? {
        Some(mtu) if mtu > 0 => mtu,
        _ => FALLBACK_MTU,
    };
    tracing::debug!("Default route MTU: {}", mtu);

    for host in wg.endpoint_hosts(iface).await? {
        match ip.route_mtu(RouteTarget::Host(&host)).await? {
            Some(endpoint_mtu) if endpoint_mtu > 0 => {
                tracing::debug!("Route MTU towards {}: {}", host, endpoint_mtu);
                mtu = mtu.min(endpoint_mtu);
            }
            _ => tracing::debug!("No route MTU towards {}", host),
        }
    }

    Ok(mtu.saturating_sub(WIREGUARD_OVERHEAD))
}
