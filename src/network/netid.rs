use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Lowest id handed out; netd reserves the range below for its own networks
pub const MIN_NETWORK_ID: u32 = 4096;

/// netd policy network the tunnel interface is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkId(u32);

impl NetworkId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Pick a fresh id seeded from the clock and pid.
    ///
    /// This only avoids collisions between concurrent tunnels; it is not random
    /// in any cryptographic sense.
    pub fn allocate() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::allocate_from_seed(now ^ u64::from(std::process::id()))
    }

    /// Draw `u16 & 0xfffe` until it lands at or above [`MIN_NETWORK_ID`]
    pub fn allocate_from_seed(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        loop {
            let id = u32::from(rng.gen::<u16>() & 0xfffe);
            if id >= MIN_NETWORK_ID {
                return Self(id);
            }
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
