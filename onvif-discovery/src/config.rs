//! Configuration for discovery runs

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

/// WS-Discovery multicast group and port
pub const WS_DISCOVERY_ADDRESS: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(239, 255, 255, 250), 3702));

/// Settings shared by every probe task of one discovery run
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// How long each probe task listens for replies
    /// Default: 3 seconds
    pub duration: Duration,

    /// Where probes are sent
    /// Default: 239.255.255.250:3702
    pub multicast_address: SocketAddr,

    /// Receive buffer per datagram
    /// Default: 16 KiB
    pub buffer_size: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(3),
            multicast_address: WS_DISCOVERY_ADDRESS,
            buffer_size: 16 * 1024,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_multicast_address(mut self, address: SocketAddr) -> Self {
        self.multicast_address = address;
        self
    }
}
