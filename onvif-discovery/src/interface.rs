//! Local interface addresses and subnet membership

use std::net::{IpAddr, Ipv4Addr};

use get_if_addrs::IfAddr;
use serde::Serialize;

use crate::error::{DiscoveryError, Result};

/// An address assigned to a local interface, with its netmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InterfaceAddr {
    pub ip: IpAddr,
    pub netmask: IpAddr,
}

impl InterfaceAddr {
    pub fn new(ip: impl Into<IpAddr>, netmask: impl Into<IpAddr>) -> Self {
        Self {
            ip: ip.into(),
            netmask: netmask.into(),
        }
    }

    /// The subnet to probe from, or `None` if this address is not eligible
    ///
    /// Eligible addresses are IPv4, not loopback, and carry a contiguous
    /// non-zero netmask.
    pub fn subnet(&self) -> Option<Subnet> {
        match (self.ip, self.netmask) {
            (IpAddr::V4(ip), IpAddr::V4(netmask)) if !ip.is_loopback() => Subnet::new(ip, netmask),
            _ => None,
        }
    }
}

/// An IPv4 address and the network it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet {
    address: Ipv4Addr,
    netmask: Ipv4Addr,
}

impl Subnet {
    /// `None` when the mask is zero or has holes
    pub fn new(address: Ipv4Addr, netmask: Ipv4Addr) -> Option<Self> {
        let mask = u32::from(netmask);
        if mask == 0 || mask.leading_ones() + mask.trailing_zeros() != 32 {
            return None;
        }
        Some(Self { address, netmask })
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn prefix_len(&self) -> u32 {
        u32::from(self.netmask).leading_ones()
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let mask = u32::from(self.netmask);
        u32::from(ip) & mask == u32::from(self.address) & mask
    }
}

impl std::fmt::Display for Subnet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len())
    }
}

/// IPv4 addresses of every local interface
///
/// Loopback entries are included; [`discover`](crate::discover) filters them.
pub fn local_interfaces() -> Result<Vec<InterfaceAddr>> {
    let interfaces =
        get_if_addrs::get_if_addrs().map_err(|e| DiscoveryError::Interfaces(e.to_string()))?;

    Ok(interfaces
        .into_iter()
        .filter_map(|iface| match iface.addr {
            IfAddr::V4(addr) => Some(InterfaceAddr::new(addr.ip, addr.netmask)),
            IfAddr::V6(_) => None,
        })
        .collect())
}
