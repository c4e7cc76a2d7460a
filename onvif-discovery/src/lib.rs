//! ONVIF device discovery library
//!
//! This crate finds ONVIF cameras on the local network using WS-Discovery:
//! a `Probe` for `NetworkVideoTransmitter` devices is multicast from every
//! eligible local interface and the unicast `ProbeMatch` replies are turned
//! into [`Device`] records.
//!
//! # Quick Start
//!
//! ```no_run
//! use onvif_discovery::discover_all;
//! use std::time::Duration;
//!
//! let devices = discover_all(Duration::from_secs(3)).unwrap();
//! for device in devices {
//!     println!("Found {:?} at {}", device.name(), device.service_address());
//! }
//! ```
//!
//! # Choosing interfaces
//!
//! ```no_run
//! use onvif_discovery::{discover, local_interfaces};
//! use std::time::Duration;
//!
//! let wired: Vec<_> = local_interfaces()
//!     .unwrap()
//!     .into_iter()
//!     .filter(|addr| addr.ip.to_string().starts_with("192.168."))
//!     .collect();
//! let devices = discover(&wired, Duration::from_secs(5)).unwrap();
//! ```
//!
//! Only replies from the probing interface's own subnet are kept, and each
//! advertised XAddr becomes a separate device.

mod config;
mod device;
mod discovery;
mod error;
mod interface;
mod probe;

pub use config::{DiscoveryConfig, WS_DISCOVERY_ADDRESS};
pub use device::Device;
pub use error::{DiscoveryError, Result};
pub use interface::{local_interfaces, InterfaceAddr, Subnet};
pub use probe::ProbeSession;

use std::time::Duration;

/// Probe from each candidate address and collect every device that answered.
///
/// Loopback, IPv6 and addresses with an invalid netmask are skipped without
/// error. If none remain the result is empty and returns immediately.
///
/// # Arguments
///
/// * `candidates` - Local addresses to probe from, usually from [`local_interfaces`]
/// * `duration` - How long each probe listens for replies
///
/// # Errors
///
/// `DiscoveryError::Network` if any probe task hits a socket failure. Devices
/// found by other tasks are discarded in that case.
pub fn discover(candidates: &[InterfaceAddr], duration: Duration) -> Result<Vec<Device>> {
    discover_with_config(candidates, &DiscoveryConfig::default().with_duration(duration))
}

/// Like [`discover`] with full control over the probe target and buffers.
pub fn discover_with_config(
    candidates: &[InterfaceAddr],
    config: &DiscoveryConfig,
) -> Result<Vec<Device>> {
    discovery::run(candidates, config)
}

/// Probe from every local interface.
///
/// # Examples
///
/// ```no_run
/// use onvif_discovery::discover_all;
/// use std::time::Duration;
///
/// let devices = discover_all(Duration::from_secs(3)).unwrap();
/// println!("{} camera endpoint(s)", devices.len());
/// ```
pub fn discover_all(duration: Duration) -> Result<Vec<Device>> {
    let interfaces = local_interfaces()?;
    discover(&interfaces, duration)
}
