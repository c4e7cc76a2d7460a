//! Concurrent discovery across local interfaces.
//!
//! Every eligible interface gets its own [`ProbeSession`] on a scoped thread.
//! All sessions run to their deadline; results are merged after every thread
//! has joined, and the first error in join order fails the whole run.

use std::thread;

use tracing::{debug, info};

use crate::config::DiscoveryConfig;
use crate::device::Device;
use crate::error::{DiscoveryError, Result};
use crate::interface::{InterfaceAddr, Subnet};
use crate::probe::ProbeSession;

pub(crate) fn run(candidates: &[InterfaceAddr], config: &DiscoveryConfig) -> Result<Vec<Device>> {
    let subnets: Vec<Subnet> = candidates.iter().filter_map(InterfaceAddr::subnet).collect();
    if subnets.is_empty() {
        debug!("No eligible interface among {} candidate(s)", candidates.len());
        return Ok(Vec::new());
    }

    let devices = join_all(&subnets, |subnet| {
        ProbeSession::new(subnet, config.duration).run(config.multicast_address, config.buffer_size)
    })?;

    info!("Discovery over {} interface(s) found {} device(s)", subnets.len(), devices.len());
    Ok(devices)
}

/// Run `task` once per subnet on scoped threads and merge in subnet order.
///
/// Waits for every task before looking at any result. A panicked task counts
/// as [`DiscoveryError::TaskFailed`].
fn join_all<F>(subnets: &[Subnet], task: F) -> Result<Vec<Device>>
where
    F: Fn(Subnet) -> Result<Vec<Device>> + Sync,
{
    let task = &task;
    let outcomes: Vec<Result<Vec<Device>>> = thread::scope(|scope| {
        let handles: Vec<_> = subnets
            .iter()
            .map(|&subnet| (subnet, scope.spawn(move || task(subnet))))
            .collect();

        handles
            .into_iter()
            .map(|(subnet, handle)| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(DiscoveryError::TaskFailed(subnet.to_string())))
            })
            .collect()
    });

    let mut devices = Vec::new();
    for outcome in outcomes {
        devices.extend(outcome?);
    }
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};
    use std::time::{Duration, Instant};

    #[test]
    fn test_no_eligible_candidates_returns_immediately() {
        let candidates = [
            InterfaceAddr::new(Ipv4Addr::LOCALHOST, Ipv4Addr::new(255, 0, 0, 0)),
            InterfaceAddr::new(Ipv6Addr::LOCALHOST, Ipv6Addr::UNSPECIFIED),
            InterfaceAddr::new(Ipv4Addr::new(10, 0, 0, 7), Ipv4Addr::UNSPECIFIED),
        ];
        let config = DiscoveryConfig::default().with_duration(Duration::from_secs(30));

        let started = Instant::now();
        let devices = run(&candidates, &config).unwrap();

        assert!(devices.is_empty());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_empty_candidate_list() {
        assert!(run(&[], &DiscoveryConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn test_unbindable_address_fails_whole_run() {
        // TEST-NET-3 is never assigned locally, so binding to it fails
        let candidates = [InterfaceAddr::new(
            Ipv4Addr::new(203, 0, 113, 77),
            Ipv4Addr::new(255, 255, 255, 0),
        )];
        let config = DiscoveryConfig::default().with_duration(Duration::from_millis(100));

        let result = run(&candidates, &config);
        assert!(matches!(result, Err(DiscoveryError::Network(_))));
    }

    fn subnet(last_octet: u8) -> Subnet {
        Subnet::new(Ipv4Addr::new(10, 0, last_octet, 1), Ipv4Addr::new(255, 255, 255, 0)).unwrap()
    }

    fn camera_on(subnet: Subnet) -> Device {
        let ip = subnet.address();
        Device::new(
            format!("urn:uuid:{}", ip),
            format!("http://{}/onvif/device_service", ip),
            ip.into(),
        )
    }

    #[test]
    fn test_join_all_merges_in_subnet_order() {
        let subnets = [subnet(1), subnet(2), subnet(3)];

        // later subnets finish first
        let devices = join_all(&subnets, |subnet| {
            let octet = subnet.address().octets()[2];
            std::thread::sleep(Duration::from_millis(u64::from(4 - octet) * 20));
            Ok(vec![camera_on(subnet)])
        })
        .unwrap();

        let ids: Vec<_> = devices.iter().map(Device::id).collect();
        assert_eq!(ids, ["urn:uuid:10.0.1.1", "urn:uuid:10.0.2.1", "urn:uuid:10.0.3.1"]);
    }

    #[test]
    fn test_join_all_waits_for_every_task_then_fails() {
        let subnets = [subnet(1), subnet(2), subnet(3)];
        let finished = std::sync::atomic::AtomicUsize::new(0);

        let result = join_all(&subnets, |subnet| {
            let octet = subnet.address().octets()[2];
            if octet == 3 {
                std::thread::sleep(Duration::from_millis(50));
            }
            finished.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            match octet {
                2 => Err(DiscoveryError::Network(format!("{} unreachable", subnet))),
                _ => Ok(vec![camera_on(subnet)]),
            }
        });

        assert!(matches!(result, Err(DiscoveryError::Network(ref msg)) if msg == "10.0.2.1/24 unreachable"));
        assert_eq!(finished.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[test]
    fn test_join_all_reports_first_error_in_subnet_order() {
        let subnets = [subnet(1), subnet(2)];

        // the second subnet fails first in wall-clock time
        let result = join_all(&subnets, |subnet| match subnet.address().octets()[2] {
            1 => {
                std::thread::sleep(Duration::from_millis(50));
                Err(DiscoveryError::Network("first".to_string()))
            }
            _ => Err(DiscoveryError::Network("second".to_string())),
        });

        assert!(matches!(result, Err(DiscoveryError::Network(ref msg)) if msg == "first"));
    }

    #[test]
    fn test_join_all_maps_panics_to_task_failed() {
        let subnets = [subnet(1), subnet(2)];

        let result = join_all(&subnets, |subnet| {
            if subnet.address().octets()[2] == 1 {
                panic!("socket task blew up");
            }
            Ok(vec![camera_on(subnet)])
        });

        assert!(matches!(result, Err(DiscoveryError::TaskFailed(ref s)) if s == "10.0.1.1/24"));
    }
}
