//! WS-Discovery probe over UDP
//!
//! One [`ProbeSession`] owns one outstanding probe from one local interface.
//! It sends a single `Probe` datagram and collects `ProbeMatch` replies that
//! carry its correlation id until its deadline passes.

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::{Duration, Instant};

use soap_client::{collapse_whitespace, Document};
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, warn};
use url::{Host, Url};

use crate::device::{Device, ProbeMatch};
use crate::error::{DiscoveryError, Result};
use crate::interface::Subnet;

/// One probe on one interface
#[derive(Debug, Clone)]
pub struct ProbeSession {
    correlation_id: String,
    subnet: Subnet,
    deadline: Instant,
}

impl ProbeSession {
    /// Start a session with a fresh correlation id and a deadline `duration` from now
    pub fn new(subnet: Subnet, duration: Duration) -> Self {
        Self {
            correlation_id: format!("uuid:{}", uuid::Uuid::new_v4()),
            subnet,
            deadline: Instant::now() + duration,
        }
    }

    /// The `MessageID` replies must echo in `RelatesTo`
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn subnet(&self) -> Subnet {
        self.subnet
    }

    /// Probe for `NetworkVideoTransmitter` devices, whitespace collapsed
    pub fn probe_message(&self) -> String {
        let request = format!(
            r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:a="http://schemas.xmlsoap.org/ws/2004/08/addressing">
                <s:Header>
                    <a:Action s:mustUnderstand="1">http://schemas.xmlsoap.org/ws/2005/04/discovery/Probe</a:Action>
                    <a:MessageID>{message_id}</a:MessageID>
                    <a:ReplyTo>
                        <a:Address>http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous</a:Address>
                    </a:ReplyTo>
                    <a:To s:mustUnderstand="1">urn:schemas-xmlsoap-org:ws:2005:04:discovery</a:To>
                </s:Header>
                <s:Body>
                    <Probe xmlns="http://schemas.xmlsoap.org/ws/2005/04/discovery">
                        <d:Types xmlns:d="http://schemas.xmlsoap.org/ws/2005/04/discovery" xmlns:dn="http://www.onvif.org/ver10/network/wsdl">dn:NetworkVideoTransmitter</d:Types>
                    </Probe>
                </s:Body>
            </s:Envelope>"#,
            message_id = self.correlation_id
        );
        collapse_whitespace(&request)
    }

    /// Send the probe to `target` and collect devices until the deadline
    ///
    /// Fails only on local socket errors; read timeouts end the session normally.
    pub fn run(&self, target: SocketAddr, buffer_size: usize) -> Result<Vec<Device>> {
        let socket = self.bind(target)?;

        socket
            .send_to(self.probe_message().as_bytes(), target)
            .map_err(|e| DiscoveryError::Network(format!("Failed to send probe: {}", e)))?;
        debug!("Probe {} sent from {} to {}", self.correlation_id, self.subnet, target);

        let mut devices = Vec::new();
        let mut buffer = vec![0u8; buffer_size];

        loop {
            let remaining = self.deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            socket
                .set_read_timeout(Some(remaining))
                .map_err(|e| DiscoveryError::Network(format!("Failed to set read timeout: {}", e)))?;

            match socket.recv_from(&mut buffer) {
                Ok((size, source)) => {
                    devices.extend(self.handle_datagram(&buffer[..size], source.ip()));
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => break,
                Err(e) => {
                    return Err(DiscoveryError::Network(format!("Socket error: {}", e)));
                }
            }
        }

        debug!("Probe {} finished with {} device(s)", self.correlation_id, devices.len());
        Ok(devices)
    }

    /// Turn one received datagram into devices
    ///
    /// Foreign replies, unparsable datagrams and matches without XAddrs yield
    /// nothing. XAddrs whose host lies outside the probing subnet are dropped.
    pub fn handle_datagram(&self, datagram: &[u8], source: IpAddr) -> Vec<Device> {
        let document = match Document::parse(datagram) {
            Ok(document) => document,
            Err(e) => {
                debug!("Skipping unparsable datagram from {}: {}", source, e);
                return Vec::new();
            }
        };

        match document.value_at("Envelope.Header.RelatesTo") {
            Ok(relates_to) if relates_to == self.correlation_id => {}
            other => {
                debug!("Discarding reply from {} not related to {}: {:?}", source, self.correlation_id, other);
                return Vec::new();
            }
        }

        let mut devices = Vec::new();
        for node in document.all_at("Envelope.Body.ProbeMatches.ProbeMatch") {
            let probe_match = ProbeMatch::from_node(node);
            if probe_match.xaddrs.is_empty() {
                warn!("Skipping ProbeMatch {} from {} without XAddrs", probe_match.id, source);
                continue;
            }

            devices.extend(
                probe_match
                    .into_devices(source)
                    .into_iter()
                    .filter(|device| {
                        let inside = self.in_subnet(device.service_address());
                        if !inside {
                            debug!("Dropping {} outside {}", device.service_address(), self.subnet);
                        }
                        inside
                    }),
            );
        }
        devices
    }

    fn in_subnet(&self, xaddr: &str) -> bool {
        let host = Url::parse(xaddr).ok().and_then(|url| match url.host() {
            Some(Host::Ipv4(ip)) => Some(ip),
            _ => None,
        });
        host.is_some_and(|ip| self.subnet.contains(ip))
    }

    fn bind(&self, target: SocketAddr) -> Result<UdpSocket> {
        let local = self.subnet.address();
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|e| DiscoveryError::Network(format!("Failed to create UDP socket: {}", e)))?;

        let bind_addr = SocketAddr::V4(SocketAddrV4::new(local, 0));
        socket
            .bind(&bind_addr.into())
            .map_err(|e| DiscoveryError::Network(format!("Failed to bind {}: {}", bind_addr, e)))?;

        if target.ip().is_multicast() {
            socket
                .set_multicast_if_v4(&local)
                .map_err(|e| DiscoveryError::Network(format!("Failed to select multicast interface {}: {}", local, e)))?;
        }

        Ok(socket.into())
    }
}
