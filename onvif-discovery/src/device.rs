//! Discovered devices and ProbeMatch parsing.
//!
//! A ProbeMatch carries one identity and a space separated list of XAddrs;
//! every XAddr becomes its own [`Device`] sharing that identity.

use std::collections::HashMap;
use std::net::IpAddr;

use serde::Serialize;
use soap_client::{Credentials, Node};
use url::Url;

const NAME_SCOPE: &str = "onvif://www.onvif.org/name/";
const MAC_SCOPE: &str = "onvif://www.onvif.org/MAC/";

/// An ONVIF unit found on the local network.
///
/// Identity fields are fixed at discovery time. Credentials, the service map
/// and the clock skew are filled in afterwards by the caller or the API layer.
#[derive(Debug, Clone, Serialize)]
pub struct Device {
    id: String,
    name: Option<String>,
    mac_address: Option<String>,
    service_address: String,
    source_address: IpAddr,
    #[serde(skip)]
    credentials: Option<Credentials>,
    service_map: Option<HashMap<String, String>>,
    #[serde(skip)]
    clock_skew: chrono::Duration,
}

impl Device {
    pub fn new(
        id: impl Into<String>,
        service_address: impl Into<String>,
        source_address: IpAddr,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            mac_address: None,
            service_address: service_address.into(),
            source_address,
            credentials: None,
            service_map: None,
            clock_skew: chrono::Duration::zero(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_mac_address(mut self, mac: impl Into<String>) -> Self {
        self.mac_address = Some(mac.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Endpoint reference with any `urn:uuid:` prefix removed
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn mac_address(&self) -> Option<&str> {
        self.mac_address.as_deref()
    }

    /// The XAddr the unit advertised; SOAP calls go here
    pub fn service_address(&self) -> &str {
        &self.service_address
    }

    /// Where the discovery reply came from
    pub fn source_address(&self) -> IpAddr {
        self.source_address
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    /// Namespace to service address, present once `GetServices` has run
    pub fn service_map(&self) -> Option<&HashMap<String, String>> {
        self.service_map.as_ref()
    }

    pub fn set_service_map(&mut self, services: HashMap<String, String>) {
        self.service_map = Some(services);
    }

    pub fn clock_skew(&self) -> chrono::Duration {
        self.clock_skew
    }

    pub fn set_clock_skew(&mut self, skew: chrono::Duration) {
        self.clock_skew = skew;
    }

    /// `host[:port]` of the service address
    pub fn service_host(&self) -> Option<String> {
        let url = Url::parse(&self.service_address).ok()?;
        let host = url.host_str()?;
        Some(match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }

    /// Address of the service for `namespace`
    ///
    /// Uses the service map when it has an entry, else `http://<host><fallback_path>`.
    /// Falls back to the device service address when the host cannot be read.
    pub fn endpoint_for(&self, namespace: &str, fallback_path: &str) -> String {
        if let Some(address) = self.service_map.as_ref().and_then(|m| m.get(namespace)) {
            return address.clone();
        }
        match self.service_host() {
            Some(host) => format!("http://{}{}", host, fallback_path),
            None => self.service_address.clone(),
        }
    }
}

/// Identity and endpoints carried by one `ProbeMatch` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProbeMatch {
    pub id: String,
    pub name: Option<String>,
    pub mac_address: Option<String>,
    pub xaddrs: Vec<String>,
}

impl ProbeMatch {
    pub fn from_node(node: &Node) -> Self {
        let id = node
            .text_at("EndpointReference.Address")
            .unwrap_or_default()
            .replacen("urn:uuid:", "", 1);

        let mut name = None;
        let mut mac_address = None;
        let scopes = node.text_at("Scopes").unwrap_or_default();
        for scope in scopes.split_whitespace() {
            if let Some(value) = scope.strip_prefix(NAME_SCOPE) {
                name = Some(value.replace('_', " "));
            } else if let Some(value) = scope.strip_prefix(MAC_SCOPE) {
                mac_address = Some(value.to_string());
            }
        }

        let xaddrs = node
            .text_at("XAddrs")
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        Self {
            id,
            name,
            mac_address,
            xaddrs,
        }
    }

    pub fn into_devices(self, source: IpAddr) -> Vec<Device> {
        self.xaddrs
            .into_iter()
            .map(|xaddr| Device {
                id: self.id.clone(),
                name: self.name.clone(),
                mac_address: self.mac_address.clone(),
                service_address: xaddr,
                source_address: source,
                credentials: None,
                service_map: None,
                clock_skew: chrono::Duration::zero(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soap_client::Document;

    fn probe_match(inner: &str) -> ProbeMatch {
        let xml = format!("<ProbeMatch>{}</ProbeMatch>", inner);
        let doc = Document::parse(xml.as_bytes()).unwrap();
        ProbeMatch::from_node(doc.root())
    }

    #[test]
    fn test_probe_match_fields() {
        let parsed = probe_match(
            r#"<EndpointReference><Address>urn:uuid:4a1f-00aa</Address></EndpointReference>
               <Scopes>onvif://www.onvif.org/type/video_encoder onvif://www.onvif.org/name/Front_Door_Cam onvif://www.onvif.org/MAC/00-11-22-33-44-55</Scopes>
               <XAddrs>http://10.0.0.5/onvif/device_service</XAddrs>"#,
        );

        assert_eq!(parsed.id, "4a1f-00aa");
        assert_eq!(parsed.name.as_deref(), Some("Front Door Cam"));
        assert_eq!(parsed.mac_address.as_deref(), Some("00-11-22-33-44-55"));
        assert_eq!(parsed.xaddrs, vec!["http://10.0.0.5/onvif/device_service"]);
    }

    #[test]
    fn test_missing_scopes_leave_name_and_mac_unset() {
        let parsed = probe_match(
            r#"<EndpointReference><Address>plain-id</Address></EndpointReference>
               <XAddrs>http://10.0.0.5/onvif/device_service</XAddrs>"#,
        );
        assert_eq!(parsed.id, "plain-id");
        assert!(parsed.name.is_none());
        assert!(parsed.mac_address.is_none());
    }

    #[test]
    fn test_two_xaddrs_share_identity() {
        let parsed = probe_match(
            r#"<EndpointReference><Address>urn:uuid:abc</Address></EndpointReference>
               <XAddrs>http://10.0.0.5/onvif/device_service http://[fe80::1]/onvif/device_service</XAddrs>"#,
        );
        let devices = parsed.into_devices("10.0.0.5".parse().unwrap());

        assert_eq!(devices.len(), 2);
        assert!(devices.iter().all(|d| d.id() == "abc"));
        assert_eq!(devices[1].service_address(), "http://[fe80::1]/onvif/device_service");
    }

    #[test]
    fn test_service_host_keeps_port() {
        let device = Device::new("x", "http://192.168.88.20:8080/onvif/device_service", "192.168.88.20".parse().unwrap());
        assert_eq!(device.service_host().as_deref(), Some("192.168.88.20:8080"));
    }

    #[test]
    fn test_endpoint_for_prefers_service_map() {
        let mut device = Device::new("x", "http://10.0.0.5/onvif/device_service", "10.0.0.5".parse().unwrap());
        let ns = "http://www.onvif.org/ver10/media/wsdl";
        assert_eq!(device.endpoint_for(ns, "/onvif/Media"), "http://10.0.0.5/onvif/Media");

        device.set_service_map(HashMap::from([(ns.to_string(), "http://10.0.0.5:81/media".to_string())]));
        assert_eq!(device.endpoint_for(ns, "/onvif/Media"), "http://10.0.0.5:81/media");
    }

    #[test]
    fn test_credentials_are_not_serialized() {
        let device = Device::new("x", "http://10.0.0.5/onvif/device_service", "10.0.0.5".parse().unwrap())
            .with_credentials(Credentials::new("admin", "s3cret"));
        let json = serde_json::to_string(&device).unwrap();
        assert!(!json.contains("s3cret"));
        assert!(json.contains("\"service_address\":\"http://10.0.0.5/onvif/device_service\""));
    }
}
