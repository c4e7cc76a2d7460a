use onvif_discovery::Device;

/// Namespace of the common ONVIF schema types (`tt:`)
pub const SCHEMA_NAMESPACE: &str = "http://www.onvif.org/ver10/schema";

/// Represents the ONVIF services this crate talks to
///
/// Each service has its own WSDL namespace, element prefix and endpoint on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Device management - identity, network settings, clock, capabilities
    Device,

    /// Media - profiles and stream/snapshot URIs
    Media,

    /// Imaging - per video source image settings
    Imaging,
}

/// Namespace and endpoint information for a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// WSDL namespace, also the key in a device's service map
    pub namespace: &'static str,

    /// Prefix used for request elements
    pub prefix: &'static str,

    /// Path tried when the device has not reported an address for the service
    pub fallback_path: &'static str,
}

impl Service {
    pub fn name(&self) -> &'static str {
        match self {
            Service::Device => "Device",
            Service::Media => "Media",
            Service::Imaging => "Imaging",
        }
    }

    pub fn info(&self) -> ServiceInfo {
        match self {
            Service::Device => ServiceInfo {
                namespace: "http://www.onvif.org/ver10/device/wsdl",
                prefix: "tds",
                fallback_path: "/onvif/device_service",
            },
            Service::Media => ServiceInfo {
                namespace: "http://www.onvif.org/ver10/media/wsdl",
                prefix: "trt",
                fallback_path: "/onvif/Media",
            },
            Service::Imaging => ServiceInfo {
                namespace: "http://www.onvif.org/ver20/imaging/wsdl",
                prefix: "timg",
                fallback_path: "/onvif/Imaging",
            },
        }
    }

    /// Declarations attached to `s:Body` for requests to this service
    pub fn xmlns(&self) -> Vec<String> {
        let info = self.info();
        vec![
            format!(r#"xmlns:{}="{}""#, info.prefix, info.namespace),
            format!(r#"xmlns:tt="{}""#, SCHEMA_NAMESPACE),
        ]
    }

    /// Where requests for this service go on `device`
    ///
    /// The device service always uses the advertised XAddr.
    pub fn endpoint(&self, device: &Device) -> String {
        match self {
            Service::Device => device.service_address().to_string(),
            _ => {
                let info = self.info();
                device.endpoint_for(info.namespace, info.fallback_path)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn camera() -> Device {
        Device::new(
            "cam",
            "http://192.168.88.20:8080/onvif/device_service",
            "192.168.88.20".parse().unwrap(),
        )
    }

    #[test]
    fn test_xmlns_declarations() {
        assert_eq!(
            Service::Media.xmlns(),
            vec![
                r#"xmlns:trt="http://www.onvif.org/ver10/media/wsdl""#.to_string(),
                r#"xmlns:tt="http://www.onvif.org/ver10/schema""#.to_string(),
            ]
        );
    }

    #[test]
    fn test_endpoint_fallbacks() {
        let device = camera();
        assert_eq!(Service::Device.endpoint(&device), "http://192.168.88.20:8080/onvif/device_service");
        assert_eq!(Service::Media.endpoint(&device), "http://192.168.88.20:8080/onvif/Media");
        assert_eq!(Service::Imaging.endpoint(&device), "http://192.168.88.20:8080/onvif/Imaging");
    }

    #[test]
    fn test_endpoint_uses_service_map() {
        let mut device = camera();
        device.set_service_map(HashMap::from([(
            "http://www.onvif.org/ver20/imaging/wsdl".to_string(),
            "http://192.168.88.20:8080/onvif/imaging_service".to_string(),
        )]));

        assert_eq!(Service::Imaging.endpoint(&device), "http://192.168.88.20:8080/onvif/imaging_service");
        assert_eq!(Service::Media.endpoint(&device), "http://192.168.88.20:8080/onvif/Media");
    }
}
