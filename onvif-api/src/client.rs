use chrono::Utc;
use onvif_discovery::Device;
use soap_client::{Envelope, SecurityContext, SoapClient, TransportConfig};
use tracing::{debug, info};

use crate::operations::device::{
    clock_skew_from_device, GetServicesOperation, GetServicesRequest,
    GetSystemDateAndTimeOperation, GetSystemDateAndTimeRequest, ServiceEntry,
};
use crate::{ApiError, OnvifOperation, Result};

/// A client for executing ONVIF operations against discovered devices
///
/// The client resolves the endpoint for the operation's service, signs the
/// request with the device's credentials and maps the `{Action}Response`
/// element through the operation.
///
/// ```rust,no_run
/// use onvif_api::{OnvifClient, operations::device::{GetDeviceInformationOperation, GetDeviceInformationRequest}};
/// use onvif_discovery::Device;
/// use soap_client::Credentials;
///
/// # fn main() -> onvif_api::Result<()> {
/// let device = Device::new(
///     "cam",
///     "http://192.168.1.64/onvif/device_service",
///     "192.168.1.64".parse().unwrap(),
/// )
/// .with_credentials(Credentials::new("admin", "secret"));
///
/// let client = OnvifClient::new();
/// let info = client.execute::<GetDeviceInformationOperation>(&device, &GetDeviceInformationRequest)?;
/// println!("{} {}", info.manufacturer, info.model);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct OnvifClient {
    soap_client: SoapClient,
}

impl OnvifClient {
    pub fn new() -> Self {
        Self {
            soap_client: SoapClient::new(),
        }
    }

    /// Create a client with custom timeouts or user agent
    pub fn with_config(config: TransportConfig) -> Self {
        Self {
            soap_client: SoapClient::with_config(config),
        }
    }

    pub fn with_soap_client(soap_client: SoapClient) -> Self {
        Self { soap_client }
    }

    /// Execute an ONVIF operation against a device
    ///
    /// # Arguments
    /// * `device` - Target device; its credentials and clock skew sign the request
    /// * `request` - The operation request data
    pub fn execute<Op: OnvifOperation>(&self, device: &Device, request: &Op::Request) -> Result<Op::Response> {
        let service = Op::SERVICE;
        let endpoint = service.endpoint(device);
        let body = action_element(service.info().prefix, Op::ACTION, &Op::build_payload(request));

        let mut envelope = Envelope::new(body).with_namespaces(service.xmlns());
        if let Some(credentials) = device.credentials() {
            envelope = envelope.with_security(
                SecurityContext::new(credentials.clone()).with_clock_skew(device.clock_skew()),
            );
        }

        debug!(service = service.name(), action = Op::ACTION, "calling {}", endpoint);
        let document = self.soap_client.send(&endpoint, &envelope)?;

        let response_path = format!("Envelope.Body.{}Response", Op::ACTION);
        let response = document.get(&response_path).ok_or_else(|| {
            ApiError::UnexpectedResponse(format!("{} has no {}Response element", endpoint, Op::ACTION))
        })?;

        Op::parse_response(response)
    }

    /// Ask the device for its services and record their addresses on it
    ///
    /// Later media and imaging calls go to the reported addresses instead of
    /// the default paths.
    pub fn load_services(&self, device: &mut Device) -> Result<Vec<ServiceEntry>> {
        let services = self.execute::<GetServicesOperation>(device, &GetServicesRequest::default())?;
        info!("{} reports {} services", device.service_address(), services.len());
        device.set_service_map(ServiceEntry::into_map(services.iter().cloned()));
        Ok(services)
    }

    /// Measure the device clock and store the offset used for request timestamps
    pub fn sync_clock(&self, device: &mut Device) -> Result<chrono::Duration> {
        let info = self.execute::<GetSystemDateAndTimeOperation>(device, &GetSystemDateAndTimeRequest)?;
        let skew = clock_skew_from_device(&info, Utc::now())?;
        debug!("{} clock skew {}s", device.service_address(), skew.num_seconds());
        device.set_clock_skew(skew);
        Ok(skew)
    }
}

fn action_element(prefix: &str, action: &str, payload: &str) -> String {
    if payload.is_empty() {
        format!("<{}:{}/>", prefix, action)
    } else {
        format!("<{0}:{1}>{2}</{0}:{1}>", prefix, action, payload)
    }
}
