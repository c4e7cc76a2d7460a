//! SOAP transport for ONVIF device communication
//!
//! This crate carries every request an ONVIF client makes after discovery:
//! it wraps a caller-supplied body fragment in a SOAP 1.2 envelope, signs it
//! with a WS-Security UsernameToken when credentials are present, posts it,
//! answers a single HTTP 401 challenge with Digest or Basic authentication,
//! and hands back the response as a generic [`Document`].
//!
//! SOAP faults are surfaced as [`SoapError::Fault`] even when the HTTP status
//! is 200, so callers never inspect fault bodies themselves.

mod auth;
mod config;
mod document;
mod envelope;
mod error;

pub use auth::{basic_header, digest_response, AuthChallenge, Qop, Scheme};
pub use config::TransportConfig;
pub use document::{escape, Document, Node, PathError};
pub use envelope::{
    collapse_whitespace, password_digest, Credentials, Envelope, SecurityContext, UsernameToken,
    NS_SOAP_ENV,
};
pub use error::{Result, SoapError};

use tracing::{debug, warn};
use url::Url;

const SOAP_CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

/// A SOAP client for ONVIF devices
///
/// Cloning is cheap and clones share the underlying connection pool. The
/// client holds no per-request state, so concurrent calls against the same
/// device are safe.
#[derive(Debug, Clone)]
pub struct SoapClient {
    agent: ureq::Agent,
    config: TransportConfig,
}

impl SoapClient {
    /// Create a new SOAP client with default configuration
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    pub fn with_config(config: TransportConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout_read(config.read_timeout)
            .user_agent(&config.user_agent)
            .build();
        Self { agent, config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Send a body fragment, signing it when credentials are given
    ///
    /// # Arguments
    /// * `service_address` - Full service URL, e.g. `http://10.0.0.5/onvif/device_service`
    /// * `body` - XML placed inside `s:Body`, not escaped by the transport
    /// * `namespaces` - Declarations attached to `s:Body`
    /// * `credentials` - Used for WS-Security and, after a 401, HTTP authentication
    pub fn send_request(
        &self,
        service_address: &str,
        body: &str,
        namespaces: &[&str],
        credentials: Option<&Credentials>,
    ) -> Result<Document> {
        let mut envelope = Envelope::new(body).with_namespaces(namespaces.iter().copied());
        if let Some(credentials) = credentials {
            envelope = envelope.with_security(SecurityContext::new(credentials.clone()));
        }
        self.send(service_address, &envelope)
    }

    /// Send an envelope and return the parsed response document
    ///
    /// A 401 is answered once; a second 401 fails with [`SoapError::Auth`].
    pub fn send(&self, service_address: &str, envelope: &Envelope) -> Result<Document> {
        let url = Url::parse(service_address).map_err(|e| {
            SoapError::Transport(format!("invalid service address {}: {}", service_address, e))
        })?;
        let body = envelope.to_xml();

        debug!("[>>> {}] {}", service_address, body);
        let mut response = self.post(&url, &body, None)?;

        if response.status() == 401 {
            let challenge = AuthChallenge::from_headers(response.all("WWW-Authenticate"));
            drain(response);

            let challenge = challenge.ok_or_else(|| {
                SoapError::Auth("401 without a usable WWW-Authenticate challenge".to_string())
            })?;
            let credentials = envelope.security.as_ref().map(|s| &s.credentials);
            let authorization =
                challenge.authorization("POST", &request_uri(&url), &body, credentials)?;

            debug!(scheme = ?challenge.scheme, "retrying {} with HTTP authentication", service_address);
            response = self.post(&url, &body, Some(&authorization))?;

            if response.status() == 401 {
                drain(response);
                return Err(SoapError::Auth(format!(
                    "{} rejected the credentials",
                    service_address
                )));
            }
        }

        if response.status() != 200 {
            let status = format!("{} {}", response.status(), response.status_text());
            drain(response);
            warn!("{} answered {}", service_address, status);
            return Err(SoapError::Transport(status));
        }

        let text = response
            .into_string()
            .map_err(|e| SoapError::Transport(e.to_string()))?;
        debug!("[<<< {}] {}", service_address, text);

        let document = Document::parse(text.as_bytes())?;
        check_fault(document)
    }

    fn post(&self, url: &Url, body: &str, authorization: Option<&str>) -> Result<ureq::Response> {
        let mut request = self
            .agent
            .post(url.as_str())
            .set("Content-Type", SOAP_CONTENT_TYPE);
        if let Some(value) = authorization {
            request = request.set("Authorization", value);
        }

        match request.send_string(body) {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(_, response)) => Ok(response),
            Err(ureq::Error::Transport(e)) => Err(SoapError::Transport(e.to_string())),
        }
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Read and discard the body so the connection can return to the pool
fn drain(response: ureq::Response) {
    let _ = response.into_string();
}

/// Path and query used as the Digest `uri` parameter
fn request_uri(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

/// Turn a fault body into [`SoapError::Fault`]
fn check_fault(document: Document) -> Result<Document> {
    let reason = document
        .text_at("Envelope.Body.Fault.Reason.Text")
        .or_else(|| document.text_at("Envelope.Body.Fault.faultstring"))
        .filter(|text| !text.is_empty());

    match reason {
        Some(text) => Err(SoapError::Fault(text)),
        None => Ok(document),
    }
}
