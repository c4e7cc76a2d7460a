//! SOAP 1.2 envelope construction and WS-Security UsernameToken signing

use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{SecondsFormat, Utc};
use rand::RngCore;
use regex::Regex;
use sha1::{Digest, Sha1};

use crate::document::escape;

pub const NS_SOAP_ENV: &str = "http://www.w3.org/2003/05/soap-envelope";
const NS_WSSE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";
const NS_WSU: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";
const PASSWORD_DIGEST_TYPE: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest";
const NONCE_ENCODING: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";

static BETWEEN_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">\s+<").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// User name and password for a device
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Parameters for signing an envelope with a UsernameToken
#[derive(Debug, Clone)]
pub struct SecurityContext {
    pub credentials: Credentials,
    /// Offset added to the local clock so `Created` matches the device's clock
    pub clock_skew: chrono::Duration,
}

impl SecurityContext {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            clock_skew: chrono::Duration::zero(),
        }
    }

    pub fn with_clock_skew(mut self, clock_skew: chrono::Duration) -> Self {
        self.clock_skew = clock_skew;
        self
    }
}

/// A SOAP request before serialization
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    /// XML fragment placed inside `s:Body`, inserted verbatim
    pub body: String,
    /// Namespace declarations such as `xmlns:tds="http://www.onvif.org/ver10/device/wsdl"`
    pub namespaces: Vec<String>,
    pub security: Option<SecurityContext>,
}

impl Envelope {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_security(mut self, security: SecurityContext) -> Self {
        self.security = Some(security);
        self
    }

    /// Serialize to the wire form, signing with a fresh token if security is set
    pub fn to_xml(&self) -> String {
        let header = self
            .security
            .as_ref()
            .map(|s| UsernameToken::generate(&s.credentials, s.clock_skew).to_xml())
            .map(|token| format!("<s:Header>{}</s:Header>", token))
            .unwrap_or_default();

        let mut body_open = String::from("<s:Body");
        for namespace in &self.namespaces {
            body_open.push(' ');
            body_open.push_str(namespace);
        }
        body_open.push('>');

        let request = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><s:Envelope xmlns:s="{soap}">{header}{body_open}{body}</s:Body></s:Envelope>"#,
            soap = NS_SOAP_ENV,
            header = header,
            body_open = body_open,
            body = self.body,
        );

        collapse_whitespace(&request)
    }
}

/// A signed WS-Security UsernameToken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsernameToken {
    pub username: String,
    pub nonce: [u8; 16],
    /// RFC 3339 UTC timestamp, e.g. `2024-03-01T12:00:00Z`
    pub created: String,
    /// base64(SHA1(nonce ‖ created ‖ password))
    pub digest: String,
}

impl UsernameToken {
    /// Sign with a fresh random nonce and the current time shifted by `clock_skew`
    pub fn generate(credentials: &Credentials, clock_skew: chrono::Duration) -> Self {
        let mut nonce = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce);
        let created = (Utc::now() + clock_skew).to_rfc3339_opts(SecondsFormat::Secs, true);
        Self::with_nonce(credentials, nonce, created)
    }

    pub fn with_nonce(credentials: &Credentials, nonce: [u8; 16], created: String) -> Self {
        let digest = password_digest(&nonce, &created, &credentials.password);
        Self {
            username: credentials.username.clone(),
            nonce,
            created,
            digest,
        }
    }

    pub fn nonce_base64(&self) -> String {
        BASE64.encode(self.nonce)
    }

    pub fn to_xml(&self) -> String {
        format!(
            r#"<wsse:Security s:mustUnderstand="1" xmlns:wsse="{wsse}" xmlns:wsu="{wsu}">
                <wsse:UsernameToken>
                    <wsse:Username>{user}</wsse:Username>
                    <wsse:Password Type="{pwd_type}">{digest}</wsse:Password>
                    <wsse:Nonce EncodingType="{nonce_enc}">{nonce}</wsse:Nonce>
                    <wsu:Created>{created}</wsu:Created>
                </wsse:UsernameToken>
            </wsse:Security>"#,
            wsse = NS_WSSE,
            wsu = NS_WSU,
            user = escape(&self.username),
            pwd_type = PASSWORD_DIGEST_TYPE,
            digest = self.digest,
            nonce_enc = NONCE_ENCODING,
            nonce = self.nonce_base64(),
            created = self.created,
        )
    }
}

/// `base64(SHA1(nonce ‖ created ‖ password))`
pub fn password_digest(nonce: &[u8], created: &str, password: &str) -> String {
    let mut sha = Sha1::new();
    sha.update(nonce);
    sha.update(created.as_bytes());
    sha.update(password.as_bytes());
    BASE64.encode(sha.finalize())
}

/// Drop whitespace between tags and fold remaining runs into a single space
pub fn collapse_whitespace(xml: &str) -> String {
    let compact = BETWEEN_TAGS.replace_all(xml, "><");
    WHITESPACE_RUN.replace_all(&compact, " ").trim().to_string()
}
