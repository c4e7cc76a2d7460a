//! HTTP challenge-response authentication (RFC 2617 Basic and Digest)
//!
//! Used only after a device answers 401. Challenges are parsed fresh from
//! every response and never cached, since devices rotate nonces.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use md5::{Digest, Md5};
use tracing::debug;

use crate::envelope::Credentials;
use crate::error::{Result, SoapError};

/// Only one request is ever sent per challenge
const NONCE_COUNT: &str = "00000001";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Basic,
    Digest,
}

/// Quality of protection selected from the server's offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qop {
    Auth,
    AuthInt,
}

impl Qop {
    pub fn as_str(&self) -> &'static str {
        match self {
            Qop::Auth => "auth",
            Qop::AuthInt => "auth-int",
        }
    }

    /// Pick from a comma separated offer such as `auth,auth-int`, preferring `auth`
    fn select(offer: &str) -> Option<Qop> {
        let options: Vec<&str> = offer.split(',').map(str::trim).collect();
        if options.iter().any(|o| o.eq_ignore_ascii_case("auth")) {
            Some(Qop::Auth)
        } else if options.iter().any(|o| o.eq_ignore_ascii_case("auth-int")) {
            Some(Qop::AuthInt)
        } else {
            None
        }
    }
}

/// A parsed `WWW-Authenticate` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    pub scheme: Scheme,
    pub realm: Option<String>,
    pub nonce: Option<String>,
    pub qop: Option<Qop>,
    pub opaque: Option<String>,
    pub algorithm: Option<String>,
}

impl AuthChallenge {
    /// Parse one header value; `None` for schemes other than Basic and Digest
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        let (scheme, params) = header
            .split_once(char::is_whitespace)
            .unwrap_or((header, ""));

        let scheme = if scheme.eq_ignore_ascii_case("digest") {
            Scheme::Digest
        } else if scheme.eq_ignore_ascii_case("basic") {
            Scheme::Basic
        } else {
            return None;
        };

        let mut challenge = AuthChallenge {
            scheme,
            realm: None,
            nonce: None,
            qop: None,
            opaque: None,
            algorithm: None,
        };

        for (key, value) in parse_params(params) {
            match key.to_ascii_lowercase().as_str() {
                "realm" => challenge.realm = Some(value),
                "nonce" => challenge.nonce = Some(value),
                "qop" => challenge.qop = Qop::select(&value),
                "opaque" => challenge.opaque = Some(value),
                "algorithm" => challenge.algorithm = Some(value),
                _ => {}
            }
        }

        Some(challenge)
    }

    /// Pick the strongest challenge among all `WWW-Authenticate` headers of a response
    ///
    /// MD5 Digest beats Basic, which beats Digest with any other algorithm.
    /// Among equals the first header wins.
    pub fn from_headers<'a, I>(headers: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut best: Option<AuthChallenge> = None;
        for challenge in headers.into_iter().filter_map(AuthChallenge::parse) {
            if best.as_ref().map_or(true, |current| challenge.rank() > current.rank()) {
                best = Some(challenge);
            }
        }
        best
    }

    /// Whether we can compute a response for this challenge's digest algorithm
    pub fn is_md5(&self) -> bool {
        self.algorithm
            .as_deref()
            .map_or(true, |algorithm| algorithm.eq_ignore_ascii_case("MD5"))
    }

    fn rank(&self) -> u8 {
        match self.scheme {
            Scheme::Digest if self.is_md5() => 2,
            Scheme::Basic => 1,
            Scheme::Digest => 0,
        }
    }

    /// Compute the `Authorization` value answering this challenge
    ///
    /// `body` is the entity body of the retried request, hashed only for `auth-int`.
    pub fn authorization(
        &self,
        method: &str,
        uri: &str,
        body: &str,
        credentials: Option<&Credentials>,
    ) -> Result<String> {
        let realm = self
            .realm
            .as_deref()
            .ok_or_else(|| SoapError::Auth("challenge carries no realm".to_string()))?;

        let credentials = credentials
            .filter(|c| !c.username.is_empty())
            .ok_or_else(|| SoapError::Auth("no credentials".to_string()))?;

        let basic = basic_header(credentials);

        match self.nonce.as_deref() {
            Some(_) if !self.is_md5() => Err(SoapError::Auth(format!(
                "unsupported digest algorithm {}",
                self.algorithm.as_deref().unwrap_or_default()
            ))),
            Some(nonce) => {
                let cnonce = new_cnonce();
                debug!(realm, qop = ?self.qop, "answering digest challenge");
                Ok(self.digest_header(realm, nonce, method, uri, body, credentials, &cnonce))
            }
            None => Ok(basic),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn digest_header(
        &self,
        realm: &str,
        nonce: &str,
        method: &str,
        uri: &str,
        body: &str,
        credentials: &Credentials,
        cnonce: &str,
    ) -> String {
        let response = digest_response(
            &credentials.username,
            realm,
            &credentials.password,
            method,
            uri,
            nonce,
            self.qop,
            cnonce,
            body,
        );
        let opaque = self.opaque.as_deref().unwrap_or("");

        match self.qop {
            Some(qop) => format!(
                r#"Digest username="{}", realm="{}", qop="{}", algorithm="MD5", uri="{}", nonce="{}", nc={}, cnonce="{}", opaque="{}", response="{}""#,
                credentials.username,
                realm,
                qop.as_str(),
                uri,
                nonce,
                NONCE_COUNT,
                cnonce,
                opaque,
                response
            ),
            None => format!(
                r#"Digest username="{}", realm="{}", algorithm="MD5", uri="{}", nonce="{}", opaque="{}", response="{}""#,
                credentials.username, realm, uri, nonce, opaque, response
            ),
        }
    }
}

/// `Basic base64(user:password)`
pub fn basic_header(credentials: &Credentials) -> String {
    format!(
        "Basic {}",
        BASE64.encode(format!("{}:{}", credentials.username, credentials.password))
    )
}

/// RFC 2617 request digest
///
/// Without `qop` this is the RFC 2069 form `MD5(HA1:nonce:HA2)`.
#[allow(clippy::too_many_arguments)]
pub fn digest_response(
    username: &str,
    realm: &str,
    password: &str,
    method: &str,
    uri: &str,
    nonce: &str,
    qop: Option<Qop>,
    cnonce: &str,
    body: &str,
) -> String {
    let ha1 = md5_hex(&format!("{}:{}:{}", username, realm, password));
    let ha2 = match qop {
        Some(Qop::AuthInt) => md5_hex(&format!("{}:{}:{}", method, uri, md5_hex(body))),
        _ => md5_hex(&format!("{}:{}", method, uri)),
    };

    match qop {
        Some(qop) => md5_hex(&format!(
            "{}:{}:{}:{}:{}:{}",
            ha1,
            nonce,
            NONCE_COUNT,
            cnonce,
            qop.as_str(),
            ha2
        )),
        None => md5_hex(&format!("{}:{}:{}", ha1, nonce, ha2)),
    }
}

fn new_cnonce() -> String {
    let id = uuid::Uuid::new_v4();
    let mut hasher = Md5::new();
    hasher.update(id.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Split `key=value, key="quoted, value"` pairs
fn parse_params(input: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
            chars.next();
        }

        let key: String = chars
            .by_ref()
            .take_while(|c| *c != '=')
            .collect::<String>()
            .trim()
            .to_string();
        if key.is_empty() {
            break;
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    _ => value.push(c),
                }
            }
            // skip anything up to the next separator
            while matches!(chars.peek(), Some(c) if *c != ',') {
                chars.next();
            }
        } else {
            while let Some(c) = chars.next_if(|c| *c != ',') {
                value.push(c);
            }
            value = value.trim().to_string();
        }

        params.push((key, value));
    }

    params
}
