//! Test helpers for loopback discovery tests

use std::net::{SocketAddr, UdpSocket};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use soap_client::Document;

/// A ProbeMatch a fake camera will answer with
#[derive(Debug, Clone)]
pub struct ProbeMatchFixture {
    pub endpoint: String,
    pub scopes: Vec<String>,
    pub xaddrs: Vec<String>,
}

impl ProbeMatchFixture {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            scopes: Vec::new(),
            xaddrs: Vec::new(),
        }
    }

    pub fn scope(mut self, scope: &str) -> Self {
        self.scopes.push(scope.to_string());
        self
    }

    pub fn xaddr(mut self, xaddr: &str) -> Self {
        self.xaddrs.push(xaddr.to_string());
        self
    }

    /// A full ProbeMatches envelope relating to `message_id`
    pub fn reply(&self, message_id: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"
              xmlns:wsadis="http://schemas.xmlsoap.org/ws/2004/08/addressing"
              xmlns:d="http://schemas.xmlsoap.org/ws/2005/04/discovery"
              xmlns:dn="http://www.onvif.org/ver10/network/wsdl">
    <env:Header>
        <wsadis:MessageID>uuid:7a3e9c10-0000-4000-8000-000000000001</wsadis:MessageID>
        <wsadis:RelatesTo>{}</wsadis:RelatesTo>
        <wsadis:To>http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous</wsadis:To>
        <wsadis:Action>http://schemas.xmlsoap.org/ws/2005/04/discovery/ProbeMatches</wsadis:Action>
    </env:Header>
    <env:Body>
        <d:ProbeMatches>
            <d:ProbeMatch>
                <wsadis:EndpointReference>
                    <wsadis:Address>{}</wsadis:Address>
                </wsadis:EndpointReference>
                <d:Types>dn:NetworkVideoTransmitter</d:Types>
                <d:Scopes>{}</d:Scopes>
                <d:XAddrs>{}</d:XAddrs>
                <d:MetadataVersion>1</d:MetadataVersion>
            </d:ProbeMatch>
        </d:ProbeMatches>
    </env:Body>
</env:Envelope>"#,
            message_id,
            self.endpoint,
            self.scopes.join(" "),
            self.xaddrs.join(" ")
        )
    }
}

/// What a fake camera sends back after receiving a probe
#[derive(Debug, Clone)]
pub enum Answer {
    /// A reply echoing the probe's MessageID
    Match(ProbeMatchFixture),
    /// A reply to some other probe
    Foreign(ProbeMatchFixture),
    /// Raw bytes, e.g. something that is not XML
    Raw(Vec<u8>),
}

/// A UDP responder on loopback standing in for a camera
pub struct FakeCamera {
    pub address: SocketAddr,
    handle: JoinHandle<Option<String>>,
}

impl FakeCamera {
    /// Wait for one probe and send `answers` back to its sender in order
    pub fn spawn(answers: Vec<Answer>) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").expect("bind fake camera");
        socket
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("set read timeout");
        let address = socket.local_addr().expect("local addr");

        let handle = thread::spawn(move || {
            let mut buffer = [0u8; 16 * 1024];
            let (size, sender) = socket.recv_from(&mut buffer).ok()?;
            let probe = Document::parse(&buffer[..size]).ok()?;
            let message_id = probe.text_at("Envelope.Header.MessageID")?;

            for answer in answers {
                let bytes = match answer {
                    Answer::Match(fixture) => fixture.reply(&message_id).into_bytes(),
                    Answer::Foreign(fixture) => fixture.reply("uuid:not-your-probe").into_bytes(),
                    Answer::Raw(bytes) => bytes,
                };
                socket.send_to(&bytes, sender).ok()?;
            }
            Some(message_id)
        });

        Self { address, handle }
    }

    /// The MessageID of the probe the camera received, if any
    pub fn received_message_id(self) -> Option<String> {
        self.handle.join().expect("fake camera thread panicked")
    }
}
