use mockito::{Matcher, Server};
use rstest::rstest;
use soap_client::{Credentials, SoapClient, SoapError};

const DEVICE_NS: &str = r#"xmlns:tds="http://www.onvif.org/ver10/device/wsdl""#;

const HOSTNAME_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://www.w3.org/2003/05/soap-envelope"
                   xmlns:tds="http://www.onvif.org/ver10/device/wsdl"
                   xmlns:tt="http://www.onvif.org/ver10/schema">
    <SOAP-ENV:Body>
        <tds:GetHostnameResponse>
            <tds:HostnameInformation>
                <tt:FromDHCP>false</tt:FromDHCP>
                <tt:Name>lobby-cam</tt:Name>
            </tds:HostnameInformation>
        </tds:GetHostnameResponse>
    </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

fn admin() -> Credentials {
    Credentials::new("admin", "s3cret")
}

fn device_url(server: &Server) -> String {
    format!("{}/onvif/device_service", server.url())
}

#[test]
fn test_successful_request_returns_document() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/onvif/device_service")
        .match_header("content-type", "application/soap+xml; charset=utf-8")
        .match_body(Matcher::Regex("<tds:GetHostname/>".to_string()))
        .with_status(200)
        .with_body(HOSTNAME_RESPONSE)
        .create();

    let client = SoapClient::new();
    let document = client
        .send_request(&device_url(&server), "<tds:GetHostname/>", &[DEVICE_NS], None)
        .unwrap();

    assert_eq!(
        document.value_at("Envelope.Body.GetHostnameResponse.HostnameInformation.Name"),
        Ok("lobby-cam")
    );
    mock.assert();
}

#[test]
fn test_signed_request_carries_username_token() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/onvif/device_service")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("<wsse:Username>admin</wsse:Username>".to_string()),
            Matcher::Regex("<wsse:Nonce ".to_string()),
            Matcher::Regex("<wsu:Created>".to_string()),
        ]))
        .with_status(200)
        .with_body(HOSTNAME_RESPONSE)
        .create();

    let client = SoapClient::new();
    client
        .send_request(&device_url(&server), "<tds:GetHostname/>", &[DEVICE_NS], Some(&admin()))
        .unwrap();

    mock.assert();
}

#[test]
fn test_fault_in_200_response_is_an_error() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/onvif/device_service")
        .with_status(200)
        .with_body(
            r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope">
                <s:Body><s:Fault><s:Reason><s:Text>X</s:Text></s:Reason></s:Fault></s:Body>
            </s:Envelope>"#,
        )
        .create();

    let client = SoapClient::new();
    let result = client.send_request(&device_url(&server), "<tds:GetHostname/>", &[DEVICE_NS], None);

    match result {
        Err(SoapError::Fault(text)) => assert_eq!(text, "X"),
        other => panic!("Expected SoapError::Fault, got {:?}", other),
    }
}

#[test]
fn test_digest_challenge_is_answered_once() {
    let mut server = Server::new();
    let challenge = server
        .mock("POST", "/onvif/device_service")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header(
            "WWW-Authenticate",
            r#"Digest realm="onvif", nonce="5a1c0f", qop="auth", opaque="e0b1""#,
        )
        .expect(1)
        .create();
    let answer = server
        .mock("POST", "/onvif/device_service")
        .match_header(
            "authorization",
            Matcher::AllOf(vec![
                Matcher::Regex("^Digest ".to_string()),
                Matcher::Regex(r#"username="admin""#.to_string()),
                Matcher::Regex(r#"uri="/onvif/device_service""#.to_string()),
                Matcher::Regex(r#"qop="auth""#.to_string()),
                Matcher::Regex(r#"nc=00000001"#.to_string()),
                Matcher::Regex(r#"opaque="e0b1""#.to_string()),
            ]),
        )
        .with_status(200)
        .with_body(HOSTNAME_RESPONSE)
        .expect(1)
        .create();

    let client = SoapClient::new();
    let document = client
        .send_request(&device_url(&server), "<tds:GetHostname/>", &[DEVICE_NS], Some(&admin()))
        .unwrap();

    assert!(document.get("Envelope.Body.GetHostnameResponse").is_some());
    challenge.assert();
    answer.assert();
}

#[test]
fn test_basic_challenge_is_answered_once() {
    let mut server = Server::new();
    let _challenge = server
        .mock("POST", "/onvif/device_service")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("WWW-Authenticate", r#"Basic realm="camera""#)
        .create();
    let answer = server
        .mock("POST", "/onvif/device_service")
        .match_header("authorization", "Basic YWRtaW46czNjcmV0")
        .with_status(200)
        .with_body(HOSTNAME_RESPONSE)
        .expect(1)
        .create();

    let client = SoapClient::new();
    client
        .send_request(&device_url(&server), "<tds:GetHostname/>", &[DEVICE_NS], Some(&admin()))
        .unwrap();

    answer.assert();
}

#[test]
fn test_repeated_401_fails_after_exactly_two_requests() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/onvif/device_service")
        .with_status(401)
        .with_header("WWW-Authenticate", r#"Digest realm="onvif", nonce="abc", qop="auth""#)
        .expect(2)
        .create();

    let client = SoapClient::new();
    let result = client.send_request(&device_url(&server), "<tds:GetHostname/>", &[DEVICE_NS], Some(&admin()));

    assert!(matches!(result, Err(SoapError::Auth(_))));
    mock.assert();
}

#[test]
fn test_401_without_challenge_is_not_retried() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/onvif/device_service")
        .with_status(401)
        .expect(1)
        .create();

    let client = SoapClient::new();
    let result = client.send_request(&device_url(&server), "<tds:GetHostname/>", &[DEVICE_NS], Some(&admin()));

    assert!(matches!(result, Err(SoapError::Auth(_))));
    mock.assert();
}

#[test]
fn test_401_without_credentials_is_not_retried() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/onvif/device_service")
        .with_status(401)
        .with_header("WWW-Authenticate", r#"Basic realm="camera""#)
        .expect(1)
        .create();

    let client = SoapClient::new();
    let result = client.send_request(&device_url(&server), "<tds:GetHostname/>", &[DEVICE_NS], None);

    assert!(matches!(result, Err(SoapError::Auth(_))));
    mock.assert();
}

#[rstest]
#[case(500)]
#[case(404)]
#[case(503)]
fn test_other_statuses_are_transport_errors(#[case] status: usize) {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/onvif/device_service")
        .with_status(status)
        .with_body("nope")
        .create();

    let client = SoapClient::new();
    let result = client.send_request(&device_url(&server), "<tds:GetHostname/>", &[DEVICE_NS], None);

    match result {
        Err(SoapError::Transport(message)) => assert!(message.starts_with(&status.to_string())),
        other => panic!("Expected SoapError::Transport, got {:?}", other),
    }
}

#[test]
fn test_unparsable_response_is_parse_error() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/onvif/device_service")
        .with_status(200)
        .with_body("<s:Envelope><s:Body>")
        .create();

    let client = SoapClient::new();
    let result = client.send_request(&device_url(&server), "<tds:GetHostname/>", &[DEVICE_NS], None);

    assert!(matches!(result, Err(SoapError::Parse(_))));
}

#[test]
fn test_unreachable_device_is_transport_error() {
    let client = SoapClient::new();
    let result = client.send_request("http://127.0.0.1:1/onvif/device_service", "<tds:GetHostname/>", &[DEVICE_NS], None);
    assert!(matches!(result, Err(SoapError::Transport(_))));
}
