//! # ONVIF camera walkthrough
//!
//! Probes every local IPv4 interface until at least one camera answers, then
//! for each camera syncs the clock, lists network protocols and prints the
//! UDP and RTSP stream URIs of every media profile.
//!
//! ```bash
//! ONVIF_USER=admin ONVIF_PASSWORD=secret ONVIF_LOG_MODE=development \
//!     cargo run -p onvif-api --example discover_cameras
//! ```

use std::thread;
use std::time::Duration;

use onvif_api::logging::init_logging_from_env;
use onvif_api::operations::device::{GetNetworkProtocolsOperation, GetNetworkProtocolsRequest};
use onvif_api::operations::media::{
    GetProfilesOperation, GetProfilesRequest, GetStreamUriOperation, GetStreamUriRequest,
    StreamProtocol,
};
use onvif_api::{Credentials, Device, OnvifClient};
use onvif_discovery::{discover, local_interfaces};

const PROBE_DURATION: Duration = Duration::from_secs(15);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging_from_env()?;

    let interfaces = local_interfaces()?;
    if interfaces.iter().all(|iface| iface.subnet().is_none()) {
        println!("No addresses");
        return Ok(());
    }

    let credentials = Credentials::new(
        std::env::var("ONVIF_USER").unwrap_or_else(|_| "admin".to_string()),
        std::env::var("ONVIF_PASSWORD").unwrap_or_else(|_| "admin".to_string()),
    );

    let devices = loop {
        thread::sleep(Duration::from_secs(1));
        println!("Discovering...");

        let devices = discover(&interfaces, PROBE_DURATION)?;
        if !devices.is_empty() {
            break devices;
        }
        println!("No cameras were found");
    };
    println!("Found {} camera endpoint(s)", devices.len());

    let client = OnvifClient::new();
    for mut device in devices {
        device.set_credentials(credentials.clone());
        if let Err(e) = walk_device(&client, &mut device) {
            eprintln!("{}: {}", device.service_address(), e);
        }
    }

    Ok(())
}

fn walk_device(client: &OnvifClient, device: &mut Device) -> onvif_api::Result<()> {
    println!("\nXAddr {}", device.service_address());
    if let Some(name) = device.name() {
        println!("  name: {}", name);
    }

    match client.sync_clock(device) {
        Ok(skew) => println!("  clock skew: {}s", skew.num_seconds()),
        Err(e) => eprintln!("  clock sync failed, signing with local time: {}", e),
    }

    let host = device.source_address();
    match client.execute::<GetNetworkProtocolsOperation>(device, &GetNetworkProtocolsRequest) {
        Ok(protocols) => {
            for protocol in protocols.iter().filter(|p| p.enabled) {
                for port in &protocol.ports {
                    println!("  {} on {}", protocol.name, std::net::SocketAddr::new(host, *port));
                }
            }
        }
        Err(e) => eprintln!("  network protocols: {}", e),
    }

    let profiles = client.execute::<GetProfilesOperation>(device, &GetProfilesRequest)?;
    for profile in profiles {
        println!("  profile {} ({})", profile.name, profile.token);
        for protocol in [StreamProtocol::Udp, StreamProtocol::Rtsp] {
            let request = GetStreamUriRequest {
                profile_token: profile.token.clone(),
                protocol,
            };
            match client.execute::<GetStreamUriOperation>(device, &request) {
                Ok(uri) => println!("    {}: {}", protocol.as_str(), uri.uri),
                Err(e) => eprintln!("    {}: {}", protocol.as_str(), e),
            }
        }
    }

    Ok(())
}
