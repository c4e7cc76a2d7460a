//! Camera discovery that outputs JSON for scripting
//!
//! Usage: cargo run -p onvif-sdk-discovery --example discover_json [seconds]

use onvif_discovery::discover_all;
use std::time::Duration;

fn main() {
    let timeout = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);

    match discover_all(Duration::from_secs(timeout)) {
        Ok(devices) => println!("{}", serde_json::to_string_pretty(&devices).unwrap()),
        Err(e) => {
            eprintln!("discovery failed: {}", e);
            std::process::exit(1);
        }
    }
}
