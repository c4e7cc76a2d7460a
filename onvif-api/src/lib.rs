//! High-level ONVIF API for IP camera control
//!
//! This crate provides a type-safe, trait-based API over the ONVIF device,
//! media and imaging services. Devices come from `onvif-discovery`; requests
//! go through the `soap-client` transport, which signs them with WS-Security
//! and answers HTTP Basic or Digest challenges.
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use onvif_api::operations::media::{GetProfilesOperation, GetProfilesRequest};
//! use onvif_api::OnvifClient;
//! use soap_client::Credentials;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OnvifClient::new();
//!
//! for mut device in onvif_discovery::discover_all(Duration::from_secs(3))? {
//!     device.set_credentials(Credentials::new("admin", "secret"));
//!     client.sync_clock(&mut device)?;
//!
//!     let profiles = client.execute::<GetProfilesOperation>(&device, &GetProfilesRequest)?;
//!     println!("{}: {} profiles", device.id(), profiles.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod logging;
pub mod operation;
pub mod operations;
pub mod service;

pub use client::OnvifClient;
pub use error::{ApiError, Result};
pub use operation::OnvifOperation;
pub use service::{Service, ServiceInfo, SCHEMA_NAMESPACE};

pub use onvif_discovery::Device;
pub use soap_client::{Credentials, TransportConfig};
