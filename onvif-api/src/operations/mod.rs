//! ONVIF operations grouped by service

pub mod device;
pub mod imaging;
pub mod media;

pub use device::{
    clock_skew_from_device, DateTimeType, DeviceInformation, GetDeviceInformationOperation,
    GetDeviceInformationRequest, GetDiscoveryModeOperation, GetDiscoveryModeRequest,
    GetHostnameOperation, GetHostnameRequest, GetNetworkProtocolsOperation,
    GetNetworkProtocolsRequest, GetNtpOperation, GetNtpRequest, GetScopesOperation,
    GetScopesRequest, GetServicesOperation, GetServicesRequest, GetSystemDateAndTimeOperation,
    GetSystemDateAndTimeRequest, HostnameInformation, NetworkHost, NetworkProtocol,
    NtpInformation, Scope, ServiceEntry, SetHostnameOperation, SetHostnameRequest,
    SetNtpOperation, SetNtpRequest, SetScopesOperation, SetScopesRequest,
    SetSystemDateAndTimeOperation, SetSystemDateAndTimeRequest, SystemDateAndTime,
};
pub use imaging::{
    Exposure, Focus, GetImagingSettingsOperation, GetImagingSettingsRequest, ImagingSettings,
    ModeAndLevel, WhiteBalance,
};
pub use media::{
    AudioEncoderConfig, AudioSourceConfig, Bounds, GetOsdsOperation, GetOsdsRequest,
    GetProfilesOperation, GetProfilesRequest, GetSnapshotUriOperation, GetSnapshotUriRequest,
    GetStreamUriOperation, GetStreamUriRequest, MediaProfile, MediaUri, Osd, OsdPosition, OsdText,
    PtzConfig, RateControl, Resolution, SetOsdOperation, SetOsdRequest, StreamProtocol,
    VideoEncoderConfig, VideoSourceConfig,
};
