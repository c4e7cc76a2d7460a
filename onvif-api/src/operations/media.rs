//! Media service operations

use serde::Serialize;
use soap_client::{escape, Node, PathError};

use crate::operation::{optional, optional_bool};
use crate::{ApiError, OnvifOperation, Service};

/// GetProfiles operation
pub struct GetProfilesOperation;

#[derive(Debug, Clone, Default)]
pub struct GetProfilesRequest;

/// A media profile and the configurations bound to it
///
/// Configuration blocks a profile does not carry are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaProfile {
    pub token: String,
    pub name: String,
    pub fixed: bool,
    pub video_source: Option<VideoSourceConfig>,
    pub video_encoder: Option<VideoEncoderConfig>,
    pub audio_source: Option<AudioSourceConfig>,
    pub audio_encoder: Option<AudioEncoderConfig>,
    pub ptz: Option<PtzConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoSourceConfig {
    pub token: String,
    pub name: String,
    pub source_token: String,
    pub bounds: Option<Bounds>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoEncoderConfig {
    pub token: String,
    pub name: String,
    /// `JPEG`, `MPEG4` or `H264`
    pub encoding: String,
    pub resolution: Option<Resolution>,
    pub quality: Option<f32>,
    pub rate_control: Option<RateControl>,
    /// xs:duration, e.g. `PT60S`
    pub session_timeout: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateControl {
    pub frame_rate_limit: u32,
    pub encoding_interval: u32,
    pub bitrate_limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioSourceConfig {
    pub token: String,
    pub name: String,
    pub source_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioEncoderConfig {
    pub token: String,
    pub name: String,
    pub encoding: String,
    pub bitrate: Option<u32>,
    pub sample_rate: Option<u32>,
    pub session_timeout: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PtzConfig {
    pub token: String,
    pub name: String,
    pub node_token: String,
}

impl OnvifOperation for GetProfilesOperation {
    type Request = GetProfilesRequest;
    type Response = Vec<MediaProfile>;

    const SERVICE: Service = Service::Media;
    const ACTION: &'static str = "GetProfiles";

    fn build_payload(_request: &Self::Request) -> String {
        String::new()
    }

    fn parse_response(response: &Node) -> Result<Self::Response, ApiError> {
        response
            .all_at("Profiles")
            .into_iter()
            .map(parse_profile)
            .collect()
    }
}

fn parse_profile(profile: &Node) -> Result<MediaProfile, ApiError> {
    Ok(MediaProfile {
        token: profile.value_at("@token")?.to_string(),
        name: profile.value_at("Name")?.to_string(),
        fixed: profile
            .attribute("fixed")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false),
        video_source: profile
            .get("VideoSourceConfiguration")
            .map(parse_video_source)
            .transpose()?,
        video_encoder: profile
            .get("VideoEncoderConfiguration")
            .map(parse_video_encoder)
            .transpose()?,
        audio_source: profile
            .get("AudioSourceConfiguration")
            .map(|node| {
                Ok::<_, PathError>(AudioSourceConfig {
                    token: node.value_at("@token")?.to_string(),
                    name: node.text_at("Name").unwrap_or_default(),
                    source_token: node.value_at("SourceToken")?.to_string(),
                })
            })
            .transpose()?,
        audio_encoder: profile
            .get("AudioEncoderConfiguration")
            .map(|node| {
                Ok::<_, PathError>(AudioEncoderConfig {
                    token: node.value_at("@token")?.to_string(),
                    name: node.text_at("Name").unwrap_or_default(),
                    encoding: node.value_at("Encoding")?.to_string(),
                    bitrate: optional(node, "Bitrate")?,
                    sample_rate: optional(node, "SampleRate")?,
                    session_timeout: node.text_at("SessionTimeout"),
                })
            })
            .transpose()?,
        ptz: profile
            .get("PTZConfiguration")
            .map(|node| {
                Ok::<_, PathError>(PtzConfig {
                    token: node.value_at("@token")?.to_string(),
                    name: node.text_at("Name").unwrap_or_default(),
                    node_token: node.value_at("NodeToken")?.to_string(),
                })
            })
            .transpose()?,
    })
}

fn parse_video_source(node: &Node) -> Result<VideoSourceConfig, PathError> {
    let bounds = match node.get("Bounds") {
        Some(bounds) => Some(Bounds {
            x: bounds.parse_at("@x")?,
            y: bounds.parse_at("@y")?,
            width: bounds.parse_at("@width")?,
            height: bounds.parse_at("@height")?,
        }),
        None => None,
    };

    Ok(VideoSourceConfig {
        token: node.value_at("@token")?.to_string(),
        name: node.text_at("Name").unwrap_or_default(),
        source_token: node.value_at("SourceToken")?.to_string(),
        bounds,
    })
}

fn parse_video_encoder(node: &Node) -> Result<VideoEncoderConfig, PathError> {
    let resolution = match node.get("Resolution") {
        Some(res) => Some(Resolution {
            width: res.parse_at("Width")?,
            height: res.parse_at("Height")?,
        }),
        None => None,
    };
    let rate_control = match node.get("RateControl") {
        Some(rate) => Some(RateControl {
            frame_rate_limit: rate.parse_at("FrameRateLimit")?,
            encoding_interval: rate.parse_at("EncodingInterval")?,
            bitrate_limit: rate.parse_at("BitrateLimit")?,
        }),
        None => None,
    };

    Ok(VideoEncoderConfig {
        token: node.value_at("@token")?.to_string(),
        name: node.text_at("Name").unwrap_or_default(),
        encoding: node.value_at("Encoding")?.to_string(),
        resolution,
        quality: optional(node, "Quality")?,
        rate_control,
        session_timeout: node.text_at("SessionTimeout"),
    })
}

/// Transport protocol requested for a stream URI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StreamProtocol {
    Udp,
    Http,
    Rtsp,
}

impl StreamProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamProtocol::Udp => "UDP",
            StreamProtocol::Http => "HTTP",
            StreamProtocol::Rtsp => "RTSP",
        }
    }
}

impl std::str::FromStr for StreamProtocol {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UDP" => Ok(StreamProtocol::Udp),
            "HTTP" => Ok(StreamProtocol::Http),
            "RTSP" => Ok(StreamProtocol::Rtsp),
            _ => Err(ApiError::InvalidParameter(format!("unknown stream protocol: {}", s))),
        }
    }
}

/// A URI handed out by the media service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaUri {
    pub uri: String,
    /// xs:duration the URI stays valid for
    pub timeout: Option<String>,
    pub invalid_after_connect: bool,
    pub invalid_after_reboot: bool,
}

impl MediaUri {
    fn from_response(response: &Node) -> Result<Self, ApiError> {
        let media_uri = response
            .get("MediaUri")
            .ok_or_else(|| PathError::Absent("MediaUri".to_string()))?;

        Ok(MediaUri {
            uri: media_uri.value_at("Uri")?.to_string(),
            timeout: media_uri.text_at("Timeout"),
            invalid_after_connect: optional_bool(media_uri, "InvalidAfterConnect")?.unwrap_or(false),
            invalid_after_reboot: optional_bool(media_uri, "InvalidAfterReboot")?.unwrap_or(false),
        })
    }
}

/// GetStreamUri operation
///
/// Always requests an `RTP-Unicast` stream.
pub struct GetStreamUriOperation;

#[derive(Debug, Clone)]
pub struct GetStreamUriRequest {
    pub profile_token: String,
    pub protocol: StreamProtocol,
}

impl OnvifOperation for GetStreamUriOperation {
    type Request = GetStreamUriRequest;
    type Response = MediaUri;

    const SERVICE: Service = Service::Media;
    const ACTION: &'static str = "GetStreamUri";

    fn build_payload(request: &Self::Request) -> String {
        format!(
            "<trt:StreamSetup>\
                <tt:Stream>RTP-Unicast</tt:Stream>\
                <tt:Transport><tt:Protocol>{}</tt:Protocol></tt:Transport>\
            </trt:StreamSetup>\
            <trt:ProfileToken>{}</trt:ProfileToken>",
            request.protocol.as_str(),
            escape(&request.profile_token)
        )
    }

    fn parse_response(response: &Node) -> Result<Self::Response, ApiError> {
        MediaUri::from_response(response)
    }
}

/// GetSnapshotUri operation
pub struct GetSnapshotUriOperation;

#[derive(Debug, Clone)]
pub struct GetSnapshotUriRequest {
    pub profile_token: String,
}

impl OnvifOperation for GetSnapshotUriOperation {
    type Request = GetSnapshotUriRequest;
    type Response = MediaUri;

    const SERVICE: Service = Service::Media;
    const ACTION: &'static str = "GetSnapshotUri";

    fn build_payload(request: &Self::Request) -> String {
        format!(
            "<trt:ProfileToken>{}</trt:ProfileToken>",
            escape(&request.profile_token)
        )
    }

    fn parse_response(response: &Node) -> Result<Self::Response, ApiError> {
        MediaUri::from_response(response)
    }
}

/// An on-screen display configured on a video source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Osd {
    pub token: String,
    pub video_source_configuration_token: String,
    /// `Text` or `Image`
    pub kind: String,
    pub position: Option<OsdPosition>,
    pub text: Option<OsdText>,
}

/// Where an OSD sits; `x`/`y` are only meaningful for `Custom`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OsdPosition {
    /// `UpperLeft`, `UpperRight`, `LowerLeft`, `LowerRight` or `Custom`
    pub kind: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OsdText {
    /// `Plain`, `Date`, `Time` or `DateAndTime`
    pub kind: String,
    pub is_persistent_text: Option<bool>,
    pub date_format: Option<String>,
    pub time_format: Option<String>,
    pub font_size: Option<u32>,
    pub plain_text: Option<String>,
}

/// GetOSDs operation
pub struct GetOsdsOperation;

#[derive(Debug, Clone, Default)]
pub struct GetOsdsRequest {
    /// Limit the answer to one video source configuration
    pub configuration_token: Option<String>,
}

impl OnvifOperation for GetOsdsOperation {
    type Request = GetOsdsRequest;
    type Response = Vec<Osd>;

    const SERVICE: Service = Service::Media;
    const ACTION: &'static str = "GetOSDs";

    fn build_payload(request: &Self::Request) -> String {
        request
            .configuration_token
            .as_deref()
            .map(|token| format!("<trt:ConfigurationToken>{}</trt:ConfigurationToken>", escape(token)))
            .unwrap_or_default()
    }

    fn parse_response(response: &Node) -> Result<Self::Response, ApiError> {
        response
            .all_at("OSDs")
            .into_iter()
            .map(parse_osd)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ApiError::from)
    }
}

fn parse_osd(node: &Node) -> Result<Osd, PathError> {
    Ok(Osd {
        token: node.value_at("@token")?.to_string(),
        video_source_configuration_token: node
            .value_at("VideoSourceConfigurationToken")?
            .to_string(),
        kind: node.value_at("Type")?.to_string(),
        position: node
            .get("Position")
            .map(|position| {
                Ok::<_, PathError>(OsdPosition {
                    kind: position.value_at("Type")?.to_string(),
                    x: optional(position, "Pos@x")?,
                    y: optional(position, "Pos@y")?,
                })
            })
            .transpose()?,
        text: node
            .get("TextString")
            .map(|text| {
                Ok::<_, PathError>(OsdText {
                    kind: text.value_at("Type")?.to_string(),
                    is_persistent_text: optional_bool(text, "IsPersistentText")?,
                    date_format: text.text_at("DateFormat"),
                    time_format: text.text_at("TimeFormat"),
                    font_size: optional(text, "FontSize")?,
                    plain_text: text.text_at("PlainText"),
                })
            })
            .transpose()?,
    })
}

const DEFAULT_FONT_SIZE: u32 = 32;

/// SetOSD operation
///
/// Rewrites an existing OSD as plain text.
pub struct SetOsdOperation;

#[derive(Debug, Clone)]
pub struct SetOsdRequest {
    token: String,
    video_source_configuration_token: String,
    text: String,
    font_size: u32,
    position: Option<(f64, f64)>,
}

impl SetOsdRequest {
    pub fn text(
        token: impl Into<String>,
        video_source_configuration_token: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            video_source_configuration_token: video_source_configuration_token.into(),
            text: text.into(),
            font_size: DEFAULT_FONT_SIZE,
            position: None,
        }
    }

    /// Place the text at normalized coordinates in `[-1, 1]`
    pub fn at(mut self, x: f64, y: f64) -> Result<Self, ApiError> {
        if !(-1.0..=1.0).contains(&x) || !(-1.0..=1.0).contains(&y) {
            return Err(ApiError::InvalidParameter(format!(
                "OSD position ({}, {}) is outside [-1, 1]",
                x, y
            )));
        }
        self.position = Some((x, y));
        Ok(self)
    }

    pub fn with_font_size(mut self, font_size: u32) -> Self {
        self.font_size = font_size;
        self
    }
}

impl OnvifOperation for SetOsdOperation {
    type Request = SetOsdRequest;
    type Response = ();

    const SERVICE: Service = Service::Media;
    const ACTION: &'static str = "SetOSD";

    fn build_payload(request: &Self::Request) -> String {
        let position = match request.position {
            Some((x, y)) => format!(
                r#"<tt:Position><tt:Type>Custom</tt:Type><tt:Pos x="{}" y="{}"/></tt:Position>"#,
                x, y
            ),
            None => "<tt:Position><tt:Type>UpperLeft</tt:Type></tt:Position>".to_string(),
        };
        format!(
            r#"<trt:OSD token="{}"><tt:VideoSourceConfigurationToken>{}</tt:VideoSourceConfigurationToken><tt:Type>Text</tt:Type>{}<tt:TextString><tt:Type>Plain</tt:Type><tt:FontSize>{}</tt:FontSize><tt:PlainText>{}</tt:PlainText></tt:TextString></trt:OSD>"#,
            escape(&request.token),
            escape(&request.video_source_configuration_token),
            position,
            request.font_size,
            escape(&request.text)
        )
    }

    fn parse_response(_response: &Node) -> Result<Self::Response, ApiError> {
        Ok(())
    }
}
