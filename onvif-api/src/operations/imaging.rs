//! Imaging service operations

use serde::Serialize;
use soap_client::{escape, Node, PathError};

use crate::operation::optional;
use crate::{ApiError, OnvifOperation, Service};

/// GetImagingSettings operation
pub struct GetImagingSettingsOperation;

#[derive(Debug, Clone)]
pub struct GetImagingSettingsRequest {
    pub video_source_token: String,
}

/// Image settings of one video source
///
/// Devices report only what they support, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImagingSettings {
    pub backlight_compensation: Option<ModeAndLevel>,
    pub brightness: Option<f64>,
    pub color_saturation: Option<f64>,
    pub contrast: Option<f64>,
    pub exposure: Option<Exposure>,
    pub focus: Option<Focus>,
    /// `ON`, `OFF` or `AUTO`
    pub ir_cut_filter: Option<String>,
    pub sharpness: Option<f64>,
    pub wide_dynamic_range: Option<ModeAndLevel>,
    pub white_balance: Option<WhiteBalance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeAndLevel {
    pub mode: String,
    pub level: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Exposure {
    pub mode: String,
    pub priority: Option<String>,
    pub min_exposure_time: Option<f64>,
    pub max_exposure_time: Option<f64>,
    pub min_gain: Option<f64>,
    pub max_gain: Option<f64>,
    pub min_iris: Option<f64>,
    pub max_iris: Option<f64>,
    pub exposure_time: Option<f64>,
    pub gain: Option<f64>,
    pub iris: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Focus {
    pub auto_focus_mode: String,
    pub default_speed: Option<f64>,
    pub near_limit: Option<f64>,
    pub far_limit: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhiteBalance {
    pub mode: String,
    pub cr_gain: Option<f64>,
    pub cb_gain: Option<f64>,
}

impl OnvifOperation for GetImagingSettingsOperation {
    type Request = GetImagingSettingsRequest;
    type Response = ImagingSettings;

    const SERVICE: Service = Service::Imaging;
    const ACTION: &'static str = "GetImagingSettings";

    fn build_payload(request: &Self::Request) -> String {
        format!(
            "<timg:VideoSourceToken>{}</timg:VideoSourceToken>",
            escape(&request.video_source_token)
        )
    }

    fn parse_response(response: &Node) -> Result<Self::Response, ApiError> {
        let settings = response
            .get("ImagingSettings")
            .ok_or_else(|| PathError::Absent("ImagingSettings".to_string()))?;

        Ok(ImagingSettings {
            backlight_compensation: mode_and_level(settings, "BacklightCompensation")?,
            brightness: optional(settings, "Brightness")?,
            color_saturation: optional(settings, "ColorSaturation")?,
            contrast: optional(settings, "Contrast")?,
            exposure: settings.get("Exposure").map(parse_exposure).transpose()?,
            focus: settings
                .get("Focus")
                .map(|focus| {
                    Ok::<_, PathError>(Focus {
                        auto_focus_mode: focus.value_at("AutoFocusMode")?.to_string(),
                        default_speed: optional(focus, "DefaultSpeed")?,
                        near_limit: optional(focus, "NearLimit")?,
                        far_limit: optional(focus, "FarLimit")?,
                    })
                })
                .transpose()?,
            ir_cut_filter: settings.text_at("IrCutFilter"),
            sharpness: optional(settings, "Sharpness")?,
            wide_dynamic_range: mode_and_level(settings, "WideDynamicRange")?,
            white_balance: settings
                .get("WhiteBalance")
                .map(|wb| {
                    Ok::<_, PathError>(WhiteBalance {
                        mode: wb.value_at("Mode")?.to_string(),
                        cr_gain: optional(wb, "CrGain")?,
                        cb_gain: optional(wb, "CbGain")?,
                    })
                })
                .transpose()?,
        })
    }
}

fn mode_and_level(node: &Node, path: &str) -> Result<Option<ModeAndLevel>, PathError> {
    node.get(path)
        .map(|inner| {
            Ok::<_, PathError>(ModeAndLevel {
                mode: inner.value_at("Mode")?.to_string(),
                level: optional(inner, "Level")?,
            })
        })
        .transpose()
}

fn parse_exposure(node: &Node) -> Result<Exposure, PathError> {
    Ok(Exposure {
        mode: node.value_at("Mode")?.to_string(),
        priority: node.text_at("Priority"),
        min_exposure_time: optional(node, "MinExposureTime")?,
        max_exposure_time: optional(node, "MaxExposureTime")?,
        min_gain: optional(node, "MinGain")?,
        max_gain: optional(node, "MaxGain")?,
        min_iris: optional(node, "MinIris")?,
        max_iris: optional(node, "MaxIris")?,
        exposure_time: optional(node, "ExposureTime")?,
        gain: optional(node, "Gain")?,
        iris: optional(node, "Iris")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use soap_client::Document;

    #[test]
    fn test_build_payload() {
        let payload = GetImagingSettingsOperation::build_payload(&GetImagingSettingsRequest {
            video_source_token: "VideoSource_1".to_string(),
        });
        assert_eq!(payload, "<timg:VideoSourceToken>VideoSource_1</timg:VideoSourceToken>");
    }

    #[test]
    fn test_full_settings() {
        let doc = Document::parse(
            br#"<timg:GetImagingSettingsResponse xmlns:timg="http://www.onvif.org/ver20/imaging/wsdl" xmlns:tt="http://www.onvif.org/ver10/schema">
                <timg:ImagingSettings>
                    <tt:BacklightCompensation><tt:Mode>OFF</tt:Mode></tt:BacklightCompensation>
                    <tt:Brightness>50</tt:Brightness>
                    <tt:ColorSaturation>50</tt:ColorSaturation>
                    <tt:Contrast>50</tt:Contrast>
                    <tt:Exposure>
                        <tt:Mode>AUTO</tt:Mode>
                        <tt:MinExposureTime>10</tt:MinExposureTime>
                        <tt:MaxExposureTime>40000</tt:MaxExposureTime>
                        <tt:Gain>0.5</tt:Gain>
                    </tt:Exposure>
                    <tt:Focus><tt:AutoFocusMode>MANUAL</tt:AutoFocusMode></tt:Focus>
                    <tt:IrCutFilter>AUTO</tt:IrCutFilter>
                    <tt:Sharpness>50</tt:Sharpness>
                    <tt:WideDynamicRange><tt:Mode>ON</tt:Mode><tt:Level>50</tt:Level></tt:WideDynamicRange>
                    <tt:WhiteBalance><tt:Mode>AUTO</tt:Mode></tt:WhiteBalance>
                </timg:ImagingSettings>
            </timg:GetImagingSettingsResponse>"#,
        )
        .unwrap();

        let settings = GetImagingSettingsOperation::parse_response(doc.root()).unwrap();
        assert_eq!(settings.brightness, Some(50.0));
        assert_eq!(settings.ir_cut_filter.as_deref(), Some("AUTO"));
        assert_eq!(
            settings.backlight_compensation,
            Some(ModeAndLevel { mode: "OFF".to_string(), level: None })
        );
        assert_eq!(
            settings.wide_dynamic_range,
            Some(ModeAndLevel { mode: "ON".to_string(), level: Some(50.0) })
        );

        let exposure = settings.exposure.unwrap();
        assert_eq!(exposure.mode, "AUTO");
        assert_eq!(exposure.max_exposure_time, Some(40000.0));
        assert_eq!(exposure.gain, Some(0.5));
        assert_eq!(exposure.iris, None);

        assert_eq!(settings.focus.map(|f| f.auto_focus_mode), Some("MANUAL".to_string()));
    }

    #[test]
    fn test_sparse_settings() {
        let doc = Document::parse(
            b"<GetImagingSettingsResponse><ImagingSettings><Brightness>12.5</Brightness></ImagingSettings></GetImagingSettingsResponse>",
        )
        .unwrap();

        let settings = GetImagingSettingsOperation::parse_response(doc.root()).unwrap();
        assert_eq!(
            settings,
            ImagingSettings {
                brightness: Some(12.5),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_malformed_level() {
        let doc = Document::parse(
            b"<GetImagingSettingsResponse><ImagingSettings><Contrast>high</Contrast></ImagingSettings></GetImagingSettingsResponse>",
        )
        .unwrap();

        let result = GetImagingSettingsOperation::parse_response(doc.root());
        assert!(matches!(result, Err(ApiError::Field(PathError::Invalid { .. }))));
    }
}
