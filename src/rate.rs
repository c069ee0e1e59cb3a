// Domestic postage rates (RateV4)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{Phase, WebtoolsError},
    operations::Api,
    xml::{child_text, normalize_scalar, XmlElement},
};

pub const DEFAULT_SERVICE: &str = "PRIORITY";
pub const DEFAULT_ZIP_ORIGINATION: &str = "55401";
pub const PACKAGE_ID: &str = "1ST";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_origination: Option<String>,
    pub zip_destination: String,
    pub pounds: u32,
    pub ounces: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub girth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machinable: Option<bool>,
}

impl RateRequest {
    pub fn new(zip_destination: impl Into<String>, pounds: u32, ounces: f64) -> Self {
        Self {
            zip_destination: zip_destination.into(),
            pounds,
            ounces,
            ..Default::default()
        }
    }
}

// Typed view of one `Postage` entry; any field the upstream left out is `None`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Postage {
    pub class_id: Option<String>,
    pub mail_service: Option<String>,
    pub rate: Option<String>,
    pub commercial_rate: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateResult {
    pub postage: Vec<Postage>,
    /// The `Postage` structure exactly as parsed.
    pub raw: Value,
}

pub fn validate_rate_request(request: &RateRequest) -> Result<(), WebtoolsError> {
    if request.zip_destination.trim().is_empty() {
        return Err(WebtoolsError::invalid_input(
            Api::RateV4,
            "zip_destination is required",
        ));
    }
    if !request.ounces.is_finite() || request.ounces < 0.0 {
        return Err(WebtoolsError::invalid_input(
            Api::RateV4,
            format!("ounces must be a non-negative number, got {}", request.ounces),
        ));
    }
    Ok(())
}

pub fn rate_request(request: &RateRequest) -> Vec<XmlElement> {
    let passthrough = |value: &Option<String>| value.clone().unwrap_or_default();

    let package = XmlElement::new("Package")
        .attr("ID", PACKAGE_ID)
        .leaf("Service", request.service.as_deref().unwrap_or(DEFAULT_SERVICE))
        .leaf(
            "ZipOrigination",
            request
                .zip_origination
                .as_deref()
                .unwrap_or(DEFAULT_ZIP_ORIGINATION),
        )
        .leaf("ZipDestination", request.zip_destination.as_str())
        .leaf("Pounds", request.pounds.to_string())
        .leaf("Ounces", request.ounces.to_string())
        .leaf("Container", passthrough(&request.container))
        .leaf("Size", passthrough(&request.size))
        .leaf("Width", passthrough(&request.width))
        .leaf("Length", passthrough(&request.length))
        .leaf("Height", passthrough(&request.height))
        .leaf("Girth", passthrough(&request.girth))
        .leaf(
            "Machinable",
            request.machinable.map(|m| m.to_string()).unwrap_or_default(),
        );

    vec![package]
}

fn map_postage(node: &Value) -> Postage {
    let text = |key: &str| child_text(node, key).filter(|value| !value.is_empty());
    Postage {
        class_id: text("@CLASSID"),
        mail_service: text("MailService"),
        rate: text("Rate"),
        commercial_rate: text("CommercialRate"),
    }
}

pub fn map_rate_result(element: &Value) -> Result<RateResult, WebtoolsError> {
    let raw = normalize_scalar(element)
        .get("Postage")
        .cloned()
        .ok_or_else(|| {
            WebtoolsError::parse(Api::RateV4, Phase::Parse, "response is missing <Postage>")
        })?;

    let postage = match &raw {
        Value::Array(entries) => entries
            .iter()
            .map(|entry| map_postage(normalize_scalar(entry)))
            .collect(),
        single => vec![map_postage(single)],
    };

    Ok(RateResult { postage, raw })
}
