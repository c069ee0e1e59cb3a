// Address verification and zip code lookup
//
// Webtools names the secondary line (apartment, suite) `Address1` and the
// primary street `Address2`. Requests swap the caller's lines into that order
// and results swap them back, so `street1` is the primary street on both
// sides.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::WebtoolsError,
    operations::Api,
    response::required_text,
    xml::{child_text, XmlElement},
};

pub const VERIFY_REVISION: &str = "1";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInput {
    pub street1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street2: Option<String>,
    pub city: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firm_name: Option<String>,
    // Puerto Rico only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urbanization: Option<String>,
}

impl AddressInput {
    pub fn new(
        street1: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            street1: street1.into(),
            city: city.into(),
            state: state.into(),
            ..Default::default()
        }
    }

    pub fn with_street2(mut self, street2: impl Into<String>) -> Self {
        self.street2 = Some(street2.into());
        self
    }

    pub fn with_zip(mut self, zip: impl Into<String>) -> Self {
        self.zip = Some(zip.into());
        self
    }

    pub fn with_zip4(mut self, zip4: impl Into<String>) -> Self {
        self.zip4 = Some(zip4.into());
        self
    }

    pub fn with_firm_name(mut self, firm_name: impl Into<String>) -> Self {
        self.firm_name = Some(firm_name.into());
        self
    }

    pub fn with_urbanization(mut self, urbanization: impl Into<String>) -> Self {
        self.urbanization = Some(urbanization.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressResult {
    pub street1: String,
    pub street2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub zip4: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firm_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2_abbreviation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_abbreviation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urbanization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_point: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footnotes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpv_confirmation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpv_cmra: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpv_false: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpv_footnotes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub central_delivery_point: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacant: Option<String>,
}

type OptionalSlot = fn(&mut AddressResult) -> &mut Option<String>;

// Upstream element name -> result field, copied only when present and non-empty
pub const OPTIONAL_ADDRESS_FIELDS: &[(&str, OptionalSlot)] = &[
    ("FirmName", |r| &mut r.firm_name),
    ("Address2Abbreviation", |r| &mut r.address2_abbreviation),
    ("CityAbbreviation", |r| &mut r.city_abbreviation),
    ("Urbanization", |r| &mut r.urbanization),
    ("DeliveryPoint", |r| &mut r.delivery_point),
    ("CarrierRoute", |r| &mut r.carrier_route),
    ("Footnotes", |r| &mut r.footnotes),
    ("DPVConfirmation", |r| &mut r.dpv_confirmation),
    ("DPVCMRA", |r| &mut r.dpv_cmra),
    ("DPVFalse", |r| &mut r.dpv_false),
    ("DPVFootnotes", |r| &mut r.dpv_footnotes),
    ("Business", |r| &mut r.business),
    ("CentralDeliveryPoint", |r| &mut r.central_delivery_point),
    ("Vacant", |r| &mut r.vacant),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZipCodeResult {
    pub street1: String,
    pub street2: String,
    pub city: String,
    pub state: String,
    /// `NNNNN-NNNN`, or just the 5-digit zip when no extension came back.
    pub zip: String,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn require(api: Api, field: &str, value: &str) -> Result<(), WebtoolsError> {
    if value.trim().is_empty() {
        return Err(WebtoolsError::invalid_input(api, format!("{field} is required")));
    }
    Ok(())
}

pub fn validate_verify_input(address: &AddressInput) -> Result<(), WebtoolsError> {
    require(Api::Verify, "street1", &address.street1)?;
    require(Api::Verify, "city", &address.city)?;
    require(Api::Verify, "state", &address.state)?;
    if !present(&address.zip) {
        return Err(WebtoolsError::invalid_input(Api::Verify, "zip is required"));
    }
    Ok(())
}

pub fn validate_zip_lookup_input(address: &AddressInput) -> Result<(), WebtoolsError> {
    require(Api::ZipCodeLookup, "street1", &address.street1)?;
    require(Api::ZipCodeLookup, "city", &address.city)?;
    require(Api::ZipCodeLookup, "state", &address.state)
}

fn swapped_lines(address: &AddressInput) -> [XmlElement; 2] {
    [
        XmlElement::new("Address1").text(address.street2.as_deref().unwrap_or_default()),
        XmlElement::new("Address2").text(address.street1.as_str()),
    ]
}

pub fn verify_request(address: &AddressInput) -> Vec<XmlElement> {
    let body = XmlElement::new("Address")
        .attr("ID", "0")
        .leaf("FirmName", address.firm_name.as_deref().unwrap_or_default())
        .extend(swapped_lines(address))
        .leaf("City", address.city.as_str())
        .leaf("State", address.state.as_str())
        .leaf("Zip5", address.zip.as_deref().unwrap_or_default())
        .leaf("Zip4", address.zip4.as_deref().unwrap_or_default())
        .optional_leaf(
            "Urbanization",
            address
                .urbanization
                .as_deref()
                .filter(|_| present(&address.urbanization)),
        );

    vec![XmlElement::new("Revision").text(VERIFY_REVISION), body]
}

pub fn zip_lookup_request(address: &AddressInput) -> Vec<XmlElement> {
    let body = XmlElement::new("Address")
        .attr("ID", "0")
        .extend(swapped_lines(address))
        .leaf("City", address.city.as_str())
        .leaf("State", address.state.as_str());

    vec![body]
}

pub fn map_verify_result(element: &Value) -> Result<AddressResult, WebtoolsError> {
    let api = Api::Verify;
    let mut result = AddressResult {
        street1: required_text(api, element, "Address2")?,
        street2: child_text(element, "Address1").unwrap_or_default(),
        city: required_text(api, element, "City")?,
        state: required_text(api, element, "State")?,
        zip: required_text(api, element, "Zip5")?,
        zip4: child_text(element, "Zip4").unwrap_or_default(),
        ..Default::default()
    };

    for (source, slot) in OPTIONAL_ADDRESS_FIELDS {
        if let Some(value) = child_text(element, source).filter(|v| !v.is_empty()) {
            *slot(&mut result) = Some(value);
        }
    }

    Ok(result)
}

pub fn map_zip_lookup_result(element: &Value) -> Result<ZipCodeResult, WebtoolsError> {
    let api = Api::ZipCodeLookup;
    let zip5 = required_text(api, element, "Zip5")?;
    let zip = match child_text(element, "Zip4").filter(|z| !z.is_empty()) {
        Some(zip4) => format!("{zip5}-{zip4}"),
        None => zip5,
    };

    Ok(ZipCodeResult {
        street1: required_text(api, element, "Address2")?,
        street2: child_text(element, "Address1").unwrap_or_default(),
        city: required_text(api, element, "City")?,
        state: required_text(api, element, "State")?,
        zip,
    })
}
