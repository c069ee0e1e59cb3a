// City/state lookup by 5-digit zip

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::WebtoolsError,
    operations::Api,
    response::required_text,
    xml::XmlElement,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityStateResult {
    pub city: String,
    pub state: String,
    pub zip: String,
}

// Only emptiness is checked here; malformed zips are left for the service to reject
pub fn validate_zip(zip: &str) -> Result<(), WebtoolsError> {
    if zip.trim().is_empty() {
        return Err(WebtoolsError::invalid_input(
            Api::CityStateLookup,
            "zip is required",
        ));
    }
    Ok(())
}

pub fn city_state_request(zip: &str) -> Vec<XmlElement> {
    vec![XmlElement::new("ZipCode")
        .attr("ID", "0")
        .leaf("Zip5", zip.trim())]
}

pub fn map_city_state_result(element: &Value) -> Result<CityStateResult, WebtoolsError> {
    let api = Api::CityStateLookup;
    Ok(CityStateResult {
        city: required_text(api, element, "City")?,
        state: required_text(api, element, "State")?,
        zip: required_text(api, element, "Zip5")?,
    })
}
