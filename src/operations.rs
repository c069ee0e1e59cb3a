// Static table of the supported Webtools methods and where their results live

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Api {
    Verify,
    ZipCodeLookup,
    CityStateLookup,
    RateV4,
}

impl Api {
    pub const ALL: [Api; 4] = [
        Api::Verify,
        Api::ZipCodeLookup,
        Api::CityStateLookup,
        Api::RateV4,
    ];

    /// Value of the `API` query parameter.
    pub fn name(&self) -> &'static str {
        match self {
            Api::Verify => "Verify",
            Api::ZipCodeLookup => "ZipCodeLookup",
            Api::CityStateLookup => "CityStateLookup",
            Api::RateV4 => "RateV4",
        }
    }

    /// Stem of the request and response root element names.
    pub fn method(&self) -> &'static str {
        match self {
            Api::Verify => "AddressValidate",
            Api::ZipCodeLookup => "ZipCodeLookup",
            Api::CityStateLookup => "CityStateLookup",
            Api::RateV4 => "RateV4",
        }
    }

    pub fn result_element(&self) -> &'static str {
        match self {
            Api::Verify | Api::ZipCodeLookup => "Address",
            Api::CityStateLookup => "ZipCode",
            Api::RateV4 => "Package",
        }
    }

    pub fn request_root(&self) -> String {
        format!("{}Request", self.method())
    }

    pub fn response_root(&self) -> String {
        format!("{}Response", self.method())
    }

    pub fn default_path(&self) -> ResponsePath {
        ResponsePath::new(self.response_root(), self.result_element())
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Two-step path from the document root to the element an operation maps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePath {
    pub envelope: String,
    pub element: String,
}

impl ResponsePath {
    pub fn new(envelope: impl Into<String>, element: impl Into<String>) -> Self {
        Self {
            envelope: envelope.into(),
            element: element.into(),
        }
    }
}

impl fmt::Display for ResponsePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.envelope, self.element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_uses_address_validate_envelopes() {
        assert_eq!(Api::Verify.name(), "Verify");
        assert_eq!(Api::Verify.request_root(), "AddressValidateRequest");
        assert_eq!(
            Api::Verify.default_path().to_string(),
            "AddressValidateResponse.Address"
        );
    }

    #[test]
    fn default_paths_follow_method_names() {
        let paths: Vec<String> = Api::ALL
            .iter()
            .map(|api| api.default_path().to_string())
            .collect();

        assert_eq!(
            paths,
            vec![
                "AddressValidateResponse.Address",
                "ZipCodeLookupResponse.Address",
                "CityStateLookupResponse.ZipCode",
                "RateV4Response.Package",
            ]
        );
    }
}
