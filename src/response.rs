// Navigation of parsed Webtools responses and classification of the errors
// they report

use serde_json::Value;
use tracing::warn;

use crate::{
    error::{Phase, WebtoolsError},
    operations::{Api, ResponsePath},
    xml::{child, child_text, normalize_scalar},
};

pub const ERROR_ELEMENT: &str = "Error";
pub const DESCRIPTION_ELEMENT: &str = "Description";

fn non_empty_trimmed(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Message for an upstream `Error` fragment: its trimmed `Description` when
/// that is non-empty text, otherwise the whole fragment stringified.
pub fn error_message(fragment: &Value) -> String {
    let fragment = normalize_scalar(fragment);
    child_text(fragment, DESCRIPTION_ELEMENT)
        .and_then(|description| non_empty_trimmed(&description))
        .or_else(|| fragment.as_str().and_then(non_empty_trimmed))
        .unwrap_or_else(|| fragment.to_string())
}

pub fn classify_error(api: Api, fragment: &Value) -> WebtoolsError {
    let message = error_message(fragment);
    warn!(api = %api, %message, "webtools reported an error");
    WebtoolsError::upstream(api, message, normalize_scalar(fragment).clone())
}

fn check_error(api: Api, node: &Value) -> Result<(), WebtoolsError> {
    match child(node, ERROR_ELEMENT) {
        Some(fragment) => Err(classify_error(api, fragment)),
        None => Ok(()),
    }
}

/// Walks `document` down `path`, surfacing upstream errors found at the
/// document root or inside the result element.
pub fn extract<'a>(
    api: Api,
    path: &ResponsePath,
    document: &'a Value,
) -> Result<&'a Value, WebtoolsError> {
    check_error(api, document)?;

    let envelope = child(document, &path.envelope).ok_or_else(|| {
        WebtoolsError::parse(
            api,
            Phase::Parse,
            format!("response has no <{}> element", path.envelope),
        )
    })?;

    let element = child(envelope, &path.element).ok_or_else(|| {
        WebtoolsError::parse(
            api,
            Phase::Parse,
            format!("response has no {path} element"),
        )
    })?;

    check_error(api, element)?;
    Ok(element)
}

pub(crate) fn required_text(api: Api, node: &Value, key: &str) -> Result<String, WebtoolsError> {
    child_text(node, key).ok_or_else(|| {
        WebtoolsError::parse(api, Phase::Parse, format!("response is missing <{key}>"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{parse_document, ParseOptions};
    use serde_json::json;

    const TOP_LEVEL_ERROR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Number>80040B1A</Number><Description>Authorization failure.  Perhaps username and/or password is incorrect. </Description><Source>USPSCOM::DoAuth</Source></Error>"#;

    const NESTED_ERROR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ZipCodeLookupResponse><Address ID="0"><Error><Number>-2147219401</Number><Source>clsAMS</Source><Description>Address Not Found.  </Description><HelpFile/><HelpContext/></Error></Address></ZipCodeLookupResponse>"#;

    fn parse(xml: &str, explicit_array: bool) -> Value {
        parse_document(xml.as_bytes(), &ParseOptions { explicit_array }).unwrap()
    }

    #[test]
    fn top_level_error_is_upstream() {
        for explicit_array in [false, true] {
            let document = parse(TOP_LEVEL_ERROR, explicit_array);
            let err = extract(Api::Verify, &Api::Verify.default_path(), &document).unwrap_err();

            assert!(err.is_upstream());
            assert_eq!(
                err.message(),
                "Authorization failure.  Perhaps username and/or password is incorrect."
            );
            assert_eq!(
                child_text(err.payload().unwrap(), "Number").as_deref(),
                Some("80040B1A")
            );
        }
    }

    #[test]
    fn nested_error_is_upstream() {
        for explicit_array in [false, true] {
            let document = parse(NESTED_ERROR, explicit_array);
            let path = Api::ZipCodeLookup.default_path();
            let err = extract(Api::ZipCodeLookup, &path, &document).unwrap_err();

            assert_eq!(err.to_string(), "Address Not Found.");
            assert_eq!(err.context().api, Api::ZipCodeLookup);
        }
    }

    #[test]
    fn error_without_description_falls_back_to_fragment() {
        let fragment = json!({ "Number": "-1", "Source": "clsAMS" });
        assert_eq!(
            error_message(&fragment),
            r#"{"Number":"-1","Source":"clsAMS"}"#
        );

        let text_only = json!("Invalid Zip Code.");
        assert_eq!(error_message(&text_only), "Invalid Zip Code.");

        let blank_description = json!({ "Description": "   " });
        assert_eq!(error_message(&blank_description), r#"{"Description":"   "}"#);
    }

    #[test]
    fn missing_path_segments_are_parse_errors() {
        let document = parse("<SomethingElseResponse/>", false);
        let err = extract(Api::RateV4, &Api::RateV4.default_path(), &document).unwrap_err();
        assert!(matches!(err, WebtoolsError::Parse { .. }));
        assert_eq!(err.message(), "response has no <RateV4Response> element");

        let document = parse("<RateV4Response><Other/></RateV4Response>", false);
        let err = extract(Api::RateV4, &Api::RateV4.default_path(), &document).unwrap_err();
        assert_eq!(err.message(), "response has no RateV4Response.Package element");
    }

    #[test]
    fn custom_path_is_followed() {
        let document = parse(
            "<CityStateLookupResponse><Zip><City>KENT</City></Zip></CityStateLookupResponse>",
            false,
        );
        let path = ResponsePath::new("CityStateLookupResponse", "Zip");
        let element = extract(Api::CityStateLookup, &path, &document).unwrap();
        assert_eq!(child_text(element, "City").as_deref(), Some("KENT"));
    }
}
