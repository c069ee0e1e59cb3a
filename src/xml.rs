// XML request writing and response reading
//
// Responses are read into a `serde_json::Value` tree: elements become objects,
// attributes become `@name` keys, leaf text becomes a string and text mixed
// with child elements lands under `#text`. Repeated children become arrays.

use std::borrow::Cow;

use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Reader, Writer,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::XmlError;

pub const TEXT_KEY: &str = "#text";
pub const ATTRIBUTE_PREFIX: char = '@';

// Element tree used to build request documents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn text(mut self, value: impl Into<String>) -> Self {
        self.text = Some(value.into());
        self
    }

    pub fn child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn extend(mut self, children: impl IntoIterator<Item = XmlElement>) -> Self {
        self.children.extend(children);
        self
    }

    /// Appends `<name>value</name>`.
    pub fn leaf(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.child(XmlElement::new(name).text(value))
    }

    /// Appends `<name>value</name>` only when a value is present.
    pub fn optional_leaf(self, name: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.leaf(name, value),
            None => self,
        }
    }

    pub fn to_document(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))
            .map_err(|e| XmlError::Write(e.to_string()))?;
        self.write_into(&mut writer)?;

        String::from_utf8(writer.into_inner()).map_err(|e| XmlError::Write(e.to_string()))
    }

    fn write_into(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), XmlError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        let text = self.text.as_deref().unwrap_or_default();
        if text.is_empty() && self.children.is_empty() {
            return writer
                .write_event(Event::Empty(start))
                .map_err(|e| XmlError::Write(e.to_string()));
        }

        writer
            .write_event(Event::Start(start))
            .map_err(|e| XmlError::Write(e.to_string()))?;
        if !text.is_empty() {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| XmlError::Write(e.to_string()))?;
        }
        for child in &self.children {
            child.write_into(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(|e| XmlError::Write(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Wrap every child element in an array, even when it occurs once.
    pub explicit_array: bool,
}

struct Frame {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart) -> Result<Self, XmlError> {
        let mut fields = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| XmlError::Malformed(e.to_string()))?;
            let key = format!(
                "{ATTRIBUTE_PREFIX}{}",
                String::from_utf8_lossy(attr.key.as_ref())
            );
            let value = attr
                .unescape_value()
                .map_err(|e| XmlError::Malformed(e.to_string()))?;
            fields.insert(key, Value::String(value.into_owned()));
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            fields,
            text: String::new(),
        })
    }

    fn into_value(self) -> (String, Value) {
        if self.fields.is_empty() {
            return (self.name, Value::String(self.text));
        }

        let mut fields = self.fields;
        if !self.text.is_empty() {
            fields.insert(TEXT_KEY.to_string(), Value::String(self.text));
        }
        (self.name, Value::Object(fields))
    }
}

fn insert_child(fields: &mut Map<String, Value>, name: String, value: Value, explicit_array: bool) {
    match fields.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None if explicit_array => {
            fields.insert(name, Value::Array(vec![value]));
        }
        None => {
            fields.insert(name, value);
        }
    }
}

/// Reads a response body into a value tree keyed by the root element name.
///
/// Both parser shapes yield the same tree: with `explicit_array` the
/// single-element lists are collapsed again once the document is read.
pub fn parse_document(body: &[u8], options: &ParseOptions) -> Result<Value, XmlError> {
    let mut reader = Reader::from_reader(body);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        let closed = match reader.read_event_into(&mut buf) {
            Err(e) => {
                return Err(XmlError::Malformed(format!(
                    "at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            Ok(Event::Start(e)) => {
                stack.push(Frame::open(&e)?);
                None
            }
            Ok(Event::Empty(e)) => Some(Frame::open(&e)?),
            Ok(Event::End(_)) => stack.pop(),
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| XmlError::Malformed(e.to_string()))?;
                append_text(&mut stack, text)?;
                None
            }
            Ok(Event::CData(e)) => {
                let raw = e.into_inner();
                append_text(&mut stack, String::from_utf8_lossy(&raw))?;
                None
            }
            Ok(Event::Eof) => break,
            Ok(_) => None,
        };

        if let Some(frame) = closed {
            let (name, value) = frame.into_value();
            match stack.last_mut() {
                Some(parent) => insert_child(&mut parent.fields, name, value, options.explicit_array),
                None if root.is_some() => {
                    return Err(XmlError::Malformed(format!(
                        "unexpected second root element <{name}>"
                    )))
                }
                None => {
                    let mut document = Map::new();
                    document.insert(name, value);
                    root = Some(Value::Object(document));
                }
            }
        }

        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Malformed(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }

    let root = root.ok_or(XmlError::Empty)?;
    Ok(if options.explicit_array {
        collapse_single_lists(root)
    } else {
        root
    })
}

/// Recursively replaces every one-element array with its element.
pub fn collapse_single_lists(value: Value) -> Value {
    match value {
        Value::Array(mut items) if items.len() == 1 => collapse_single_lists(items.remove(0)),
        Value::Array(items) => Value::Array(items.into_iter().map(collapse_single_lists).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, value)| (key, collapse_single_lists(value)))
                .collect(),
        ),
        other => other,
    }
}

fn append_text(stack: &mut [Frame], text: Cow<'_, str>) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(frame) => {
            frame.text.push_str(&text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(XmlError::Malformed(format!(
            "text outside of the root element: {:?}",
            text.chars().take(40).collect::<String>()
        ))),
    }
}

/// Collapses single-element list wrapping: a non-empty array yields its first
/// element, anything else is returned as is.
pub fn normalize_scalar(value: &Value) -> &Value {
    let mut current = value;
    while let Value::Array(items) = current {
        match items.first() {
            Some(first) => current = first,
            None => break,
        }
    }
    current
}

pub fn child<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    normalize_scalar(node).get(key).map(normalize_scalar)
}

pub fn scalar_text(value: &Value) -> Option<String> {
    match normalize_scalar(value) {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(fields) => fields
            .get(TEXT_KEY)
            .and_then(Value::as_str)
            .map(str::to_owned),
        _ => None,
    }
}

pub fn child_text(node: &Value, key: &str) -> Option<String> {
    child(node, key).and_then(scalar_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CITY_STATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CityStateLookupResponse><ZipCode ID="0"><Zip5>98031</Zip5><City>KENT</City><State>WA</State></ZipCode></CityStateLookupResponse>"#;

    #[test]
    fn builds_document_with_attribute_and_empty_leaves() {
        let doc = XmlElement::new("CityStateLookupRequest")
            .attr("USERID", "ABC&1")
            .child(XmlElement::new("ZipCode").attr("ID", "0").leaf("Zip5", "98031"))
            .leaf("Zip4", "")
            .to_document()
            .unwrap();

        assert_eq!(
            doc,
            r#"<?xml version="1.0"?><CityStateLookupRequest USERID="ABC&amp;1"><ZipCode ID="0"><Zip5>98031</Zip5></ZipCode><Zip4/></CityStateLookupRequest>"#
        );
    }

    #[test]
    fn optional_leaf_is_skipped_when_absent() {
        let element = XmlElement::new("Address")
            .optional_leaf("Urbanization", None)
            .optional_leaf("City", Some("Kent"));

        let names: Vec<&str> = element.children().iter().map(XmlElement::name).collect();
        assert_eq!(names, vec!["City"]);
    }

    #[test]
    fn text_is_escaped() {
        let doc = XmlElement::new("Address2")
            .text("A & B <C>")
            .to_document()
            .unwrap();
        assert!(doc.ends_with("<Address2>A &amp; B &lt;C&gt;</Address2>"));
    }

    #[test]
    fn parses_scalar_shape() {
        let value = parse_document(CITY_STATE.as_bytes(), &ParseOptions::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "CityStateLookupResponse": {
                    "ZipCode": {
                        "@ID": "0",
                        "Zip5": "98031",
                        "City": "KENT",
                        "State": "WA"
                    }
                }
            })
        );
    }

    #[test]
    fn explicit_array_shape_matches_scalar_shape() {
        let options = ParseOptions {
            explicit_array: true,
        };
        let xml = r#"<RateV4Response><Package ID="1ST"><Postage CLASSID="1"><Rate>1.00</Rate></Postage><Postage CLASSID="3"><Rate>2.00</Rate></Postage></Package></RateV4Response>"#;

        for body in [CITY_STATE, xml] {
            assert_eq!(
                parse_document(body.as_bytes(), &options).unwrap(),
                parse_document(body.as_bytes(), &ParseOptions::default()).unwrap()
            );
        }
    }

    #[test]
    fn collapse_single_lists_keeps_repeated_entries() {
        let wrapped = json!({
            "Package": [{
                "Zone": ["6"],
                "Postage": [{ "Rate": ["1.00"] }, { "Rate": ["2.00"] }]
            }]
        });
        assert_eq!(
            collapse_single_lists(wrapped),
            json!({
                "Package": {
                    "Zone": "6",
                    "Postage": [{ "Rate": "1.00" }, { "Rate": "2.00" }]
                }
            })
        );
    }

    #[test]
    fn repeated_children_become_arrays() {
        let xml = "<R><P><Rate>1.00</Rate></P><P><Rate>2.00</Rate></P></R>";
        let value = parse_document(xml.as_bytes(), &ParseOptions::default()).unwrap();
        assert_eq!(value["R"]["P"], json!([{ "Rate": "1.00" }, { "Rate": "2.00" }]));
    }

    #[test]
    fn mixed_text_goes_under_text_key() {
        let xml = r#"<Postage CLASSID="1">7.35</Postage>"#;
        let value = parse_document(xml.as_bytes(), &ParseOptions::default()).unwrap();
        assert_eq!(value["Postage"]["#text"], "7.35");
        assert_eq!(scalar_text(&value["Postage"]).as_deref(), Some("7.35"));
    }

    #[test]
    fn empty_element_is_empty_string() {
        let value = parse_document(b"<A><Zip4/></A>", &ParseOptions::default()).unwrap();
        assert_eq!(child_text(&value["A"], "Zip4").as_deref(), Some(""));
    }

    #[test]
    fn rejects_non_xml_bodies() {
        let err = parse_document(b"Service Unavailable", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, XmlError::Malformed(_)));

        let err = parse_document(b"", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, XmlError::Empty));
    }

    #[test]
    fn rejects_truncated_and_mismatched_documents() {
        let truncated = parse_document(b"<A><B>1</B>", &ParseOptions::default());
        assert!(matches!(truncated, Err(XmlError::Malformed(_))));

        let mismatched = parse_document(b"<A><B>1</C></A>", &ParseOptions::default());
        assert!(matches!(mismatched, Err(XmlError::Malformed(_))));
    }

    #[test]
    fn normalize_scalar_unwraps_nested_lists() {
        let nested = json!([["KENT"], ["SEATTLE"]]);
        assert_eq!(normalize_scalar(&nested), &json!("KENT"));

        let empty = json!([]);
        assert_eq!(normalize_scalar(&empty), &json!([]));

        let scalar = json!("WA");
        assert_eq!(normalize_scalar(&scalar), &scalar);
    }
}
