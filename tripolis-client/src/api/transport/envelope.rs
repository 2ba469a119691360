//! SOAP 1.1 envelope encoding and decoding

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use roxmltree::Node;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

use crate::api::tree::{XmlElement, normalize, scalar_text};
use crate::api::Fault;
use crate::config::Credentials;

pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("failed to write SOAP envelope: {0}")]
    Write(String),
    #[error("malformed SOAP response: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("SOAP response has no Body")]
    MissingBody,
    #[error("SOAP Body is empty")]
    EmptyBody,
}

/// A decoded SOAP body
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The `{operation}Response` element
    Reply(XmlElement),
    Fault(Fault),
}

/// Namespaces and credentials shared by every envelope of one session
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeContext<'a> {
    pub target_namespace: &'a str,
    pub header_namespace: &'a str,
    pub credentials: &'a Credentials,
}

/// Encode one RPC call: the `authInfo` header plus `<ns1:{operation}>` with the
/// request tree as its content.
///
/// Sequences become repeated elements, a one-element sequence included. Null
/// values are omitted.
pub fn build_request(
    context: &EnvelopeContext<'_>,
    operation: &str,
    request: &Value,
) -> Result<String, EnvelopeError> {
    let mut writer = Writer::new(Vec::new());

    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    emit(
        &mut writer,
        Event::Start(BytesStart::new("SOAP-ENV:Envelope").with_attributes([
            ("xmlns:SOAP-ENV", SOAP_ENV_NS),
            ("xmlns:ns1", context.target_namespace),
            ("xmlns:ns2", context.header_namespace),
        ])),
    )?;

    emit(&mut writer, Event::Start(BytesStart::new("SOAP-ENV:Header")))?;
    emit(&mut writer, Event::Start(BytesStart::new("ns2:authInfo")))?;
    write_text(&mut writer, "username", &context.credentials.username)?;
    write_text(&mut writer, "password", &context.credentials.password)?;
    write_text(&mut writer, "client", &context.credentials.client)?;
    emit(&mut writer, Event::End(BytesEnd::new("ns2:authInfo")))?;
    emit(&mut writer, Event::End(BytesEnd::new("SOAP-ENV:Header")))?;

    let method = format!("ns1:{}", operation);
    emit(&mut writer, Event::Start(BytesStart::new("SOAP-ENV:Body")))?;
    emit(&mut writer, Event::Start(BytesStart::new(method.as_str())))?;
    match request {
        Value::Object(map) => {
            for (key, value) in map {
                write_field(&mut writer, key, value)?;
            }
        }
        Value::Null => {}
        other => {
            return Err(EnvelopeError::Write(format!(
                "request must be a mapping of parameter groups, got {}",
                other
            )));
        }
    }
    emit(&mut writer, Event::End(BytesEnd::new(method.as_str())))?;
    emit(&mut writer, Event::End(BytesEnd::new("SOAP-ENV:Body")))?;
    emit(&mut writer, Event::End(BytesEnd::new("SOAP-ENV:Envelope")))?;

    String::from_utf8(writer.into_inner()).map_err(|e| EnvelopeError::Write(e.to_string()))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), EnvelopeError> {
    writer
        .write_event(event)
        .map_err(|e| EnvelopeError::Write(e.to_string()))
}

fn write_text(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), EnvelopeError> {
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn write_field(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<(), EnvelopeError> {
    match value {
        Value::Null => Ok(()),
        Value::Array(items) => {
            for item in items {
                write_field(writer, name, item)?;
            }
            Ok(())
        }
        Value::Object(map) => {
            emit(writer, Event::Start(BytesStart::new(name)))?;
            for (key, child) in map {
                write_field(writer, key, child)?;
            }
            emit(writer, Event::End(BytesEnd::new(name)))
        }
        scalar => write_text(writer, name, &scalar_text(scalar).unwrap_or_default()),
    }
}

/// Decode a SOAP response document into its reply element or fault
pub fn parse_response(xml: &str, array_elements: &HashSet<String>) -> Result<Decoded, EnvelopeError> {
    let doc = roxmltree::Document::parse(xml)?;
    let body = doc
        .root_element()
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "Body")
        .ok_or(EnvelopeError::MissingBody)?;
    let first = body
        .children()
        .find(|n| n.is_element())
        .ok_or(EnvelopeError::EmptyBody)?;

    if first.tag_name().name() == "Fault" {
        return Ok(Decoded::Fault(parse_fault(first, array_elements)));
    }

    Ok(Decoded::Reply(to_element(first, array_elements)))
}

/// Decode a standalone XML fragment into an element tree
pub fn parse_element(xml: &str, array_elements: &HashSet<String>) -> Result<XmlElement, EnvelopeError> {
    let doc = roxmltree::Document::parse(xml)?;
    Ok(to_element(doc.root_element(), array_elements))
}

fn parse_fault(node: Node<'_, '_>, array_elements: &HashSet<String>) -> Fault {
    let child = |name: &str| {
        node.children()
            .find(|c| c.is_element() && c.tag_name().name() == name)
    };
    let text = |name: &str| {
        child(name)
            .and_then(|c| c.text())
            .map(|t| t.trim().to_string())
            .unwrap_or_default()
    };

    let detail = child("detail")
        .map(|d| normalize(&to_element(d, array_elements)))
        .unwrap_or(Value::Null);

    Fault::from_detail(text("faultcode"), text("faultstring"), detail)
}

fn to_element(node: Node<'_, '_>, array_elements: &HashSet<String>) -> XmlElement {
    let name = node.tag_name().name().to_string();
    let children: Vec<XmlElement> = node
        .children()
        .filter(|c| c.is_element())
        .map(|c| to_element(c, array_elements))
        .collect();

    let text = if children.is_empty() {
        Some(
            node.children()
                .filter(|c| c.is_text())
                .filter_map(|c| c.text())
                .collect::<String>(),
        )
    } else {
        None
    };

    let nil = node
        .attribute((XSI_NS, "nil"))
        .is_some_and(|v| v == "true" || v == "1");
    let type_hint = node
        .attribute((XSI_NS, "type"))
        .map(|t| t.rsplit(':').next().unwrap_or(t).to_string());

    XmlElement {
        repeated: array_elements.contains(&name),
        name,
        text,
        nil,
        type_hint,
        children,
    }
}
