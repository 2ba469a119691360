//! WSDL interface description parsing

use std::collections::{HashMap, HashSet};

use crate::api::Service;
use crate::{Result, TripolisError};

/// What the transport needs to know about one service
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceDescription {
    /// `targetNamespace` of the WSDL, used to qualify operation elements
    pub target_namespace: String,
    /// Resolved endpoint (`soap:address@location`)
    pub endpoint: String,
    /// `soapAction` per operation name
    pub soap_actions: HashMap<String, String>,
    /// Schema elements declared with `maxOccurs` > 1; these always decode to sequences
    pub array_elements: HashSet<String>,
}

impl ServiceDescription {
    /// Parse a WSDL document.
    ///
    /// Only inline schemas are scanned for repeatable elements; imported XSDs
    /// are not fetched.
    pub fn parse(service: Service, wsdl: &str) -> Result<Self> {
        let invalid = |message: String| TripolisError::transport(service.endpoint_name(), message);

        let doc = roxmltree::Document::parse(wsdl)
            .map_err(|e| invalid(format!("invalid WSDL document: {}", e)))?;
        let root = doc.root_element();
        if root.tag_name().name() != "definitions" {
            return Err(invalid(format!(
                "expected wsdl:definitions, found <{}>",
                root.tag_name().name()
            )));
        }

        let target_namespace = root
            .attribute("targetNamespace")
            .ok_or_else(|| invalid("WSDL has no targetNamespace".to_string()))?
            .to_string();

        let endpoint = doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "address")
            .find_map(|n| n.attribute("location"))
            .ok_or_else(|| invalid("WSDL declares no service address".to_string()))?
            .to_string();

        let mut soap_actions = HashMap::new();
        for node in doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "operation")
        {
            let Some(action) = node.attribute("soapAction") else {
                continue;
            };
            if let Some(name) = node.parent_element().and_then(|p| p.attribute("name")) {
                soap_actions.insert(name.to_string(), action.to_string());
            }
        }

        let array_elements = doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "element")
            .filter(|n| n.attribute("maxOccurs").is_some_and(is_repeatable))
            .filter_map(|n| n.attribute("name"))
            .map(str::to_string)
            .collect();

        Ok(Self {
            target_namespace,
            endpoint,
            soap_actions,
            array_elements,
        })
    }

    /// The `SOAPAction` for an operation; empty when the WSDL has none
    pub fn soap_action(&self, operation: &str) -> &str {
        self.soap_actions
            .get(operation)
            .map(String::as_str)
            .unwrap_or("")
    }
}

fn is_repeatable(max_occurs: &str) -> bool {
    max_occurs == "unbounded" || max_occurs.parse::<u32>().is_ok_and(|max| max > 1)
}
