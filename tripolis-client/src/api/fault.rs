//! Application-level faults reported by the Tripolis service

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error code Tripolis uses when a unique identifier (label, name, tag) is taken
pub const DUPLICATE_IDENTIFIER: u32 = 401;

/// A SOAP fault, reduced to the fields Tripolis puts in
/// `detail.errorResponse.errors.error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fault {
    /// SOAP `faultcode`, e.g. `soap:Server`
    pub fault_code: String,
    /// SOAP `faultstring`
    pub fault_string: String,
    /// Tripolis `errorCode`
    pub code: Option<u32>,
    /// Tripolis error message, falls back to the fault string
    pub message: String,
    /// Name of the field that conflicted (e.g. "label")
    pub identifier_name: Option<String>,
    /// ID of the pre-existing entity the request collided with
    pub identifier_id: Option<String>,
    /// Normalized `detail` element, kept for callers that need more than the first error
    pub detail: Value,
}

impl Fault {
    /// Build a fault with only a code and message
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            fault_code: "soap:Server".to_string(),
            fault_string: message.clone(),
            code: Some(code),
            message,
            identifier_name: None,
            identifier_id: None,
            detail: Value::Null,
        }
    }

    /// Attach the conflicting identifier
    pub fn with_identifier(mut self, name: impl Into<String>, id: Option<String>) -> Self {
        self.identifier_name = Some(name.into());
        self.identifier_id = id;
        self
    }

    /// Build a fault from the SOAP fault fields and the normalized `detail` tree.
    ///
    /// When `errors.error` holds several entries the first one is used.
    pub fn from_detail(fault_code: String, fault_string: String, detail: Value) -> Self {
        let error = detail
            .pointer("/errorResponse/errors/error")
            .map(|error| match error {
                Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
                other => other.clone(),
            })
            .unwrap_or(Value::Null);

        let text = |key: &str| -> Option<String> {
            match error.get(key)? {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        };

        let code = text("errorCode").and_then(|c| c.trim().parse::<u32>().ok());
        let message = text("message").unwrap_or_else(|| fault_string.clone());

        Self {
            identifier_name: text("identifierName"),
            identifier_id: text("identifierId"),
            fault_code,
            fault_string,
            code,
            message,
            detail,
        }
    }

    /// True when the service refused a create because `field` is already taken
    pub fn is_duplicate_of(&self, field: &str) -> bool {
        self.code == Some(DUPLICATE_IDENTIFIER)
            && self.identifier_name.as_deref() == Some(field)
            && self.message == format!("{} already exists", field)
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "code {} -- {}", code, self.message)?,
            None => write!(f, "{} -- {}", self.fault_code, self.message)?,
        }
        if let Some(name) = &self.identifier_name {
            write!(f, " ({})", name)?;
        }
        Ok(())
    }
}
