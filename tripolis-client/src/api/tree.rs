//! Request/response trees
//!
//! Requests and responses are `serde_json::Value` trees (mapping, sequence or
//! scalar). Raw SOAP replies arrive as [`XmlElement`] trees and are turned into
//! the canonical shape by [`normalize`], so callers never see encoding quirks
//! such as "one child element vs. many".

use serde_json::{Map, Number, Value};

/// Key under which Tripolis wraps the real payload of most replies
pub const RESPONSE_KEY: &str = "response";

/// Owned XML element as decoded from a SOAP body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    /// Local name (namespace prefix stripped)
    pub name: String,
    /// Text content for leaf elements
    pub text: Option<String>,
    /// `xsi:nil="true"`
    pub nil: bool,
    /// Local part of `xsi:type`, e.g. `int` for `xsd:int`
    pub type_hint: Option<String>,
    /// The schema declares this element as repeatable, so it must stay a
    /// sequence even when only one instance is present
    pub repeated: bool,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// First child element with the given local name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Convert the contents of an element into a canonical tree.
///
/// Children sharing a name, or declared repeatable, become a sequence. Leaves
/// become scalars, typed when the element carries an `xsi:type` hint.
pub fn normalize(element: &XmlElement) -> Value {
    if element.nil {
        return Value::Null;
    }

    if element.children.is_empty() {
        return scalar(
            element.text.as_deref().unwrap_or(""),
            element.type_hint.as_deref(),
        );
    }

    // Group by name, keeping first-occurrence order
    let mut groups: Vec<(&str, Vec<&XmlElement>)> = Vec::new();
    for child in &element.children {
        match groups.iter_mut().find(|(name, _)| *name == child.name) {
            Some((_, members)) => members.push(child),
            None => groups.push((child.name.as_str(), vec![child])),
        }
    }

    let mut map = Map::new();
    for (name, members) in groups {
        let value = if members.len() > 1 || members[0].repeated {
            Value::Array(members.into_iter().map(normalize).collect())
        } else {
            normalize(members[0])
        };
        map.insert(name.to_string(), value);
    }

    Value::Object(map)
}

fn scalar(text: &str, type_hint: Option<&str>) -> Value {
    match type_hint {
        Some("int" | "integer" | "long" | "short" | "byte") => text
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(text.to_string())),
        Some("decimal" | "double" | "float") => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.to_string())),
        Some("boolean") => match text.trim() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => Value::String(text.to_string()),
        },
        _ => Value::String(text.to_string()),
    }
}

/// Unwrap a normalized reply exactly once.
///
/// A mapping with a `response` key holding a mapping or sequence yields that
/// inner value. An empty or nil `response` yields an empty mapping. Anything else is
/// returned as is, except a bare scalar root, which is kept under `response`
/// so the caller always receives a mapping or a sequence.
pub fn unwrap_response(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            let wrapped = match map.get(RESPONSE_KEY) {
                Some(Value::Object(_) | Value::Array(_) | Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                _ => false,
            };
            if !wrapped {
                return Value::Object(map);
            }
            match map.remove(RESPONSE_KEY) {
                Some(inner @ (Value::Object(_) | Value::Array(_))) => inner,
                _ => Value::Object(Map::new()),
            }
        }
        Value::Array(items) => Value::Array(items),
        Value::Null => Value::Object(Map::new()),
        Value::String(s) if s.is_empty() => Value::Object(Map::new()),
        scalar => {
            let mut map = Map::new();
            map.insert(RESPONSE_KEY.to_string(), scalar);
            Value::Object(map)
        }
    }
}

/// Recursive union of `incoming` into `target`.
///
/// Colliding sequences concatenate (target first), colliding mappings are
/// merged key by key, any other collision is won by `incoming`. A single
/// mapping colliding with a sequence is folded into the sequence.
pub fn merge_union(target: &mut Value, incoming: Value) {
    match target {
        Value::Object(existing) => match incoming {
            Value::Object(incoming) => {
                for (key, value) in incoming {
                    match existing.get_mut(&key) {
                        Some(slot) => merge_union(slot, value),
                        None => {
                            existing.insert(key, value);
                        }
                    }
                }
            }
            Value::Array(items) if !existing.is_empty() => {
                let previous = Value::Object(std::mem::take(existing));
                let mut merged = Vec::with_capacity(items.len() + 1);
                merged.push(previous);
                merged.extend(items);
                *target = Value::Array(merged);
            }
            other => *target = other,
        },
        Value::Array(existing) => match incoming {
            Value::Array(items) => existing.extend(items),
            Value::Object(single) => existing.push(Value::Object(single)),
            other => *target = other,
        },
        _ => *target = incoming,
    }
}

/// The request's sole named parameter group (its first top-level key).
///
/// A null group is replaced by an empty mapping so paging fields can be added.
pub fn parameter_group_mut(request: &mut Value) -> Option<&mut Map<String, Value>> {
    let (_, group) = request.as_object_mut()?.iter_mut().next()?;
    if group.is_null() {
        *group = Value::Object(Map::new());
    }
    group.as_object_mut()
}

/// Treat a value as a list: sequences as is, a single mapping as a list of
/// one, null as empty.
pub fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    }
}

/// Read a scalar as a string, whatever its encoded type
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
