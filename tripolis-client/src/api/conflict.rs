//! Conflict-retry engine
//!
//! Creates an entity and, while the service reports that its label or name is
//! taken, renames it deterministically and submits again.

use log::{debug, info};
use serde_json::{Map, Value};

use super::client::TripolisClient;
use super::tree::parameter_group_mut;
use super::{FaultMode, Operation, Reply};
use crate::{Result, TripolisError};

/// A request field the service enforces uniqueness on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameField {
    /// Display label, renamed as `"Summer Sale (2)"`
    Label,
    /// Machine name, renamed as `"summer_sale_2"`
    Name,
}

pub const DEFAULT_NAME_FIELDS: &[NameField] = &[NameField::Label, NameField::Name];

impl NameField {
    /// Request key, which is also the `identifierName` the service reports
    pub fn key(&self) -> &'static str {
        match self {
            NameField::Label => "label",
            NameField::Name => "name",
        }
    }

    pub fn suffix(&self, attempt: u32) -> String {
        match self {
            NameField::Label => format!(" ({})", attempt),
            NameField::Name => format!("_{}", attempt),
        }
    }

    /// Renamed value for `attempt`, never longer than `max_length` characters
    pub fn candidate(&self, original: &str, attempt: u32, max_length: usize) -> String {
        let suffix = self.suffix(attempt);
        let room = max_length.saturating_sub(suffix.chars().count());
        format!("{}{}", truncate(original, room), suffix)
    }
}

/// First `max_chars` characters of `value`
pub fn truncate(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((index, _)) => &value[..index],
        None => value,
    }
}

impl TripolisClient {
    /// Run a create and rename `label`/`name` until the service accepts it
    pub async fn create_with_retry(&self, operation: Operation, request: Value) -> Result<Value> {
        self.create_with_retry_using(operation, request, DEFAULT_NAME_FIELDS)
            .await
    }

    /// Run a create, renaming the tracked `fields` while the service reports
    /// one of them as already taken.
    ///
    /// Tracked fields are truncated to the configured maximum length before
    /// the first submission. On every conflict all tracked fields are rebuilt
    /// from their original values with the attempt counter as suffix. A fault
    /// about anything else is returned as [`TripolisError::RemoteFault`]; more
    /// than `max_retries` renames give [`TripolisError::RetryExhausted`].
    pub async fn create_with_retry_using(
        &self,
        operation: Operation,
        mut request: Value,
        fields: &[NameField],
    ) -> Result<Value> {
        let max_length = self.conflict.max_label_length;
        let max_retries = self.conflict.max_retries;

        let group = parameter_group_mut(&mut request).ok_or_else(|| {
            TripolisError::InvalidRequest(
                "create request needs a named parameter group as its first key".to_string(),
            )
        })?;
        let originals = tracked_values(group, fields);
        for (field, original) in &originals {
            group.insert(
                field.key().to_string(),
                Value::String(truncate(original, max_length).to_string()),
            );
        }

        let mut attempt: u32 = 0;
        loop {
            let fault = match self.call_with(operation, &request, FaultMode::Return).await? {
                Reply::Payload(value) => return Ok(value),
                Reply::Fault(fault) => fault,
            };

            let conflicting = originals
                .iter()
                .any(|(field, _)| fault.is_duplicate_of(field.key()));
            if !conflicting {
                return Err(self.surface_fault(operation, fault));
            }

            if attempt >= max_retries {
                return Err(TripolisError::RetryExhausted {
                    attempts: attempt,
                    fault,
                });
            }
            attempt += 1;

            if let Some(group) = parameter_group_mut(&mut request) {
                for (field, original) in &originals {
                    let renamed = field.candidate(original, attempt, max_length);
                    debug!("{} taken, trying {} {:?}", fault, field.key(), renamed);
                    group.insert(field.key().to_string(), Value::String(renamed));
                }
            }
            info!(
                "{}.{}: identifier already exists, retrying with suffix {}",
                self.service(),
                operation,
                attempt
            );
        }
    }
}

fn tracked_values(group: &Map<String, Value>, fields: &[NameField]) -> Vec<(NameField, String)> {
    fields
        .iter()
        .filter_map(|field| match group.get(field.key()) {
            Some(Value::String(s)) => Some((*field, s.clone())),
            Some(Value::Number(n)) => Some((*field, n.to_string())),
            _ => None,
        })
        .collect()
}
