//! Contacts: create, delete, search and group subscriptions

use log::info;
use serde::Serialize;
use serde_json::{Map, Value, json};

use super::contact_databases::ContactDatabaseService;
use super::{collection, missing, present, reply_id, soften};
use crate::api::tree::scalar_text;
use crate::api::{Operation, TripolisClient};
use crate::Result;

/// One contact field value, addressed by field name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactField {
    pub name: String,
    pub value: String,
}

impl ContactField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Comparison used by a contact field search parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchOperator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
}

impl SearchOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "EQUALS",
            Self::NotEquals => "NOT_EQUALS",
            Self::Contains => "CONTAINS",
            Self::NotContains => "NOT_CONTAINS",
            Self::StartsWith => "STARTS_WITH",
            Self::EndsWith => "ENDS_WITH",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContactService {
    client: TripolisClient,
    contact_database_id: Option<String>,
}

impl ContactService {
    pub fn new(client: TripolisClient, contact_database_id: Option<String>) -> Self {
        Self {
            client,
            contact_database_id,
        }
    }

    fn database_id(&self) -> Option<&str> {
        present(self.contact_database_id.as_deref())
    }

    /// Create a contact in the contact database and return its id
    pub async fn create(&self, fields: &[ContactField]) -> Result<Option<String>> {
        let Some(database_id) = self.database_id() else {
            return missing(self.client.service(), "create");
        };

        let request = json!({
            "createRequest": {
                "contactDatabaseId": database_id,
                "contactFields": {"contactField": fields},
            }
        });
        let result = soften(
            self.client.service(),
            "create",
            self.client.call(Operation::Create, &request).await,
        )?;

        let id = result.as_ref().and_then(reply_id);
        if let Some(id) = &id {
            info!("Created contact {} in {}", id, database_id);
        }
        Ok(id)
    }

    /// Delete a contact, returning the id the service confirmed
    pub async fn delete(&self, id: &str) -> Result<Option<String>> {
        if self.database_id().is_none() {
            return missing(self.client.service(), "delete");
        }

        let request = json!({"deleteRequest": {"id": id}});
        let result = soften(
            self.client.service(),
            "delete",
            self.client.call(Operation::Delete, &request).await,
        )?;
        Ok(result.as_ref().and_then(reply_id))
    }

    /// Search the contact database with raw search parameters, across all
    /// pages. `contactDatabaseId` is added in front of `params`.
    pub async fn search(&self, params: Map<String, Value>) -> Result<Option<Value>> {
        let Some(database_id) = self.database_id() else {
            return missing(self.client.service(), "search");
        };

        let mut group = Map::new();
        group.insert("contactDatabaseId".to_string(), json!(database_id));
        for (key, value) in params {
            group.insert(key, value);
        }

        let request = json!({"searchRequest": group});
        soften(
            self.client.service(),
            "search",
            self.client.paged_call(Operation::Search, request).await,
        )
    }

    /// Contacts whose default field (usually the email address) matches
    /// `value`. `databases` supplies the default field of the database.
    pub async fn search_by_default_contact_field(
        &self,
        databases: &ContactDatabaseService,
        value: &str,
        operator: SearchOperator,
    ) -> Result<Option<Vec<Value>>> {
        let Some(database_id) = self.database_id() else {
            return missing(self.client.service(), "search");
        };
        let Some(database) = databases.get_by_id(Some(database_id)).await? else {
            return Ok(None);
        };
        let Some(field_id) = database
            .pointer("/defaultContactDatabaseField/id")
            .and_then(scalar_text)
        else {
            return missing(self.client.service(), "search");
        };

        let mut params = Map::new();
        params.insert(
            "contactFieldSearchParameters".to_string(),
            json!({
                "contactFieldSearchParameter": {
                    "contactDatabaseFieldId": field_id,
                    "operator": operator.as_str(),
                    "value": value,
                }
            }),
        );
        params.insert(
            "returnContactFields".to_string(),
            json!({"returnAllContactFields": 1}),
        );

        let Some(mut result) = self.search(params).await? else {
            return Ok(None);
        };
        let contacts = collection(&mut result, "contacts", "contact");
        Ok((!contacts.is_empty()).then_some(contacts))
    }

    /// Subscribe a contact to contact groups
    pub async fn add_to_contact_group(
        &self,
        contact_id: &str,
        groups: &[&str],
        confirmed: bool,
        reference: Option<&str>,
    ) -> Result<Option<Value>> {
        if self.database_id().is_none() {
            return missing(self.client.service(), "addToContactGroup");
        }

        let subscriptions: Vec<Value> = groups
            .iter()
            .map(|group| json!({"contactGroupId": group, "confirmed": confirmed}))
            .collect();
        let request = json!({
            "addToContactGroupRequest": {
                "contactId": contact_id,
                "contactGroupSubscriptions": {"contactGroupSubscription": subscriptions},
                "reference": reference,
            }
        });
        soften(
            self.client.service(),
            "addToContactGroup",
            self.client.call(Operation::AddToContactGroup, &request).await,
        )
    }
}
