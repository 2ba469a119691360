//! Contact groups of a contact database

use serde_json::{Value, json};

use super::{collection, missing, present, soften};
use crate::api::{Operation, TripolisClient};
use crate::Result;

#[derive(Debug, Clone)]
pub struct ContactGroupService {
    client: TripolisClient,
    contact_database_id: Option<String>,
}

impl ContactGroupService {
    pub fn new(client: TripolisClient, contact_database_id: Option<String>) -> Self {
        Self {
            client,
            contact_database_id,
        }
    }

    /// Groups in the contact database, optionally of one group type
    /// (e.g. `STATIC`); all types when `None`
    pub async fn get_by_contact_database_id(&self, group_type: Option<&str>) -> Result<Option<Vec<Value>>> {
        let Some(database_id) = present(self.contact_database_id.as_deref()) else {
            return missing(self.client.service(), "getByContactDatabaseId");
        };

        let request = json!({
            "getByContactDatabaseIdRequest": {
                "contactDatabaseId": database_id,
                "groupType": group_type.unwrap_or_default(),
            }
        });
        let result = soften(
            self.client.service(),
            "getByContactDatabaseId",
            self.client
                .paged_call(Operation::GetByContactDatabaseId, request)
                .await,
        )?;
        Ok(result.map(|mut result| collection(&mut result, "contactGroups", "contactGroup")))
    }
}
