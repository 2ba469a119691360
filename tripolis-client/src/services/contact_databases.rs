//! Contact databases

use serde_json::{Value, json};

use super::{collection, missing, present, soften};
use crate::api::{Operation, TripolisClient};
use crate::Result;

#[derive(Debug, Clone)]
pub struct ContactDatabaseService {
    client: TripolisClient,
    contact_database_id: Option<String>,
}

impl ContactDatabaseService {
    /// `contact_database_id` is used when [`get_by_id`](Self::get_by_id) is
    /// called without one
    pub fn new(client: TripolisClient, contact_database_id: Option<String>) -> Self {
        Self {
            client,
            contact_database_id,
        }
    }

    pub fn contact_database_id(&self) -> Option<&str> {
        self.contact_database_id.as_deref()
    }

    /// A contact database, including its `defaultContactDatabaseField`
    pub async fn get_by_id(&self, id: Option<&str>) -> Result<Option<Value>> {
        let Some(id) = present(id).or(present(self.contact_database_id.as_deref())) else {
            return missing(self.client.service(), "getById");
        };

        let request = json!({"getByIdRequest": {"id": id}});
        let result = soften(
            self.client.service(),
            "getById",
            self.client.call(Operation::GetById, &request).await,
        )?;
        Ok(result.and_then(|mut result| result.get_mut("contactDatabase").map(Value::take)))
    }

    /// Every contact database of the account, one entry or many
    pub async fn get_all(&self) -> Result<Option<Vec<Value>>> {
        let request = json!({"getAllRequest": {}});
        let result = soften(
            self.client.service(),
            "getAll",
            self.client.paged_call(Operation::GetAll, request).await,
        )?;
        Ok(result.map(|mut result| collection(&mut result, "contactDatabases", "contactDatabase")))
    }
}
