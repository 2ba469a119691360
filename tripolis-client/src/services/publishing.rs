//! Publishing jobs

use serde_json::{Value, json};

use super::{collection, missing, present, soften};
use crate::api::{Operation, TripolisClient};
use crate::Result;

/// Job status listed when none is given
pub const DEFAULT_JOB_STATUS: &str = "ENDED";

#[derive(Debug, Clone)]
pub struct PublishingService {
    client: TripolisClient,
}

impl PublishingService {
    pub fn new(client: TripolisClient) -> Self {
        Self { client }
    }

    /// Publishing jobs of a workspace with the given status, across all pages
    pub async fn get_by_workspace_id(
        &self,
        workspace_id: &str,
        status: Option<&str>,
    ) -> Result<Option<Vec<Value>>> {
        let Some(id) = present(Some(workspace_id)) else {
            return missing(self.client.service(), "getByWorkspaceId");
        };

        let request = json!({
            "jobsByWorkspaceIdRequest": {
                "workspaceId": id,
                "status": status.unwrap_or(DEFAULT_JOB_STATUS),
            }
        });
        let result = soften(
            self.client.service(),
            "getByWorkspaceId",
            self.client.paged_call(Operation::GetByWorkspaceId, request).await,
        )?;
        Ok(result.map(|mut result| collection(&mut result, "jobs", "job")))
    }
}
