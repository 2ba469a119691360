//! Article types of a workspace

use serde_json::{Value, json};

use super::{collection, missing, present, soften};
use crate::api::{Operation, TripolisClient};
use crate::Result;

#[derive(Debug, Clone)]
pub struct ArticleTypeService {
    client: TripolisClient,
}

impl ArticleTypeService {
    pub fn new(client: TripolisClient) -> Self {
        Self { client }
    }

    /// Article types of a workspace, optionally with their field definitions
    pub async fn get_by_workspace_id(
        &self,
        workspace_id: &str,
        return_article_fields: bool,
    ) -> Result<Option<Vec<Value>>> {
        let Some(id) = present(Some(workspace_id)) else {
            return missing(self.client.service(), "getByWorkspaceId");
        };

        let request = json!({
            "getByWorkspaceIdRequest": {
                "workspaceId": id,
                "returnArticleFields": return_article_fields,
            }
        });
        let result = soften(
            self.client.service(),
            "getByWorkspaceId",
            self.client.paged_call(Operation::GetByWorkspaceId, request).await,
        )?;
        Ok(result.map(|mut result| collection(&mut result, "articleTypes", "articleType")))
    }
}
