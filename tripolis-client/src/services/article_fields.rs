//! Fields defined on an article type

use serde_json::{Value, json};

use super::{collection, missing, present, soften};
use crate::api::{Operation, TripolisClient};
use crate::Result;

#[derive(Debug, Clone)]
pub struct ArticleFieldService {
    client: TripolisClient,
}

impl ArticleFieldService {
    pub fn new(client: TripolisClient) -> Self {
        Self { client }
    }

    /// All fields of an article type, across all pages
    pub async fn get_by_article_type_id(&self, article_type_id: &str) -> Result<Option<Vec<Value>>> {
        let Some(id) = present(Some(article_type_id)) else {
            return missing(self.client.service(), "getByArticleTypeId");
        };

        let request = json!({"getByArticleTypeIdRequest": {"articleTypeId": id}});
        let result = soften(
            self.client.service(),
            "getByArticleTypeId",
            self.client.paged_call(Operation::GetByArticleTypeId, request).await,
        )?;
        Ok(result.map(|mut result| collection(&mut result, "articleFields", "articleField")))
    }
}
