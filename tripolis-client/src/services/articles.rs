//! Articles and article tags

use log::{debug, info};
use serde_json::{Map, Value, json};

use super::images::ImageService;
use super::{collection, missing, present, reply_id, soften};
use crate::api::conflict::truncate;
use crate::api::tree::scalar_text;
use crate::api::{FaultMode, Operation, Reply, TripolisClient};
use crate::Result;

/// Article field holding an image id, resolved to a public URL on read
pub const DEFAULT_IMAGE_FIELD: &str = "afbeelding";

/// Content of an article to create
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleDraft {
    pub article_type_id: String,
    pub label: String,
    pub name: String,
    pub tag_ids: Vec<String>,
    /// Field name and value pairs, sent in this order
    pub fields: Vec<(String, String)>,
}

impl ArticleDraft {
    pub fn new(
        article_type_id: impl Into<String>,
        label: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            article_type_id: article_type_id.into(),
            label: label.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag_id: impl Into<String>) -> Self {
        self.tag_ids.push(tag_id.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    fn to_request(&self, max_length: usize) -> Value {
        let values: Vec<Value> = self
            .fields
            .iter()
            .map(|(key, value)| json!({"key": key, "value": value}))
            .collect();

        json!({
            "createRequest": {
                "articleTypeId": self.article_type_id,
                "label": truncate(&self.label, max_length),
                "name": truncate(&self.name, max_length),
                "articleTagIds": {"articleTagId": self.tag_ids},
                "articleFieldValues": {"articleFieldValue": values},
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct ArticleService {
    client: TripolisClient,
    workspace_id: Option<String>,
    images: Option<ImageService>,
    image_field: String,
}

impl ArticleService {
    pub fn new(client: TripolisClient) -> Self {
        Self {
            client,
            workspace_id: None,
            images: None,
            image_field: DEFAULT_IMAGE_FIELD.to_string(),
        }
    }

    /// Workspace new tags are created in
    pub fn with_workspace_id(mut self, id: impl Into<String>) -> Self {
        self.workspace_id = Some(id.into());
        self
    }

    /// Resolve image fields through `images`
    pub fn with_images(mut self, images: ImageService) -> Self {
        self.images = Some(images);
        self
    }

    pub fn with_image_field(mut self, field: impl Into<String>) -> Self {
        self.image_field = field.into();
        self
    }

    /// An article as a `{field name -> value}` mapping.
    ///
    /// The image field holds the image's public URL when an image service is
    /// attached.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Map<String, Value>>> {
        let Some(id) = present(Some(id)) else {
            return missing(self.client.service(), "getById");
        };

        let request = json!({"getByIdRequest": {"id": id}});
        let Some(mut result) = soften(
            self.client.service(),
            "getById",
            self.client.call(Operation::GetById, &request).await,
        )?
        else {
            return Ok(None);
        };

        let Some(article) = result.get_mut("article") else {
            return Ok(None);
        };
        let fields = collection(article, "articleFields", "articleField");

        let mut flattened = Map::new();
        for field in fields {
            let Some(name) = field.get("name").and_then(scalar_text) else {
                continue;
            };
            let value = field.get("value").cloned().unwrap_or(Value::Null);

            if name == self.image_field {
                if let Some(images) = &self.images {
                    let url = match scalar_text(&value) {
                        Some(image_id) => images.get_public_url(&image_id).await?,
                        None => None,
                    };
                    flattened.insert(name, url.map(Value::String).unwrap_or(Value::Null));
                    continue;
                }
            }
            flattened.insert(name, value);
        }
        Ok(Some(flattened))
    }

    /// Articles of a newsletter, across all pages
    pub async fn get_by_newsletter_id(&self, newsletter_id: &str) -> Result<Option<Vec<Value>>> {
        let Some(id) = present(Some(newsletter_id)) else {
            return missing(self.client.service(), "getByNewsletterId");
        };

        let request = json!({"getByNewsletterIdRequest": {"newsletterId": id}});
        let result = soften(
            self.client.service(),
            "getByNewsletterId",
            self.client.paged_call(Operation::GetByNewsletterId, request).await,
        )?;
        Ok(result.map(|mut result| collection(&mut result, "articles", "article")))
    }

    /// Create an article and return its id.
    ///
    /// Label and name are cut to the maximum length. With
    /// `auto_increment_label` a taken label or name is renamed with a counter
    /// suffix until the service accepts it.
    pub async fn create(&self, draft: &ArticleDraft, auto_increment_label: bool) -> Result<Option<String>> {
        let request = draft.to_request(self.client.max_label_length());

        let result = if auto_increment_label {
            self.client
                .create_with_retry(Operation::Create, request)
                .await?
        } else {
            self.client.call(Operation::Create, &request).await?
        };

        let id = reply_id(&result);
        if let Some(id) = &id {
            info!("Created article {} ({})", id, draft.label);
        }
        Ok(id)
    }

    /// Create a tag in the workspace, or find the existing tag of that name.
    ///
    /// Tags are lowercased. Returns the tag id either way.
    pub async fn create_tag(&self, tag: &str) -> Result<Option<String>> {
        let Some(workspace_id) = present(self.workspace_id.as_deref()) else {
            return missing(self.client.service(), "createTag");
        };

        let request = json!({
            "createTagRequest": {
                "workspaceId": workspace_id,
                "tag": tag.to_lowercase(),
            }
        });

        match self
            .client
            .call_with(Operation::CreateTag, &request, FaultMode::Return)
            .await?
        {
            Reply::Payload(result) => {
                let id = reply_id(&result);
                debug!("tag ID: {:?}", id);
                Ok(id)
            }
            Reply::Fault(fault) => {
                debug!("faulty tag {:?}: {}", tag, fault);
                Ok(fault.identifier_id.filter(|id| !id.is_empty()))
            }
        }
    }
}
