//! Image library: public URLs and uploads

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, info};
use serde_json::json;
use std::path::Path;
use uuid::Uuid;

use super::{missing, present, reply_id, soften};
use crate::api::conflict::truncate;
use crate::api::tree::scalar_text;
use crate::api::{Operation, TripolisClient};
use crate::{Result, TripolisError};

/// Image formats the service accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Jpeg,
    Png,
    Gif,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Gif => "GIF",
        }
    }

    /// Detect the type from a file extension, case-insensitive. `jpg` is JPEG.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_uppercase();
        match extension.as_str() {
            "JPG" | "JPEG" => Some(Self::Jpeg),
            "PNG" => Some(Self::Png),
            "GIF" => Some(Self::Gif),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageService {
    client: TripolisClient,
    workspace_id: Option<String>,
}

impl ImageService {
    pub fn new(client: TripolisClient, workspace_id: Option<String>) -> Self {
        Self {
            client,
            workspace_id,
        }
    }

    /// Public URL of an image, without fetching its content
    pub async fn get_public_url(&self, id: &str) -> Result<Option<String>> {
        let Some(id) = present(Some(id)) else {
            return missing(self.client.service(), "getById");
        };

        let request = json!({"getByIdRequest": {"id": id, "includeContent": "0"}});
        let result = soften(
            self.client.service(),
            "getById",
            self.client.call(Operation::GetById, &request).await,
        )?;

        Ok(result.and_then(|result| {
            result
                .pointer("/image/publicUrl")
                .and_then(scalar_text)
                .filter(|url| !url.is_empty())
        }))
    }

    /// Upload the file at `path` into the workspace and return the new image id.
    ///
    /// The label defaults to the file name; the image gets a fresh unique name.
    pub async fn create(&self, path: impl AsRef<Path>, label: Option<&str>) -> Result<Option<String>> {
        let path = path.as_ref();
        let Some(workspace_id) = present(self.workspace_id.as_deref()) else {
            return missing(self.client.service(), "create");
        };

        let image_type = ImageType::from_path(path).ok_or_else(|| {
            TripolisError::InvalidRequest(format!(
                "{} is not a JPEG, PNG or GIF image",
                path.display()
            ))
        })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let label = present(label).map(str::to_string).unwrap_or(file_name);

        let content = tokio::fs::read(path).await?;
        debug!("Read {} bytes from {}", content.len(), path.display());

        let max = self.client.max_label_length();
        let name = Uuid::new_v4().simple().to_string();
        let request = json!({
            "createRequest": {
                "workspaceId": workspace_id,
                "label": truncate(&label, max),
                "name": truncate(&name, max),
                "imageType": image_type.as_str(),
                "content": STANDARD.encode(&content),
            }
        });

        let result = soften(
            self.client.service(),
            "create",
            self.client.call(Operation::Create, &request).await,
        )?;
        let id = result.as_ref().and_then(reply_id);
        if let Some(id) = &id {
            info!("Uploaded image {} as {}", path.display(), id);
        }
        Ok(id)
    }
}
