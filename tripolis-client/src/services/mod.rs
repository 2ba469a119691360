// Entity adapters
//
// One adapter per Tripolis service. Each holds a TripolisClient and shapes
// requests and responses for its resource. Lookups fail soft: a missing id or
// a remote fault gives Ok(None), transport failures stay errors.

pub mod article_fields;
pub mod article_types;
pub mod articles;
pub mod contact_databases;
pub mod contact_groups;
pub mod contacts;
pub mod images;
pub mod publishing;

pub use article_fields::ArticleFieldService;
pub use article_types::ArticleTypeService;
pub use articles::{ArticleDraft, ArticleService, DEFAULT_IMAGE_FIELD};
pub use contact_databases::ContactDatabaseService;
pub use contact_groups::ContactGroupService;
pub use contacts::{ContactField, ContactService, SearchOperator};
pub use images::{ImageService, ImageType};
pub use publishing::{DEFAULT_JOB_STATUS, PublishingService};

use log::{debug, warn};
use serde_json::Value;

use crate::api::Service;
use crate::api::tree::into_list;
use crate::{Result, TripolisError};

/// Turn a remote fault into `None`, keeping transport errors
pub(crate) fn soften<T>(service: Service, what: &str, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(TripolisError::RemoteFault(fault)) => {
            debug!("{} {} gave no result: {}", service, what, fault);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// `Some(id)` when present and non-empty
pub(crate) fn present(id: Option<&str>) -> Option<&str> {
    id.filter(|id| !id.trim().is_empty())
}

/// Log and bail out of a lookup that has no id to work with
pub(crate) fn missing<T>(service: Service, what: &str) -> Result<Option<T>> {
    warn!("{} {} skipped: no id given", service, what);
    Ok(None)
}

/// Entries under `collection.item` as a list, one entry or many
pub(crate) fn collection(result: &mut Value, collection: &str, item: &str) -> Vec<Value> {
    result
        .get_mut(collection)
        .and_then(|c| c.get_mut(item))
        .map(Value::take)
        .map(into_list)
        .unwrap_or_default()
}

/// The `id` of a create/delete reply as text
pub(crate) fn reply_id(result: &Value) -> Option<String> {
    result
        .get("id")
        .and_then(crate::api::tree::scalar_text)
        .filter(|id| !id.is_empty())
}
