//! Service endpoints and remote operations exposed by the Tripolis SOAP API

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Fault;

/// A Tripolis SOAP service. Every service has its own WSDL, so a client that
/// needs N services opens N connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Service {
    Article,
    ArticleField,
    ArticleType,
    ContactDatabase,
    ContactGroup,
    Contact,
    Image,
    Publishing,
}

impl Service {
    /// Endpoint name, e.g. `ArticleService` for `{prefix}ArticleService?wsdl`
    pub fn endpoint_name(&self) -> &'static str {
        match self {
            Self::Article => "ArticleService",
            Self::ArticleField => "ArticleFieldService",
            Self::ArticleType => "ArticleTypeService",
            Self::ContactDatabase => "ContactDatabaseService",
            Self::ContactGroup => "ContactGroupService",
            Self::Contact => "ContactService",
            Self::Image => "ImageService",
            Self::Publishing => "PublishingService",
        }
    }

    /// WSDL location for this service under the given prefix
    pub fn wsdl_url(&self, soap_prefix: &str) -> String {
        format!("{}{}?wsdl", soap_prefix, self.endpoint_name())
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.endpoint_name())
    }
}

/// A single RPC method consumed by the adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    GetById,
    GetByArticleTypeId,
    GetByWorkspaceId,
    GetByNewsletterId,
    GetByContactDatabaseId,
    Create,
    CreateTag,
    Delete,
    Search,
    AddToContactGroup,
    GetAll,
}

impl Operation {
    /// Wire name of the RPC method
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetById => "getById",
            Self::GetByArticleTypeId => "getByArticleTypeId",
            Self::GetByWorkspaceId => "getByWorkspaceId",
            Self::GetByNewsletterId => "getByNewsletterId",
            Self::GetByContactDatabaseId => "getByContactDatabaseId",
            Self::Create => "create",
            Self::CreateTag => "createTag",
            Self::Delete => "delete",
            Self::Search => "search",
            Self::AddToContactGroup => "addToContactGroup",
            Self::GetAll => "getAll",
        }
    }

    /// Whether the operation writes to the remote side
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Create | Self::CreateTag | Self::Delete | Self::AddToContactGroup
        )
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the dispatcher treats a remote fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultMode {
    /// Log the fault and return it as an error
    #[default]
    Surface,
    /// Hand the fault back as a [`Reply::Fault`] value
    Return,
}

/// Outcome of one dispatched call
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Normalized, unwrapped payload (always a mapping or a sequence)
    Payload(Value),
    /// Fault returned as data (only produced with [`FaultMode::Return`])
    Fault(Fault),
}

impl Reply {
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }

    pub fn as_fault(&self) -> Option<&Fault> {
        match self {
            Self::Fault(fault) => Some(fault),
            Self::Payload(_) => None,
        }
    }

    /// Turn the reply into a result, surfacing a returned fault as an error
    pub fn into_result(self) -> crate::Result<Value> {
        match self {
            Self::Payload(value) => Ok(value),
            Self::Fault(fault) => Err(crate::TripolisError::RemoteFault(fault)),
        }
    }
}
