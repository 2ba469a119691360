//! Transport binding
//!
//! A [`Transport`] sends one operation with one request tree to one service
//! and hands back the raw reply element. Remote faults come back as
//! [`TripolisError::RemoteFault`](crate::TripolisError::RemoteFault); this layer
//! never retries.

pub mod envelope;
pub mod soap;
pub mod wsdl;

pub use soap::SoapTransport;
pub use wsdl::ServiceDescription;

use async_trait::async_trait;
use serde_json::Value;

use super::{Operation, Service, XmlElement};
use crate::Result;

#[async_trait]
pub trait Transport: Send + Sync {
    /// The service this transport is bound to
    fn service(&self) -> Service;

    /// Invoke `operation` with `request` as its single positional argument
    async fn invoke(&self, operation: Operation, request: &Value) -> Result<XmlElement>;

    /// Raw payload of the most recent request, when tracing is enabled
    fn last_request_trace(&self) -> Option<String> {
        None
    }

    /// Raw payload of the most recent response, when tracing is enabled
    fn last_response_trace(&self) -> Option<String> {
        None
    }
}
