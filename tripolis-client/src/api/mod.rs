//! Tripolis Dialogue SOAP API
//!
//! The core every entity adapter builds on: a transport per service, the call
//! dispatcher, the pagination engine and the conflict-retry engine. Responses
//! are normalized into `serde_json::Value` trees so callers see one shape
//! regardless of how the service encoded them.

pub mod client;
pub mod conflict;
pub mod diagnostics;
pub mod fault;
pub mod manager;
pub mod operation;
pub mod paging;
pub mod transport;
pub mod tree;

pub use client::TripolisClient;
pub use conflict::{DEFAULT_NAME_FIELDS, NameField};
pub use diagnostics::{DiagnosticsSink, LogDiagnostics};
pub use fault::{DUPLICATE_IDENTIFIER, Fault};
pub use manager::ClientManager;
pub use operation::{FaultMode, Operation, Reply, Service};
pub use paging::PageDescriptor;
pub use transport::{ServiceDescription, SoapTransport, Transport};
pub use tree::XmlElement;
