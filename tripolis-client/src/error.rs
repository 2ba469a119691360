//! Error types for Tripolis API interactions

use crate::api::Fault;
use thiserror::Error;

/// Errors surfaced by the Tripolis client
#[derive(Debug, Error)]
pub enum TripolisError {
    /// A session could not be established, or the service answered with
    /// something that is not a SOAP envelope
    #[error("transport error for {service}: {message}")]
    Transport { service: String, message: String },

    /// Connection-level HTTP failure
    #[error("HTTP request to {service} failed: {source}")]
    Http {
        service: String,
        #[source]
        source: reqwest::Error,
    },

    /// Application-level rejection reported by the remote service
    #[error("remote fault: {0}")]
    RemoteFault(Fault),

    /// The conflict-retry cap was hit while the name kept colliding
    #[error("gave up renaming after {attempts} conflicting attempts: {fault}")]
    RetryExhausted { attempts: u32, fault: Fault },

    /// The request tree cannot be sent in the requested way
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TripolisError {
    pub(crate) fn transport(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            service: service.into(),
            message: message.into(),
        }
    }

    /// The remote fault carried by this error, if any
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Self::RemoteFault(fault) => Some(fault),
            Self::RetryExhausted { fault, .. } => Some(fault),
            _ => None,
        }
    }

    /// Whether this is an application-level rejection rather than a
    /// transport problem
    pub fn is_remote_fault(&self) -> bool {
        matches!(self, Self::RemoteFault(_))
    }
}

pub type Result<T> = std::result::Result<T, TripolisError>;
