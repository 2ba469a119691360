//! Call dispatcher
//!
//! Every remote operation goes through [`TripolisClient::call_with`]: it
//! invokes the transport, normalizes and unwraps the reply and decides whether
//! a remote fault becomes an error or a value.

use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;

use super::diagnostics::{DiagnosticsSink, LogDiagnostics};
use super::transport::{SoapTransport, Transport};
use super::tree::{normalize, unwrap_response};
use super::{Fault, FaultMode, Operation, Reply, Service};
use crate::config::{ConflictConfig, Credentials, TripolisConfig};
use crate::{Result, TripolisError};

/// Connection to one Tripolis service plus the shared call/paging/retry core.
///
/// Cloning is cheap and shares the underlying session. A client should serve
/// one logical call chain at a time.
#[derive(Clone)]
pub struct TripolisClient {
    transport: Arc<dyn Transport>,
    diagnostics: Option<Arc<dyn DiagnosticsSink>>,
    pub(crate) page_size: u32,
    pub(crate) conflict: ConflictConfig,
}

impl TripolisClient {
    /// Bind a client to `service` over SOAP. No network traffic happens until
    /// the first call.
    pub fn connect(service: Service, credentials: Credentials, config: &TripolisConfig) -> Result<Self> {
        let transport = SoapTransport::new(service, credentials, config)?;
        let client = Self::with_transport(Arc::new(transport), config);

        if config.diagnostics.enabled {
            Ok(client.with_diagnostics(Arc::new(LogDiagnostics)))
        } else {
            Ok(client)
        }
    }

    /// Build a client over any transport
    pub fn with_transport(transport: Arc<dyn Transport>, config: &TripolisConfig) -> Self {
        Self {
            transport,
            diagnostics: None,
            page_size: config.paging.page_size,
            conflict: config.conflict.clone(),
        }
    }

    /// Install the diagnostics sink
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    pub fn service(&self) -> Service {
        self.transport.service()
    }

    /// Default page size used by [`paged_call`](Self::paged_call)
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Maximum length of labels and names sent by create calls
    pub fn max_label_length(&self) -> usize {
        self.conflict.max_label_length
    }

    pub fn last_request_trace(&self) -> Option<String> {
        self.transport.last_request_trace()
    }

    pub fn last_response_trace(&self) -> Option<String> {
        self.transport.last_response_trace()
    }

    /// Call an operation, surfacing remote faults as errors
    pub async fn call(&self, operation: Operation, request: &Value) -> Result<Value> {
        self.call_with(operation, request, FaultMode::Surface)
            .await?
            .into_result()
    }

    /// Call an operation. With [`FaultMode::Return`] a remote fault is handed
    /// back as [`Reply::Fault`] instead of an error.
    pub async fn call_with(
        &self,
        operation: Operation,
        request: &Value,
        mode: FaultMode,
    ) -> Result<Reply> {
        self.emit("request params", request);

        match self.transport.invoke(operation, request).await {
            Ok(element) => {
                let value = unwrap_response(normalize(&element));
                self.emit("results from API", &value);
                Ok(Reply::Payload(value))
            }
            Err(TripolisError::RemoteFault(fault)) => match mode {
                FaultMode::Return => {
                    debug!(
                        "{}.{} returned fault as value: {}",
                        self.service(),
                        operation,
                        fault
                    );
                    Ok(Reply::Fault(fault))
                }
                FaultMode::Surface => Err(self.surface_fault(operation, fault)),
            },
            Err(e) => {
                warn!("{}.{} failed: {}", self.service(), operation, e);
                Err(e)
            }
        }
    }

    /// Log a fault and turn it into an error
    pub(crate) fn surface_fault(&self, operation: Operation, fault: Fault) -> TripolisError {
        warn!("SOAP fault from {}.{}: {}", self.service(), operation, fault);
        if let Ok(value) = serde_json::to_value(&fault) {
            self.emit("error", &value);
        }
        TripolisError::RemoteFault(fault)
    }

    fn emit(&self, label: &str, value: &Value) {
        if let Some(sink) = &self.diagnostics {
            sink.emit(label, value);
        }
    }
}

impl std::fmt::Debug for TripolisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripolisClient")
            .field("service", &self.service())
            .field("page_size", &self.page_size)
            .field("conflict", &self.conflict)
            .field("diagnostics", &self.diagnostics.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::diagnostics::testing::RecordingDiagnostics;
    use crate::api::transport::testing::{FnTransport, reply};
    use serde_json::json;

    fn client(transport: FnTransport) -> (TripolisClient, Arc<FnTransport>) {
        let transport = Arc::new(transport);
        let client = TripolisClient::with_transport(transport.clone(), &TripolisConfig::default());
        (client, transport)
    }

    fn duplicate_label() -> Fault {
        Fault::new(401, "label already exists").with_identifier("label", Some("old".into()))
    }

    #[tokio::test]
    async fn test_call_unwraps_response() {
        let (client, transport) = client(FnTransport::new(Service::Contact, |_, _| {
            Ok(reply(
                "<createResponse><response><id>c1</id></response></createResponse>",
                &[],
            ))
        }));

        let request = json!({"createRequest": {"contactDatabaseId": "db"}});
        let result = client.call(Operation::Create, &request).await.unwrap();

        assert_eq!(result, json!({"id": "c1"}));
        assert_eq!(transport.recorded(), vec![(Operation::Create, request)]);
    }

    #[tokio::test]
    async fn test_call_returns_unwrapped_shape_unchanged() {
        let (client, _) = client(FnTransport::new(Service::Contact, |_, _| {
            Ok(reply("<getByIdResponse><id>c1</id><name>x</name></getByIdResponse>", &[]))
        }));

        let result = client.call(Operation::GetById, &json!({})).await.unwrap();
        assert_eq!(result, json!({"id": "c1", "name": "x"}));
    }

    #[tokio::test]
    async fn test_call_unwraps_only_once() {
        let (client, _) = client(FnTransport::new(Service::Article, |_, _| {
            Ok(reply(
                "<getByIdResponse><response><response><id>a1</id></response></response></getByIdResponse>",
                &[],
            ))
        }));

        let result = client.call(Operation::GetById, &json!({})).await.unwrap();
        assert_eq!(result, json!({"response": {"id": "a1"}}));
    }

    #[tokio::test]
    async fn test_fault_surfaces_as_error() {
        let (client, _) = client(FnTransport::new(Service::Article, |_, _| {
            Err(TripolisError::RemoteFault(duplicate_label()))
        }));

        let err = client
            .call(Operation::Create, &json!({"createRequest": {}}))
            .await
            .unwrap_err();
        assert_eq!(err.fault(), Some(&duplicate_label()));
    }

    #[tokio::test]
    async fn test_fault_returned_as_value() {
        let (client, transport) = client(FnTransport::new(Service::Article, |_, _| {
            Err(TripolisError::RemoteFault(duplicate_label()))
        }));

        let reply = client
            .call_with(Operation::Create, &json!({"createRequest": {}}), FaultMode::Return)
            .await
            .unwrap();
        assert_eq!(reply, Reply::Fault(duplicate_label()));

        // execution continues after a returned fault
        let reply = client
            .call_with(Operation::Create, &json!({"createRequest": {}}), FaultMode::Return)
            .await
            .unwrap();
        assert!(reply.is_fault());
        assert_eq!(transport.recorded().len(), 2);
    }

    #[tokio::test]
    async fn test_transport_errors_are_never_values() {
        let (client, _) = client(FnTransport::new(Service::Article, |_, _| {
            Err(TripolisError::transport("ArticleService", "no WSDL"))
        }));

        let err = client
            .call_with(Operation::GetById, &json!({}), FaultMode::Return)
            .await
            .unwrap_err();
        assert!(matches!(err, TripolisError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_diagnostics_observe_without_altering() {
        let _ = env_logger::builder().is_test(true).try_init();
        let sink = Arc::new(RecordingDiagnostics::default());
        let (client, _) = client(FnTransport::new(Service::Contact, |_, _| {
            Ok(reply("<deleteResponse><response><id>c1</id></response></deleteResponse>", &[]))
        }));
        let client = client.with_diagnostics(sink.clone());

        let request = json!({"deleteRequest": {"id": "c1"}});
        let result = client.call(Operation::Delete, &request).await.unwrap();

        assert_eq!(result, json!({"id": "c1"}));
        assert_eq!(sink.labels(), vec!["request params", "results from API"]);
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries[0].1, request);
        assert_eq!(entries[1].1, result);
    }

    #[tokio::test]
    async fn test_surfaced_fault_reaches_diagnostics() {
        let sink = Arc::new(RecordingDiagnostics::default());
        let (client, _) = client(FnTransport::new(Service::Contact, |_, _| {
            Err(TripolisError::RemoteFault(Fault::new(404, "contact not found")))
        }));
        let client = client.with_diagnostics(sink.clone());

        assert!(client.call(Operation::GetById, &json!({})).await.is_err());
        assert_eq!(sink.labels(), vec!["request params", "error"]);
    }
}
