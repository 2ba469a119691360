//! reqwest-backed SOAP transport

use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::sync::Mutex;
use tokio::sync::OnceCell;

use super::envelope::{self, Decoded, EnvelopeContext, EnvelopeError};
use super::wsdl::ServiceDescription;
use super::Transport;
use crate::api::{Operation, Service, XmlElement};
use crate::config::{Credentials, EndpointConfig, TripolisConfig};
use crate::{Result, TripolisError};

/// One authenticated session with one Tripolis service.
///
/// The WSDL is resolved lazily on the first invocation and kept for the
/// lifetime of the transport. Every call carries the `authInfo` header.
pub struct SoapTransport {
    service: Service,
    credentials: Credentials,
    endpoint: EndpointConfig,
    trace_wire: bool,
    http: reqwest::Client,
    session: OnceCell<ServiceDescription>,
    last_request: Mutex<Option<String>>,
    last_response: Mutex<Option<String>>,
}

impl SoapTransport {
    pub fn new(service: Service, credentials: Credentials, config: &TripolisConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.endpoint.connect_timeout())
            .build()
            .map_err(|source| TripolisError::Http {
                service: service.endpoint_name().to_string(),
                source,
            })?;

        Ok(Self {
            service,
            credentials,
            endpoint: config.endpoint.clone(),
            trace_wire: config.diagnostics.trace_wire,
            http,
            session: OnceCell::new(),
            last_request: Mutex::new(None),
            last_response: Mutex::new(None),
        })
    }

    /// WSDL location of the bound service
    pub fn wsdl_url(&self) -> String {
        self.service.wsdl_url(&self.endpoint.soap_prefix)
    }

    /// The resolved interface description, once the session is open
    pub fn description(&self) -> Option<&ServiceDescription> {
        self.session.get()
    }

    async fn session(&self) -> Result<&ServiceDescription> {
        self.session.get_or_try_init(|| self.open()).await
    }

    async fn open(&self) -> Result<ServiceDescription> {
        let url = self.wsdl_url();
        debug!("{}: endpoint used {}", self.service, url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.http_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.http_error(e))?;

        if !status.is_success() {
            return Err(TripolisError::transport(
                self.service.endpoint_name(),
                format!("fetching {} returned HTTP {}", url, status),
            ));
        }

        let description = ServiceDescription::parse(self.service, &body)?;
        info!(
            "Opened {} session at {} ({} repeatable elements)",
            self.service,
            description.endpoint,
            description.array_elements.len()
        );
        Ok(description)
    }

    fn http_error(&self, source: reqwest::Error) -> TripolisError {
        TripolisError::Http {
            service: self.service.endpoint_name().to_string(),
            source,
        }
    }

    fn envelope_error(&self, error: EnvelopeError) -> TripolisError {
        TripolisError::transport(self.service.endpoint_name(), error.to_string())
    }

    fn record(&self, slot: &Mutex<Option<String>>, payload: &str) {
        if !self.trace_wire {
            return;
        }
        if let Ok(mut guard) = slot.lock() {
            *guard = Some(payload.to_string());
        }
    }

    fn recorded(slot: &Mutex<Option<String>>) -> Option<String> {
        slot.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl Transport for SoapTransport {
    fn service(&self) -> Service {
        self.service
    }

    async fn invoke(&self, operation: Operation, request: &Value) -> Result<XmlElement> {
        let session = self.session().await?;

        let context = EnvelopeContext {
            target_namespace: &session.target_namespace,
            header_namespace: &self.endpoint.header_namespace,
            credentials: &self.credentials,
        };
        let body = envelope::build_request(&context, operation.as_str(), request)
            .map_err(|e| self.envelope_error(e))?;
        self.record(&self.last_request, &body);

        let response = self
            .http
            .post(&session.endpoint)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header(
                "SOAPAction",
                format!("\"{}\"", session.soap_action(operation.as_str())),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| self.http_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.http_error(e))?;
        self.record(&self.last_response, &text);

        match envelope::parse_response(&text, &session.array_elements) {
            Ok(Decoded::Reply(element)) => Ok(element),
            Ok(Decoded::Fault(fault)) => Err(TripolisError::RemoteFault(fault)),
            Err(e) if !status.is_success() => Err(TripolisError::transport(
                self.service.endpoint_name(),
                format!("{} returned HTTP {}: {}", operation, status, e),
            )),
            Err(e) => Err(self.envelope_error(e)),
        }
    }

    fn last_request_trace(&self) -> Option<String> {
        Self::recorded(&self.last_request)
    }

    fn last_response_trace(&self) -> Option<String> {
        Self::recorded(&self.last_response)
    }
}
