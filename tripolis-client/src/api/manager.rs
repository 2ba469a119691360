//! Client manager
//!
//! Holds the credentials and configuration once and hands out one
//! [`TripolisClient`] per service, plus the entity adapters built on them.

use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::client::TripolisClient;
use super::diagnostics::DiagnosticsSink;
use super::transport::Transport;
use super::Service;
use crate::config::{Credentials, TripolisConfig};
use crate::services::{
    ArticleFieldService, ArticleService, ArticleTypeService, ContactDatabaseService,
    ContactGroupService, ContactService, ImageService, PublishingService,
};
use crate::Result;

type TransportFactory = dyn Fn(Service) -> Arc<dyn Transport> + Send + Sync;

/// Opens and caches service clients for one Tripolis account
pub struct ClientManager {
    credentials: Credentials,
    config: TripolisConfig,
    diagnostics: Option<Arc<dyn DiagnosticsSink>>,
    transport_factory: Option<Arc<TransportFactory>>,
    workspace_id: Option<String>,
    contact_database_id: Option<String>,
    clients: Mutex<HashMap<Service, TripolisClient>>,
}

impl ClientManager {
    pub fn new(credentials: Credentials, config: TripolisConfig) -> Self {
        Self {
            credentials,
            config,
            diagnostics: None,
            transport_factory: None,
            workspace_id: None,
            contact_database_id: None,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Credentials from `TRIPOLIS_*` variables, configuration from the
    /// default config file plus environment overrides
    pub fn from_env() -> anyhow::Result<Self> {
        let config = TripolisConfig::load_default()?;
        let credentials = Credentials::from_env()?;
        Ok(Self::new(credentials, config))
    }

    /// Route every client through this sink instead of the configured default
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Build transports with `factory` instead of opening SOAP sessions
    pub fn with_transport_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(Service) -> Arc<dyn Transport> + Send + Sync + 'static,
    {
        self.transport_factory = Some(Arc::new(factory));
        self
    }

    /// Default workspace for article, tag and image operations
    pub fn with_workspace_id(mut self, id: impl Into<String>) -> Self {
        self.workspace_id = Some(id.into());
        self
    }

    /// Default contact database for contact and group operations
    pub fn with_contact_database_id(mut self, id: impl Into<String>) -> Self {
        self.contact_database_id = Some(id.into());
        self
    }

    pub fn config(&self) -> &TripolisConfig {
        &self.config
    }

    pub fn workspace_id(&self) -> Option<&str> {
        self.workspace_id.as_deref()
    }

    pub fn contact_database_id(&self) -> Option<&str> {
        self.contact_database_id.as_deref()
    }

    /// The client bound to `service`, opened on first request
    pub fn client(&self, service: Service) -> Result<TripolisClient> {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(client) = clients.get(&service) {
            return Ok(client.clone());
        }

        let client = match &self.transport_factory {
            Some(factory) => TripolisClient::with_transport(factory(service), &self.config),
            None => TripolisClient::connect(service, self.credentials.clone(), &self.config)?,
        };
        let client = match &self.diagnostics {
            Some(sink) => client.with_diagnostics(sink.clone()),
            None => client,
        };

        debug!("Created client for {}", service);
        clients.insert(service, client.clone());
        Ok(client)
    }

    pub fn articles(&self) -> Result<ArticleService> {
        let service = ArticleService::new(self.client(Service::Article)?)
            .with_images(self.images()?);
        Ok(match &self.workspace_id {
            Some(id) => service.with_workspace_id(id.clone()),
            None => service,
        })
    }

    pub fn article_fields(&self) -> Result<ArticleFieldService> {
        Ok(ArticleFieldService::new(self.client(Service::ArticleField)?))
    }

    pub fn article_types(&self) -> Result<ArticleTypeService> {
        Ok(ArticleTypeService::new(self.client(Service::ArticleType)?))
    }

    pub fn contact_databases(&self) -> Result<ContactDatabaseService> {
        Ok(ContactDatabaseService::new(
            self.client(Service::ContactDatabase)?,
            self.contact_database_id.clone(),
        ))
    }

    pub fn contact_groups(&self) -> Result<ContactGroupService> {
        Ok(ContactGroupService::new(
            self.client(Service::ContactGroup)?,
            self.contact_database_id.clone(),
        ))
    }

    pub fn contacts(&self) -> Result<ContactService> {
        Ok(ContactService::new(
            self.client(Service::Contact)?,
            self.contact_database_id.clone(),
        ))
    }

    pub fn images(&self) -> Result<ImageService> {
        Ok(ImageService::new(
            self.client(Service::Image)?,
            self.workspace_id.clone(),
        ))
    }

    pub fn publishing(&self) -> Result<PublishingService> {
        Ok(PublishingService::new(self.client(Service::Publishing)?))
    }
}

impl std::fmt::Debug for ClientManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientManager")
            .field("credentials", &self.credentials)
            .field("config", &self.config)
            .field("workspace_id", &self.workspace_id)
            .field("contact_database_id", &self.contact_database_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::diagnostics::testing::RecordingDiagnostics;
    use crate::api::transport::testing::{FnTransport, reply};
    use crate::api::Operation;
    use serde_json::json;

    fn manager() -> ClientManager {
        ClientManager::new(Credentials::new("acme", "api", "secret"), TripolisConfig::default())
    }

    #[test]
    fn test_clients_are_cached_per_service() {
        let opened = Arc::new(Mutex::new(Vec::new()));
        let log = opened.clone();
        let manager = manager().with_transport_factory(move |service| {
            log.lock().unwrap().push(service);
            Arc::new(FnTransport::new(service, |_, _| Ok(reply("<r/>", &[]))))
        });

        assert_eq!(manager.client(Service::Contact).unwrap().service(), Service::Contact);
        manager.client(Service::Contact).unwrap();
        manager.client(Service::Image).unwrap();

        assert_eq!(*opened.lock().unwrap(), vec![Service::Contact, Service::Image]);
    }

    #[test]
    fn test_soap_clients_do_not_connect_eagerly() {
        let config = TripolisConfig::builder()
            .soap_prefix("http://127.0.0.1:9/soap/")
            .build();
        let manager = ClientManager::new(Credentials::new("c", "u", "p"), config)
            .with_workspace_id("ws")
            .with_contact_database_id("db");

        assert!(manager.articles().is_ok());
        assert!(manager.contacts().is_ok());
        assert_eq!(manager.workspace_id(), Some("ws"));
        assert_eq!(manager.contact_database_id(), Some("db"));
        assert!(!format!("{:?}", manager).contains("\"p\""));
    }

    #[tokio::test]
    async fn test_diagnostics_reach_every_client() {
        let sink = Arc::new(RecordingDiagnostics::default());
        let manager = manager()
            .with_transport_factory(|service| {
                Arc::new(FnTransport::new(service, |_, _| {
                    Ok(reply("<getByIdResponse><response><id>1</id></response></getByIdResponse>", &[]))
                }))
            })
            .with_diagnostics(sink.clone());

        let client = manager.client(Service::Publishing).unwrap();
        client.call(Operation::GetById, &json!({"getByIdRequest": {"id": "1"}})).await.unwrap();

        assert_eq!(sink.labels(), vec!["request params", "results from API"]);
    }
}
