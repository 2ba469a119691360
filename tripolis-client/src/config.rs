//! Client configuration with builder pattern
//!
//! Provides one configuration for endpoint discovery, paging, conflict retries
//! and diagnostics, with sane defaults. Values can come from a TOML file and be
//! overridden from the environment (including a `.env` file).

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SOAP_PREFIX: &str = "https://td42.tripolis.com/api2/soap/";
pub const DEFAULT_HEADER_NAMESPACE: &str = "http://services.tripolis.com/";

/// Global configuration for Tripolis API access
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripolisConfig {
    pub endpoint: EndpointConfig,
    pub paging: PagingConfig,
    pub conflict: ConflictConfig,
    pub diagnostics: DiagnosticsConfig,
}

/// Where and how to reach the SOAP services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Prefix the service name and `?wsdl` are appended to
    pub soap_prefix: String,
    /// Namespace of the `authInfo` SOAP header
    pub header_namespace: String,
    /// Connection establishment timeout; calls themselves have no deadline
    pub connect_timeout_ms: u64,
}

/// Pagination settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Items requested per page
    pub page_size: u32,
}

/// Label/name conflict retry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictConfig {
    /// Maximum length (in characters) of labels and names, suffix included
    pub max_label_length: usize,
    /// Renames attempted before giving up
    pub max_retries: u32,
}

/// Diagnostics and wire tracing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Install the log-backed diagnostics sink
    pub enabled: bool,
    /// Keep the last raw request/response payloads
    pub trace_wire: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            soap_prefix: DEFAULT_SOAP_PREFIX.to_string(),
            header_namespace: DEFAULT_HEADER_NAMESPACE.to_string(),
            connect_timeout_ms: 1000,
        }
    }
}

impl EndpointConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self { page_size: 400 }
    }
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            max_label_length: 40,
            max_retries: 1000,
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            trace_wire: true,
        }
    }
}

impl TripolisConfig {
    /// Create a new builder for TripolisConfig
    pub fn builder() -> TripolisConfigBuilder {
        TripolisConfigBuilder::new()
    }

    /// Verbose config for development: diagnostics and wire tracing on
    pub fn development() -> Self {
        Self {
            diagnostics: DiagnosticsConfig {
                enabled: true,
                trace_wire: true,
            },
            ..Self::default()
        }
    }

    /// No diagnostics, no wire traces kept in memory
    pub fn quiet() -> Self {
        Self {
            diagnostics: DiagnosticsConfig {
                enabled: false,
                trace_wire: false,
            },
            ..Self::default()
        }
    }

    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).context("Failed to parse Tripolis config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&source)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Default config file location (`<config dir>/tripolis/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tripolis").join("config.toml"))
    }

    /// Load the default config file if present, then apply environment
    /// overrides (a `.env` file in the working directory is honoured)
    pub fn load_default() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path)?,
            _ => Self::default(),
        };

        let _ = dotenvy::dotenv();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `TRIPOLIS_*` overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup("TRIPOLIS_SOAP_PREFIX") {
            self.endpoint.soap_prefix = prefix;
        }
        if let Some(namespace) = lookup("TRIPOLIS_HEADER_NAMESPACE") {
            self.endpoint.header_namespace = namespace;
        }
        if let Some(timeout) = lookup("TRIPOLIS_CONNECT_TIMEOUT_MS") {
            self.endpoint.connect_timeout_ms = timeout
                .trim()
                .parse()
                .context("TRIPOLIS_CONNECT_TIMEOUT_MS must be a number of milliseconds")?;
        }
        if let Some(page_size) = lookup("TRIPOLIS_PAGE_SIZE") {
            self.paging.page_size = page_size
                .trim()
                .parse()
                .context("TRIPOLIS_PAGE_SIZE must be a positive integer")?;
        }
        if let Some(debug) = lookup("TRIPOLIS_DEBUG") {
            self.diagnostics.enabled = matches!(
                debug.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        self.validate()
    }

    /// Reject values the client cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.soap_prefix.trim().is_empty() {
            bail!("endpoint.soap_prefix must not be empty");
        }
        if self.paging.page_size == 0 {
            bail!("paging.page_size must be positive");
        }
        // Room for at least one character plus a " (N)" suffix
        if self.conflict.max_label_length < 5 {
            bail!("conflict.max_label_length must be at least 5");
        }
        Ok(())
    }
}

/// Builder for TripolisConfig
#[derive(Debug)]
pub struct TripolisConfigBuilder {
    config: TripolisConfig,
}

impl TripolisConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: TripolisConfig::default(),
        }
    }

    /// Set the SOAP prefix services are resolved under
    pub fn soap_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.endpoint.soap_prefix = prefix.into();
        self
    }

    /// Set the namespace of the authentication header
    pub fn header_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.endpoint.header_namespace = namespace.into();
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.endpoint.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the default page size for paged calls
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.config.paging.page_size = page_size;
        self
    }

    /// Set the maximum label/name length
    pub fn max_label_length(mut self, length: usize) -> Self {
        self.config.conflict.max_label_length = length;
        self
    }

    /// Set the conflict retry cap
    pub fn max_conflict_retries(mut self, retries: u32) -> Self {
        self.config.conflict.max_retries = retries;
        self
    }

    /// Enable/disable the diagnostics sink
    pub fn diagnostics(mut self, enabled: bool) -> Self {
        self.config.diagnostics.enabled = enabled;
        self
    }

    /// Enable/disable keeping raw wire payloads
    pub fn trace_wire(mut self, enabled: bool) -> Self {
        self.config.diagnostics.trace_wire = enabled;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> TripolisConfig {
        self.config
    }
}

impl Default for TripolisConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The fixed credential triple sent in every request's `authInfo` header
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        client: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client: client.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read `TRIPOLIS_CLIENT`, `TRIPOLIS_USERNAME` and `TRIPOLIS_PASSWORD`
    /// (a `.env` file in the working directory is honoured)
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .with_context(|| format!("{} is not set", key))
        };

        Ok(Self {
            client: get("TRIPOLIS_CLIENT")?,
            username: get("TRIPOLIS_USERNAME")?,
            password: get("TRIPOLIS_PASSWORD")?,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client", &self.client)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = TripolisConfig::default();

        assert_eq!(config.endpoint.soap_prefix, DEFAULT_SOAP_PREFIX);
        assert_eq!(config.endpoint.header_namespace, DEFAULT_HEADER_NAMESPACE);
        assert_eq!(config.endpoint.connect_timeout(), Duration::from_secs(1));
        assert_eq!(config.paging.page_size, 400);
        assert_eq!(config.conflict.max_label_length, 40);
        assert_eq!(config.conflict.max_retries, 1000);
        assert!(!config.diagnostics.enabled);
        assert!(config.diagnostics.trace_wire);
    }

    #[test]
    fn test_presets() {
        assert!(TripolisConfig::development().diagnostics.enabled);
        let quiet = TripolisConfig::quiet();
        assert!(!quiet.diagnostics.enabled);
        assert!(!quiet.diagnostics.trace_wire);
    }

    #[test]
    fn test_builder_pattern() {
        let config = TripolisConfig::builder()
            .soap_prefix("http://localhost:8080/soap/")
            .connect_timeout(Duration::from_millis(250))
            .page_size(50)
            .max_label_length(30)
            .max_conflict_retries(3)
            .diagnostics(true)
            .trace_wire(false)
            .build();

        assert_eq!(config.endpoint.soap_prefix, "http://localhost:8080/soap/");
        assert_eq!(config.endpoint.connect_timeout_ms, 250);
        assert_eq!(config.paging.page_size, 50);
        assert_eq!(config.conflict.max_label_length, 30);
        assert_eq!(config.conflict.max_retries, 3);
        assert!(config.diagnostics.enabled);
        assert!(!config.diagnostics.trace_wire);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TripolisConfig::from_toml_str(
            r#"
            [endpoint]
            soap_prefix = "https://td99.tripolis.com/api2/soap/"

            [paging]
            page_size = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint.soap_prefix, "https://td99.tripolis.com/api2/soap/");
        assert_eq!(config.endpoint.header_namespace, DEFAULT_HEADER_NAMESPACE);
        assert_eq!(config.paging.page_size, 100);
        assert_eq!(config.conflict.max_label_length, 40);
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(TripolisConfig::from_toml_str("[paging]\npage_size = 0").is_err());
        assert!(TripolisConfig::from_toml_str("[paging\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[diagnostics]\nenabled = true\n").unwrap();

        let config = TripolisConfig::load(&path).unwrap();
        assert!(config.diagnostics.enabled);

        let missing = TripolisConfig::load(dir.path().join("missing.toml"));
        assert!(missing.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = TripolisConfig::default();
        config
            .apply_overrides(lookup(&[
                ("TRIPOLIS_SOAP_PREFIX", "http://mock/soap/"),
                ("TRIPOLIS_PAGE_SIZE", "25"),
                ("TRIPOLIS_CONNECT_TIMEOUT_MS", "5000"),
                ("TRIPOLIS_DEBUG", "yes"),
            ]))
            .unwrap();

        assert_eq!(config.endpoint.soap_prefix, "http://mock/soap/");
        assert_eq!(config.paging.page_size, 25);
        assert_eq!(config.endpoint.connect_timeout_ms, 5000);
        assert!(config.diagnostics.enabled);

        let mut config = TripolisConfig::default();
        assert!(config.apply_overrides(lookup(&[("TRIPOLIS_PAGE_SIZE", "many")])).is_err());
    }

    #[test]
    fn test_credentials_from_lookup() {
        let credentials = Credentials::from_lookup(lookup(&[
            ("TRIPOLIS_CLIENT", "acme"),
            ("TRIPOLIS_USERNAME", "api"),
            ("TRIPOLIS_PASSWORD", "secret"),
        ]))
        .unwrap();

        assert_eq!(credentials, Credentials::new("acme", "api", "secret"));
        assert!(!format!("{:?}", credentials).contains("secret"));

        let missing = Credentials::from_lookup(lookup(&[("TRIPOLIS_CLIENT", "acme")]));
        assert!(missing.is_err());
    }
}
