//! Client for the Tripolis Dialogue marketing-automation SOAP API.
//!
//! ```no_run
//! use tripolis_client::api::ClientManager;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let manager = ClientManager::from_env()?.with_contact_database_id("db-id");
//! let groups = manager.contact_groups()?.get_by_contact_database_id(None).await?;
//! println!("{:?}", groups);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod services;

pub use config::{Credentials, TripolisConfig};
pub use error::{Result, TripolisError};
