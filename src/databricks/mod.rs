//! Unity Catalog API interaction module
//!
//! This module provides the core functionality for talking to the Unity
//! Catalog REST API of a workspace: credential resolution, the HTTP client,
//! wire models and the [`AdminApi`](crate::resource::AdminApi) implementation.
//!
//! # Module Structure
//!
//! - [`auth`] - Host and token resolution (flags, environment, `~/.databrickscfg`)
//! - [`client`] - Workspace client for catalogs, metastores, credentials and locations
//! - [`http`] - HTTP utilities and error mapping for REST calls
//! - [`models`] - Object records returned by the API
//!
//! # Example
//!
//! ```ignore
//! use ucprov::databricks::{auth, client::WorkspaceClient, http::HttpOptions};
//!
//! async fn example(config: &ucprov::config::Config) -> anyhow::Result<()> {
//!     let credentials = auth::resolve_credentials(None, None, config)?;
//!     let client = WorkspaceClient::new(&credentials, HttpOptions::default())?;
//!     let catalog = client.get_catalog("main").await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod models;
