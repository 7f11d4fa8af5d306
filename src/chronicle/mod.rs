//! Chronicle API interaction module
//!
//! Core functionality for talking to the Chronicle (Google SecOps) REST API:
//! authentication, the HTTP client, pagination, and one module per resource
//! family.
//!
//! # Module Structure
//!
//! - [`auth`] - Credentials and bearer token caching
//! - [`client`] - Main client: instance context and URL building
//! - [`http`] - HTTP utilities for REST API calls
//! - [`names`] - Resource name construction
//! - [`pagination`] - Page-token driven collection fetching, joins and filters
//! - [`rule_set`] - Curated rules, rule sets, categories and deployments
//! - [`data_export`] - Data export jobs
//! - [`log_types`] - Log type lookup table
//! - [`time`] - Timestamp formatting and time ranges
//!
//! # Example
//!
//! ```ignore
//! use secops::chronicle::{client::ChronicleClient, pagination::PageRequest, rule_set};
//!
//! async fn example() -> secops::error::Result<()> {
//!     let client = ChronicleClient::connect("my-project", "us", "customer-uuid", None).await?;
//!     let rule_sets = rule_set::list_curated_rule_sets(&client, &PageRequest::all()).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod data_export;
pub mod http;
pub mod log_types;
pub mod names;
pub mod pagination;
pub mod rule_set;
pub mod time;

pub use client::{ApiVersion, ChronicleClient};
pub use pagination::{PageMode, PageRequest};
