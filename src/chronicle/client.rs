//! Chronicle Client
//!
//! Main client for the Chronicle API, combining authentication, HTTP, and the
//! instance context every resource name is rooted at.

use super::auth::Credentials;
use super::http::{Query, SecOpsHttpClient};
use crate::error::{Result, SecOpsError};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Chronicle REST API version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    V1,
    V1Beta,
    #[default]
    V1Alpha,
}

impl ApiVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V1Beta => "v1beta",
            ApiVersion::V1Alpha => "v1alpha",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main Chronicle client
#[derive(Clone)]
pub struct ChronicleClient {
    pub credentials: Credentials,
    pub http: SecOpsHttpClient,
    pub project_id: String,
    pub region: String,
    pub customer_id: String,
    pub api_version: ApiVersion,
    /// Replaces the regional endpoint (private endpoints, tests)
    endpoint_override: Option<String>,
}

impl ChronicleClient {
    /// Create a client from already-resolved credentials
    pub fn new(
        project_id: &str,
        region: &str,
        customer_id: &str,
        credentials: Credentials,
    ) -> Result<Self> {
        if project_id.is_empty() || customer_id.is_empty() || region.is_empty() {
            return Err(SecOpsError::validation(
                "project_id, region and customer_id must all be set",
            ));
        }

        Ok(Self {
            credentials,
            http: SecOpsHttpClient::new()?,
            project_id: project_id.to_string(),
            region: region.to_string(),
            customer_id: customer_id.to_string(),
            api_version: ApiVersion::default(),
            endpoint_override: None,
        })
    }

    /// Create a client, resolving credentials from a key file or ADC
    pub async fn connect(
        project_id: &str,
        region: &str,
        customer_id: &str,
        service_account: Option<&Path>,
    ) -> Result<Self> {
        let credentials = Credentials::resolve(service_account).await?;
        Self::new(project_id, region, customer_id, credentials)
    }

    pub fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = version;
        self
    }

    /// Point the client at a different endpoint. The URL must include the
    /// API version path segment.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        url::Url::parse(base_url)
            .map_err(|e| SecOpsError::validation(format!("invalid base URL {base_url}: {e}")))?;
        self.endpoint_override = Some(base_url.trim_end_matches('/').to_string());
        Ok(self)
    }

    /// API root, e.g. `https://us-chronicle.googleapis.com/v1alpha`
    pub fn base_url(&self) -> String {
        match &self.endpoint_override {
            Some(url) => url.clone(),
            None => format!(
                "https://{}-chronicle.googleapis.com/{}",
                self.region, self.api_version
            ),
        }
    }

    /// Fully-qualified instance name every resource lives under
    pub fn instance_id(&self) -> String {
        format!(
            "projects/{}/locations/{}/instances/{}",
            self.project_id, self.region, self.customer_id
        )
    }

    /// URL of a resource path relative to the instance
    pub fn instance_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url(), self.instance_id(), path)
    }

    /// URL of an already-qualified resource name
    pub fn resource_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url(), name)
    }

    /// Bearer token for the next request (cached by the credentials)
    pub async fn get_token(&self) -> Result<String> {
        self.credentials.get_token().await
    }

    /// Authenticated GET
    pub async fn get(&self, url: &str, query: &Query, context: &str) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.get(url, &token, query, context).await
    }

    /// Authenticated POST with an optional JSON body
    pub async fn post(&self, url: &str, body: Option<&Value>, context: &str) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.post(url, &token, body, context).await
    }

    /// Authenticated PATCH; callers pass the update mask in `query`
    pub async fn patch(
        &self,
        url: &str,
        body: &Value,
        query: &Query,
        context: &str,
    ) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.patch(url, &token, body, query, context).await
    }
}
