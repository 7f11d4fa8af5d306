//! HTTP utilities for Chronicle REST API calls

use crate::error::{Result, SecOpsError};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Query parameters for a request, in insertion order
pub type Query = [(String, String)];

/// Sanitize response body for logging.
/// Truncates long responses and strips non-printable characters.
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client wrapper for Chronicle API calls
#[derive(Clone)]
pub struct SecOpsHttpClient {
    client: Client,
}

impl SecOpsHttpClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("secops-rs/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// GET a resource or collection page
    pub async fn get(&self, url: &str, token: &str, query: &Query, context: &str) -> Result<Value> {
        tracing::debug!("GET {} {:?}", url, query);

        let request = self.client.get(url).bearer_auth(token).query(query);
        send(request, context).await
    }

    /// POST, optionally with a JSON body
    pub async fn post(
        &self,
        url: &str,
        token: &str,
        body: Option<&Value>,
        context: &str,
    ) -> Result<Value> {
        tracing::debug!("POST {}", url);

        let mut request = self.client.post(url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        send(request, context).await
    }

    /// PATCH with a JSON body (partial update; the mask travels in `query`)
    pub async fn patch(
        &self,
        url: &str,
        token: &str,
        body: &Value,
        query: &Query,
        context: &str,
    ) -> Result<Value> {
        tracing::debug!("PATCH {} {:?}", url, query);

        let request = self
            .client
            .patch(url)
            .bearer_auth(token)
            .query(query)
            .json(body);
        send(request, context).await
    }
}

/// Send a request and turn the response into JSON or a typed error
async fn send(request: RequestBuilder, context: &str) -> Result<Value> {
    let response = request.send().await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        // Only the sanitized, truncated body goes to the log; the caller gets all of it
        tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
        return Err(SecOpsError::Api {
            context: context.to_string(),
            status,
            body,
        });
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    Ok(serde_json::from_str(&body)?)
}

/// Remediation hint for errors the user can fix locally
pub fn error_hint(error: &SecOpsError) -> Option<&'static str> {
    match error {
        SecOpsError::Api { status, .. } if status.as_u16() == 401 => {
            Some("Authentication failed. Run 'gcloud auth application-default login'.")
        }
        SecOpsError::Api { status, .. } if status.as_u16() == 403 => {
            Some("Permission denied. Check your IAM roles on the Chronicle instance.")
        }
        SecOpsError::Auth(_) => {
            Some("For ADC run 'gcloud auth application-default login' or pass --service-account.")
        }
        _ => None,
    }
}

/// Format an error for display on the terminal
pub fn format_error(error: &SecOpsError) -> String {
    match error_hint(error) {
        Some(hint) => format!("{error}\n{hint}"),
        None => error.to_string(),
    }
}
