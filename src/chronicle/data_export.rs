//! Data Export
//!
//! Asynchronous server-side jobs that copy Chronicle log data to a Cloud
//! Storage bucket over a time window. The client only requests lifecycle
//! transitions (create, update while queued, cancel); the server decides
//! whether they are legal.

use super::client::ChronicleClient;
use super::names::{self, DATA_EXPORTS, LOG_TYPES};
use super::pagination::{self, PageRequest};
use super::time::{format_timestamp, require_ordered};
use crate::error::{Result, SecOpsError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Every destination bucket must be given as a resource name
pub const BUCKET_PREFIX: &str = "projects/";

/// Server-reported lifecycle stage of an export job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataExportStage {
    InQueue,
    Processing,
    FinishedSuccess,
    FinishedFailure,
    Cancelled,
    Other(String),
}

impl DataExportStage {
    pub fn parse(stage: &str) -> Self {
        match stage {
            "IN_QUEUE" => Self::InQueue,
            "PROCESSING" => Self::Processing,
            "FINISHED_SUCCESS" => Self::FinishedSuccess,
            "FINISHED_FAILURE" => Self::FinishedFailure,
            "CANCELLED" => Self::Cancelled,
            other => Self::Other(other.to_string()),
        }
    }

    /// Stage of an export resource, read from `dataExportStatus.stage`
    pub fn of(export: &Value) -> Option<Self> {
        export
            .get("dataExportStatus")
            .and_then(|s| s.get("stage"))
            .and_then(|v| v.as_str())
            .map(Self::parse)
    }

    /// Finished or cancelled exports can no longer be updated or cancelled
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::FinishedSuccess | Self::FinishedFailure | Self::Cancelled
        )
    }
}

impl fmt::Display for DataExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InQueue => "IN_QUEUE",
            Self::Processing => "PROCESSING",
            Self::FinishedSuccess => "FINISHED_SUCCESS",
            Self::FinishedFailure => "FINISHED_FAILURE",
            Self::Cancelled => "CANCELLED",
            Self::Other(s) => s.as_str(),
        };
        f.write_str(s)
    }
}

/// A log type that has data available for export in a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableLogType {
    pub log_type: String,
    #[serde(default)]
    pub display_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// One page of available log types
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AvailableLogTypes {
    pub available_log_types: Vec<AvailableLogType>,
    pub next_page_token: Option<String>,
}

/// Parameters of a new export job
#[derive(Debug, Clone, PartialEq)]
pub struct CreateDataExport {
    /// `projects/{project}/buckets/{bucket}`
    pub gcs_bucket: String,
    /// Inclusive
    pub start_time: DateTime<Utc>,
    /// Exclusive
    pub end_time: DateTime<Utc>,
    pub log_types: Vec<String>,
    pub export_all_logs: bool,
}

fn require_bucket(bucket: &str) -> Result<()> {
    if bucket.is_empty() {
        return Err(SecOpsError::validation("GCS bucket must be provided"));
    }
    if !bucket.starts_with(BUCKET_PREFIX) {
        return Err(SecOpsError::validation(
            "GCS bucket must be in format: projects/{project}/buckets/{bucket}",
        ));
    }
    Ok(())
}

impl CreateDataExport {
    /// Bucket shape, time order, and exactly one of log types or all logs
    pub fn validate(&self) -> Result<()> {
        require_bucket(&self.gcs_bucket)?;
        require_ordered(&self.start_time, &self.end_time)?;

        match (self.export_all_logs, self.log_types.is_empty()) {
            (false, true) => Err(SecOpsError::validation(
                "Either log types must be specified or export_all_logs must be true",
            )),
            (true, false) => Err(SecOpsError::validation(
                "Cannot specify both log types and export_all_logs=true",
            )),
            _ => Ok(()),
        }
    }

    /// Request body; short log type ids are expanded under `instance`
    pub fn to_payload(&self, instance: &str) -> Result<Value> {
        self.validate()?;

        let include: Vec<String> = if self.export_all_logs {
            Vec::new()
        } else {
            self.log_types
                .iter()
                .map(|lt| names::qualify_under(instance, LOG_TYPES, lt))
                .collect()
        };

        Ok(json!({
            "startTime": format_timestamp(&self.start_time),
            "endTime": format_timestamp(&self.end_time),
            "gcsBucket": self.gcs_bucket,
            "includeLogTypes": include,
        }))
    }
}

/// Fields to change on a queued export. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataExportUpdate {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub gcs_bucket: Option<String>,
    pub log_types: Option<Vec<String>>,
}

impl DataExportUpdate {
    /// Payload plus the update mask naming exactly the fields it carries
    pub fn to_request(&self) -> Result<(Value, Vec<&'static str>)> {
        let mut payload = Map::new();
        let mut mask = Vec::new();

        if let (Some(start), Some(end)) = (&self.start_time, &self.end_time) {
            require_ordered(start, end)?;
        }

        if let Some(start) = &self.start_time {
            payload.insert("startTime".to_string(), json!(format_timestamp(start)));
            mask.push("startTime");
        }
        if let Some(end) = &self.end_time {
            payload.insert("endTime".to_string(), json!(format_timestamp(end)));
            mask.push("endTime");
        }
        if let Some(bucket) = &self.gcs_bucket {
            require_bucket(bucket)?;
            payload.insert("gcsBucket".to_string(), json!(bucket));
            mask.push("gcsBucket");
        }
        if let Some(log_types) = &self.log_types {
            payload.insert("includeLogTypes".to_string(), json!(log_types));
            mask.push("includeLogTypes");
        }

        if mask.is_empty() {
            return Err(SecOpsError::validation(
                "At least one field to update must be provided.",
            ));
        }

        Ok((Value::Object(payload), mask))
    }
}

fn export_url(client: &ChronicleClient, data_export_id: &str) -> Result<String> {
    let id = names::require_id("data export id", data_export_id)?;
    Ok(client.resource_url(&names::qualify(client, DATA_EXPORTS, id)))
}

/// Get one export by short id or full resource name
pub async fn get_data_export(client: &ChronicleClient, data_export_id: &str) -> Result<Value> {
    let url = export_url(client, data_export_id)?;
    client.get(&url, &[], "Failed to get data export").await
}

/// Validate and submit a new export
pub async fn create_data_export(
    client: &ChronicleClient,
    export: &CreateDataExport,
) -> Result<Value> {
    let payload = export.to_payload(&client.instance_id())?;

    tracing::info!(
        "Creating data export to {} ({} log types, all={})",
        export.gcs_bucket,
        export.log_types.len(),
        export.export_all_logs
    );

    client
        .post(
            &client.instance_url(DATA_EXPORTS),
            Some(&payload),
            "Failed to create data export",
        )
        .await
}

/// Update a queued export; the server rejects updates in any other stage
pub async fn update_data_export(
    client: &ChronicleClient,
    data_export_id: &str,
    update: &DataExportUpdate,
) -> Result<Value> {
    let url = export_url(client, data_export_id)?;
    let (payload, mask) = update.to_request()?;

    tracing::info!("Updating data export {} ({})", data_export_id, mask.join(","));

    let query = [("update_mask".to_string(), mask.join(","))];
    client
        .patch(&url, &payload, &query, "Failed to update data export")
        .await
}

/// Cancel an export through its `:cancel` method
pub async fn cancel_data_export(client: &ChronicleClient, data_export_id: &str) -> Result<Value> {
    let url = format!("{}:cancel", export_url(client, data_export_id)?);

    tracing::info!("Cancelling data export {}", data_export_id);

    client.post(&url, None, "Failed to cancel data export").await
}

/// List exports, optionally narrowed by a server-side filter expression
pub async fn list_data_exports(
    client: &ChronicleClient,
    filter: Option<&str>,
    request: &PageRequest,
) -> Result<Vec<Value>> {
    let mut request = request.clone();
    if let Some(filter) = filter.filter(|f| !f.is_empty()) {
        request = request.with_param("filter", filter);
    }

    pagination::fetch_collection(
        client,
        &client.instance_url(DATA_EXPORTS),
        "dataExports",
        &request,
        "Failed to list data exports",
    )
    .await
}

/// Log types with data in `[start, end)` that can be exported
pub async fn fetch_available_log_types(
    client: &ChronicleClient,
    start_time: &DateTime<Utc>,
    end_time: &DateTime<Utc>,
    page_size: Option<u32>,
    page_token: Option<&str>,
) -> Result<AvailableLogTypes> {
    require_ordered(start_time, end_time)?;

    let mut body = json!({
        "startTime": format_timestamp(start_time),
        "endTime": format_timestamp(end_time),
    });
    if let Some(size) = page_size {
        body["pageSize"] = json!(size);
    }
    if let Some(token) = page_token {
        body["pageToken"] = json!(token);
    }

    let url = client.instance_url(&format!("{DATA_EXPORTS}:fetchavailablelogtypes"));
    let response = client
        .post(&url, Some(&body), "Failed to fetch available log types")
        .await?;

    let page = pagination::parse_page(&response, "availableLogTypes");
    let available_log_types = page
        .items
        .into_iter()
        .map(serde_json::from_value)
        .collect::<std::result::Result<Vec<AvailableLogType>, _>>()?;

    Ok(AvailableLogTypes {
        available_log_types,
        next_page_token: page.next_page_token,
    })
}
