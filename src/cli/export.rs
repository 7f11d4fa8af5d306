//! `secops export` - data export jobs

use super::curated_rule::PageArgs;
use super::print_json;
use crate::chronicle::data_export::{self, CreateDataExport, DataExportUpdate};
use crate::chronicle::time::{parse_timestamp, resolve_time_range};
use crate::chronicle::ChronicleClient;
use crate::config::Config;
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct ExportCommand {
    #[command(subcommand)]
    pub action: ExportAction,
}

/// Time range flags; unset values fall back to the config file, then to the
/// last 24 hours
#[derive(Args, Debug, Clone, Default)]
pub struct TimeRangeArgs {
    /// Start time (RFC 3339)
    #[arg(long)]
    pub start_time: Option<String>,
    /// End time (RFC 3339)
    #[arg(long)]
    pub end_time: Option<String>,
    /// Hours to look back when no start time is given
    #[arg(long)]
    pub time_window: Option<i64>,
}

impl TimeRangeArgs {
    pub fn resolve(
        &self,
        config: &Config,
        now: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let range = resolve_time_range(
            self.start_time.as_deref().or(config.start_time.as_deref()),
            self.end_time.as_deref().or(config.end_time.as_deref()),
            self.time_window.or(config.time_window),
            now,
        )?;
        Ok(range)
    }
}

#[derive(Subcommand, Debug)]
pub enum ExportAction {
    /// Show one export
    Get {
        #[arg(long)]
        id: String,
    },
    /// Start a new export
    Create {
        /// projects/{project}/buckets/{bucket}
        #[arg(long)]
        gcs_bucket: String,
        /// Comma-separated log type ids
        #[arg(long, value_delimiter = ',', conflicts_with = "all_logs")]
        log_types: Vec<String>,
        /// Export every log type
        #[arg(long)]
        all_logs: bool,
        #[command(flatten)]
        range: TimeRangeArgs,
    },
    /// Change a queued export
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        start_time: Option<String>,
        #[arg(long)]
        end_time: Option<String>,
        #[arg(long)]
        gcs_bucket: Option<String>,
        /// Comma-separated log type names
        #[arg(long, value_delimiter = ',')]
        log_types: Option<Vec<String>>,
    },
    /// Cancel an export
    Cancel {
        #[arg(long)]
        id: String,
    },
    /// List exports
    List {
        /// Server-side filter expression
        #[arg(long)]
        filter: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Log types available for export in a time range
    LogTypes {
        #[command(flatten)]
        range: TimeRangeArgs,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        page_size: Option<u32>,
        #[arg(long)]
        page_token: Option<String>,
    },
}

fn parse_optional(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    Ok(value.map(parse_timestamp).transpose()?)
}

/// Run an export command and print the response
pub async fn run(cmd: ExportCommand, client: &ChronicleClient, config: &Config) -> Result<()> {
    match cmd.action {
        ExportAction::Get { id } => print_json(&data_export::get_data_export(client, &id).await?),

        ExportAction::Create {
            gcs_bucket,
            log_types,
            all_logs,
            range,
        } => {
            let (start_time, end_time) = range.resolve(config, Utc::now())?;
            let export = CreateDataExport {
                gcs_bucket,
                start_time,
                end_time,
                log_types,
                export_all_logs: all_logs,
            };
            print_json(&data_export::create_data_export(client, &export).await?)
        }

        ExportAction::Update {
            id,
            start_time,
            end_time,
            gcs_bucket,
            log_types,
        } => {
            let update = DataExportUpdate {
                start_time: parse_optional(start_time.as_deref())?,
                end_time: parse_optional(end_time.as_deref())?,
                gcs_bucket,
                log_types,
            };
            print_json(&data_export::update_data_export(client, &id, &update).await?)
        }

        ExportAction::Cancel { id } => {
            print_json(&data_export::cancel_data_export(client, &id).await?)
        }

        ExportAction::List { filter, page } => {
            let exports =
                data_export::list_data_exports(client, filter.as_deref(), &page.request()).await?;
            print_json(&exports)
        }

        ExportAction::LogTypes {
            range,
            page_size,
            page_token,
        } => {
            let (start, end) = range.resolve(config, Utc::now())?;
            let available = data_export::fetch_available_log_types(
                client,
                &start,
                &end,
                page_size,
                page_token.as_deref(),
            )
            .await?;
            print_json(&available)
        }
    }
}
