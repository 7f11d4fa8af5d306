//! `secops log-type` - log type lookup

use super::print_json;
use crate::chronicle::log_types::{LogType, LogTypeTable, SearchOptions};
use crate::chronicle::ChronicleClient;
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct LogTypeCommand {
    /// Use the built-in list even when an instance is configured
    #[arg(long = "static")]
    pub static_only: bool,

    #[command(subcommand)]
    pub action: LogTypeAction,
}

#[derive(Subcommand, Debug)]
pub enum LogTypeAction {
    /// List every known log type
    List,
    /// Find log types by id or description
    Search {
        term: String,
        #[arg(long)]
        case_sensitive: bool,
        /// Match ids only
        #[arg(long)]
        id_only: bool,
    },
    /// Show one log type
    Describe { id: String },
}

fn table(static_only: bool, client: Option<ChronicleClient>) -> LogTypeTable {
    match client {
        Some(client) if !static_only => LogTypeTable::with_client(client),
        _ => LogTypeTable::static_only(),
    }
}

pub async fn run(cmd: LogTypeCommand, client: Option<ChronicleClient>) -> Result<()> {
    let table = table(cmd.static_only, client);

    match cmd.action {
        LogTypeAction::List => print_json(&table.all().await),
        LogTypeAction::Search {
            term,
            case_sensitive,
            id_only,
        } => {
            let options = SearchOptions {
                case_sensitive,
                search_in_description: !id_only,
            };
            print_json(&table.search(&term, options).await)
        }
        LogTypeAction::Describe { id } => match table.description(&id).await {
            Some(description) => print_json(&LogType { id, description }),
            None => anyhow::bail!("Unknown log type: {}", id),
        },
    }
}
