//! Command line interface
//!
//! Commands are a tagged enum; each variant states up front whether it needs
//! a Chronicle client, so dispatch never has to guess from the arguments.

pub mod config;
pub mod curated_rule;
pub mod export;
pub mod log_type;

use crate::chronicle::{ApiVersion, ChronicleClient};
use crate::chronicle::http::error_hint;
use crate::config::Config;
use crate::error::SecOpsError;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::Path;

/// Google SecOps CLI
#[derive(Parser, Debug)]
#[command(name = "secops", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub chronicle: ChronicleArgs,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

/// Instance context; each value falls back to the config file
#[derive(Args, Debug, Clone, Default)]
pub struct ChronicleArgs {
    /// Chronicle instance (customer) ID
    #[arg(long, global = true)]
    pub customer_id: Option<String>,

    /// GCP project ID
    #[arg(long, global = true)]
    pub project_id: Option<String>,

    /// Chronicle API region
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Path to service account JSON file
    #[arg(long, global = true)]
    pub service_account: Option<String>,

    /// Chronicle API version
    #[arg(long, value_enum, default_value = "v1alpha", global = true)]
    pub api_version: ApiVersionArg,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ApiVersionArg {
    V1,
    V1beta,
    #[default]
    V1alpha,
}

impl From<ApiVersionArg> for ApiVersion {
    fn from(arg: ApiVersionArg) -> Self {
        match arg {
            ApiVersionArg::V1 => ApiVersion::V1,
            ApiVersionArg::V1beta => ApiVersion::V1Beta,
            ApiVersionArg::V1alpha => ApiVersion::V1Alpha,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Option<tracing::Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(tracing::Level::ERROR),
            LogLevel::Warn => Some(tracing::Level::WARN),
            LogLevel::Info => Some(tracing::Level::INFO),
            LogLevel::Debug => Some(tracing::Level::DEBUG),
            LogLevel::Trace => Some(tracing::Level::TRACE),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage CLI configuration
    Config(config::ConfigCommand),
    /// Manage curated rules and rule sets
    CuratedRule(curated_rule::CuratedRuleCommand),
    /// Manage data exports
    Export(export::ExportCommand),
    /// Look up log types
    LogType(log_type::LogTypeCommand),
}

/// What a command needs from the instance context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRequirement {
    /// Runs purely locally
    None,
    /// Fails without a fully configured client
    Required,
    /// Uses a client when one can be built, otherwise works offline
    Optional,
}

impl Command {
    /// Whether this command needs an authenticated Chronicle client
    pub fn client_requirement(&self) -> ClientRequirement {
        match self {
            Command::Config(_) => ClientRequirement::None,
            Command::CuratedRule(_) | Command::Export(_) => ClientRequirement::Required,
            Command::LogType(cmd) if cmd.static_only => ClientRequirement::None,
            Command::LogType(_) => ClientRequirement::Optional,
        }
    }
}

/// Resolved instance context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChronicleContext {
    pub customer_id: String,
    pub project_id: String,
    pub region: String,
    pub service_account: Option<String>,
}

impl ChronicleArgs {
    /// Combine flags with the config file. Returns the names of missing keys
    /// on failure.
    pub fn resolve(
        &self,
        config: &Config,
    ) -> std::result::Result<ChronicleContext, Vec<&'static str>> {
        let customer_id = self.customer_id.clone().or_else(|| config.customer_id.clone());
        let project_id = self.project_id.clone().or_else(|| config.effective_project());

        match (customer_id, project_id) {
            (Some(customer_id), Some(project_id)) => Ok(ChronicleContext {
                customer_id,
                project_id,
                region: self.region.clone().unwrap_or_else(|| config.effective_region()),
                service_account: self
                    .service_account
                    .clone()
                    .or_else(|| config.service_account.clone()),
            }),
            (customer_id, project_id) => {
                let mut missing = Vec::new();
                if customer_id.is_none() {
                    missing.push("customer_id");
                }
                if project_id.is_none() {
                    missing.push("project_id");
                }
                Err(missing)
            }
        }
    }
}

fn missing_config_message(missing: &[&str]) -> String {
    format!(
        "Missing required configuration: {}\n\n\
         Please set up your configuration first:\n  \
         secops config set --customer-id YOUR_CUSTOMER_ID --project-id YOUR_PROJECT_ID --region YOUR_REGION\n\n\
         Or provide them directly on the command line:\n  \
         secops --customer-id YOUR_CUSTOMER_ID --project-id YOUR_PROJECT_ID --region YOUR_REGION <command>",
        missing.join(", ")
    )
}

async fn build_client(args: &ChronicleArgs, ctx: &ChronicleContext) -> Result<ChronicleClient> {
    let client = ChronicleClient::connect(
        &ctx.project_id,
        &ctx.region,
        &ctx.customer_id,
        ctx.service_account.as_deref().map(Path::new),
    )
    .await
    .context("Failed to initialize Chronicle client")?;

    Ok(client.with_api_version(args.api_version.into()))
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Render a command failure for stderr: the full context chain, then a
/// remediation hint when the root cause has one
pub fn report(err: &anyhow::Error) -> String {
    let hint = err.downcast_ref::<SecOpsError>().and_then(error_hint);
    match hint {
        Some(hint) => format!("{err:#}\n{hint}"),
        None => format!("{err:#}"),
    }
}

/// Run a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::load();
    let requirement = cli.command.client_requirement();

    let client = match requirement {
        ClientRequirement::None => None,
        ClientRequirement::Required => {
            let ctx = cli
                .chronicle
                .resolve(&config)
                .map_err(|missing| anyhow::anyhow!(missing_config_message(&missing)))?;
            Some(build_client(&cli.chronicle, &ctx).await?)
        }
        ClientRequirement::Optional => match cli.chronicle.resolve(&config) {
            Ok(ctx) => match build_client(&cli.chronicle, &ctx).await {
                Ok(client) => Some(client),
                Err(e) => {
                    tracing::warn!("Continuing without Chronicle client: {:#}", e);
                    None
                }
            },
            Err(_) => None,
        },
    };

    tracing::debug!("Dispatching {:?} (client: {})", requirement, client.is_some());

    match (cli.command, client) {
        (Command::Config(cmd), _) => config::run(cmd, &cli.chronicle),
        (Command::CuratedRule(cmd), Some(client)) => curated_rule::run(cmd, &client).await,
        (Command::Export(cmd), Some(client)) => export::run(cmd, &client, &config).await,
        (Command::LogType(cmd), client) => log_type::run(cmd, client).await,
        (_, None) => anyhow::bail!("Chronicle client required for this command"),
    }
}
