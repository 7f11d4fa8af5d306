//! `secops config` - persistent defaults

use super::ChronicleArgs;
use crate::chronicle::time::{parse_timestamp, resolve_time_range};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Save default values
    Set(ConfigSetArgs),
    /// Show the saved configuration
    View,
    /// Delete the saved configuration
    Clear,
}

/// Time defaults to store. Instance values come from the global
/// `--customer-id`, `--project-id`, `--region` and `--service-account` flags.
#[derive(Args, Debug, Default)]
pub struct ConfigSetArgs {
    /// Default start time (RFC 3339)
    #[arg(long)]
    pub start_time: Option<String>,
    /// Default end time (RFC 3339)
    #[arg(long)]
    pub end_time: Option<String>,
    /// Default time window in hours
    #[arg(long)]
    pub time_window: Option<i64>,
}

impl ConfigSetArgs {
    fn into_config(self, instance: &ChronicleArgs) -> Result<Config> {
        for value in [&self.start_time, &self.end_time].into_iter().flatten() {
            parse_timestamp(value)?;
        }
        if let Some(window) = self.time_window {
            resolve_time_range(None, None, Some(window), chrono::Utc::now())?;
        }

        Ok(Config {
            customer_id: instance.customer_id.clone(),
            project_id: instance.project_id.clone(),
            region: instance.region.clone(),
            service_account: instance.service_account.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            time_window: self.time_window,
        })
    }
}

pub fn run(cmd: ConfigCommand, instance: &ChronicleArgs) -> Result<()> {
    match cmd.action {
        ConfigAction::Set(args) => {
            let update = args.into_config(instance)?;
            if update.is_empty() {
                println!("No configuration values provided.");
                return Ok(());
            }

            let mut config = Config::load();
            config.merge(update);
            let path = config.save()?;
            println!("Configuration saved to {}", path.display());
            Ok(())
        }
        ConfigAction::View => {
            let config = Config::load();
            if config.is_empty() {
                println!("No configuration found.");
                return Ok(());
            }

            println!("Current configuration:");
            for (key, value) in config.entries() {
                println!("  {key}: {value}");
            }
            Ok(())
        }
        ConfigAction::Clear => {
            let path = Config::config_path().context("Could not determine config directory")?;
            if Config::clear_at(&path)? {
                println!("Configuration cleared.");
            } else {
                println!("No configuration found.");
            }
            Ok(())
        }
    }
}
