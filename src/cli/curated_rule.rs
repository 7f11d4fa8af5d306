//! `secops curated-rule` - curated rules, rule sets, categories, deployments

use super::print_json;
use crate::chronicle::names::Precision;
use crate::chronicle::rule_set::{self, DeploymentFilter, DeploymentUpdate};
use crate::chronicle::{ChronicleClient, PageRequest};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct CuratedRuleCommand {
    #[command(subcommand)]
    pub target: CuratedRuleTarget,
}

#[derive(Subcommand, Debug)]
pub enum CuratedRuleTarget {
    /// Curated rules
    #[command(subcommand)]
    Rule(RuleAction),
    /// Curated rule sets
    #[command(subcommand)]
    RuleSet(RuleSetAction),
    /// Curated rule set categories
    #[command(subcommand)]
    RuleSetCategory(CategoryAction),
    /// Curated rule set deployments
    #[command(subcommand)]
    RuleSetDeployment(DeploymentAction),
}

/// `--page-size` / `--page-token`. A page size asks for a single page.
#[derive(Args, Debug, Clone, Default)]
pub struct PageArgs {
    /// Return a single page of this many items
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub page_size: Option<u32>,
    /// Continue from a previous page
    #[arg(long)]
    pub page_token: Option<String>,
}

impl PageArgs {
    pub fn request(&self) -> PageRequest {
        PageRequest::from_cli(self.page_size, self.page_token.clone())
    }
}

/// Select by id or by display name
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct IdOrName {
    #[arg(long)]
    pub id: Option<String>,
    /// Display name (case-insensitive)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum RuleAction {
    List(PageArgs),
    Get(IdOrName),
}

#[derive(Subcommand, Debug)]
pub enum RuleSetAction {
    List(PageArgs),
    Get {
        #[arg(long)]
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryAction {
    List(PageArgs),
    Get {
        #[arg(long)]
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum DeploymentAction {
    List {
        #[command(flatten)]
        page: PageArgs,
        /// Only deployments that are enabled
        #[arg(long)]
        only_enabled: bool,
        /// Only deployments that are alerting
        #[arg(long)]
        only_alerting: bool,
    },
    Get {
        #[command(flatten)]
        select: IdOrName,
        #[arg(long, default_value = "precise")]
        precision: Precision,
    },
    Update {
        #[arg(long)]
        category_id: String,
        #[arg(long)]
        rule_set_id: String,
        #[arg(long)]
        precision: Precision,
        /// true or false
        #[arg(long, action = clap::ArgAction::Set)]
        enabled: bool,
        /// true or false
        #[arg(long)]
        alerting: Option<bool>,
    },
    /// Apply updates read from a JSON array file
    BatchUpdate {
        #[arg(long)]
        file: PathBuf,
    },
}

/// Read a JSON array of deployment updates
pub fn read_deployment_updates(path: &Path) -> Result<Vec<DeploymentUpdate>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let updates = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse deployment updates in {}", path.display()))?;
    Ok(updates)
}

/// Run a curated rule command and print the response
pub async fn run(cmd: CuratedRuleCommand, client: &ChronicleClient) -> Result<()> {
    match cmd.target {
        CuratedRuleTarget::Rule(action) => match action {
            RuleAction::List(page) => {
                let rules = rule_set::list_curated_rules(client, &page.request()).await?;
                print_json(&rules)
            }
            RuleAction::Get(IdOrName { id: Some(id), .. }) => {
                print_json(&rule_set::get_curated_rule(client, &id).await?)
            }
            RuleAction::Get(IdOrName { name: Some(name), .. }) => {
                print_json(&rule_set::get_curated_rule_by_name(client, &name).await?)
            }
            RuleAction::Get(_) => anyhow::bail!("Either --id or --name must be provided"),
        },

        CuratedRuleTarget::RuleSet(action) => match action {
            RuleSetAction::List(page) => {
                print_json(&rule_set::list_curated_rule_sets(client, &page.request()).await?)
            }
            RuleSetAction::Get { id } => {
                print_json(&rule_set::get_curated_rule_set(client, &id).await?)
            }
        },

        CuratedRuleTarget::RuleSetCategory(action) => match action {
            CategoryAction::List(page) => print_json(
                &rule_set::list_curated_rule_set_categories(client, &page.request()).await?,
            ),
            CategoryAction::Get { id } => {
                print_json(&rule_set::get_curated_rule_set_category(client, &id).await?)
            }
        },

        CuratedRuleTarget::RuleSetDeployment(action) => run_deployment(action, client).await,
    }
}

async fn run_deployment(action: DeploymentAction, client: &ChronicleClient) -> Result<()> {
    match action {
        DeploymentAction::List {
            page,
            only_enabled,
            only_alerting,
        } => {
            let filter = DeploymentFilter {
                only_enabled,
                only_alerting,
            };
            let deployments =
                rule_set::list_curated_rule_set_deployments(client, &page.request(), filter).await?;
            print_json(&deployments)
        }
        DeploymentAction::Get { select, precision } => {
            let deployment = match select {
                IdOrName { id: Some(id), .. } => {
                    rule_set::get_curated_rule_set_deployment(client, &id, precision).await?
                }
                IdOrName { name: Some(name), .. } => {
                    rule_set::get_curated_rule_set_deployment_by_name(client, &name, precision)
                        .await?
                }
                _ => anyhow::bail!("Either --id or --name must be provided"),
            };
            print_json(&deployment)
        }
        DeploymentAction::Update {
            category_id,
            rule_set_id,
            precision,
            enabled,
            alerting,
        } => {
            let mut update = DeploymentUpdate::new(&category_id, &rule_set_id, precision, enabled);
            if let Some(alerting) = alerting {
                update = update.with_alerting(alerting);
            }
            print_json(&rule_set::update_curated_rule_set_deployment(client, &update).await?)
        }
        DeploymentAction::BatchUpdate { file } => {
            let updates = read_deployment_updates(&file)?;
            let response =
                rule_set::batch_update_curated_rule_set_deployments(client, &updates).await?;
            if response.is_null() {
                print_json(&json!({ "updated": updates.len() }))
            } else {
                print_json(&response)
            }
        }
    }
}
