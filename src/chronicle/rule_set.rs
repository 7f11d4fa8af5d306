//! Curated Rules
//!
//! Curated detection content managed by Google: rules, the rule sets that
//! group them, their categories, and per-precision deployments that control
//! whether a rule set runs and alerts.

use super::client::ChronicleClient;
use super::names::{self, Precision, ANY, CATEGORIES, CURATED_RULES, DEPLOYMENTS, RULE_SETS};
use super::pagination::{self, PageRequest};
use crate::error::{Result, SecOpsError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Fields every deployment update must carry, in reporting order
pub const REQUIRED_DEPLOYMENT_FIELDS: &[&str] =
    &["category_id", "rule_set_id", "precision", "enabled"];

/// Mask applied to every item of a batch deployment update
pub const BATCH_UPDATE_MASK: &[&str] = &["alerting", "enabled"];

/// Post-join filters for deployment listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeploymentFilter {
    pub only_enabled: bool,
    pub only_alerting: bool,
}

/// Requested state of one curated rule set deployment.
///
/// Fields are optional so that batches read from JSON can be checked as a
/// whole and report exactly which fields are missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentUpdate {
    pub category_id: Option<String>,
    pub rule_set_id: Option<String>,
    pub precision: Option<Precision>,
    pub enabled: Option<bool>,
    pub alerting: Option<bool>,
}

impl DeploymentUpdate {
    pub fn new(category_id: &str, rule_set_id: &str, precision: Precision, enabled: bool) -> Self {
        Self {
            category_id: Some(category_id.to_string()),
            rule_set_id: Some(rule_set_id.to_string()),
            precision: Some(precision),
            enabled: Some(enabled),
            alerting: None,
        }
    }

    pub fn with_alerting(mut self, alerting: bool) -> Self {
        self.alerting = Some(alerting);
        self
    }

    /// Names of required fields that are absent (blank ids count as absent)
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());

        let present = [
            !blank(&self.category_id),
            !blank(&self.rule_set_id),
            self.precision.is_some(),
            self.enabled.is_some(),
        ];

        REQUIRED_DEPLOYMENT_FIELDS
            .iter()
            .zip(present)
            .filter(|(_, ok)| !ok)
            .map(|(field, _)| *field)
            .collect()
    }

    /// Full deployment resource name, or a validation error naming the missing fields
    pub fn deployment_name(&self, instance: &str) -> Result<String> {
        match (&self.category_id, &self.rule_set_id, self.precision, self.enabled) {
            (Some(category), Some(rule_set), Some(precision), Some(_))
                if self.missing_fields().is_empty() =>
            {
                Ok(names::deployment_name(instance, category, rule_set, precision))
            }
            _ => Err(SecOpsError::validation(format!(
                "Deployment missing required fields: {:?}",
                self.missing_fields()
            ))),
        }
    }
}

fn categories_url(client: &ChronicleClient) -> String {
    client.instance_url(CATEGORIES)
}

fn rule_sets_url(client: &ChronicleClient) -> String {
    client.instance_url(&format!("{CATEGORIES}/{ANY}/{RULE_SETS}"))
}

fn deployments_url(client: &ChronicleClient) -> String {
    client.instance_url(&format!("{CATEGORIES}/{ANY}/{RULE_SETS}/{ANY}/{DEPLOYMENTS}"))
}

fn display_name_matches(item: &Value, display_name: &str) -> bool {
    item.get("displayName")
        .and_then(|v| v.as_str())
        .map(|s| s.to_lowercase() == display_name.to_lowercase())
        .unwrap_or(false)
}

// =============================================================================
// Curated rules
// =============================================================================

/// List curated rules in the instance
pub async fn list_curated_rules(
    client: &ChronicleClient,
    request: &PageRequest,
) -> Result<Vec<Value>> {
    pagination::fetch_collection(
        client,
        &client.instance_url(CURATED_RULES),
        "curatedRules",
        request,
        "Failed to list curated rules",
    )
    .await
}

/// Get a curated rule by short id or full resource name
pub async fn get_curated_rule(client: &ChronicleClient, rule_id: &str) -> Result<Value> {
    let rule_id = names::require_id("curated rule id", rule_id)?;
    let url = client.resource_url(&names::qualify(client, CURATED_RULES, rule_id));
    client.get(&url, &[], "Failed to get curated rule").await
}

/// Look up a curated rule by display name (case-insensitive)
pub async fn get_curated_rule_by_name(
    client: &ChronicleClient,
    display_name: &str,
) -> Result<Value> {
    let display_name = names::require_id("curated rule display name", display_name)?;
    list_curated_rules(client, &PageRequest::all())
        .await?
        .into_iter()
        .find(|rule| display_name_matches(rule, display_name))
        .ok_or_else(|| {
            SecOpsError::NotFound(format!("curated rule with display name '{display_name}'"))
        })
}

// =============================================================================
// Rule sets and categories
// =============================================================================

/// List curated rule sets across all categories
pub async fn list_curated_rule_sets(
    client: &ChronicleClient,
    request: &PageRequest,
) -> Result<Vec<Value>> {
    pagination::fetch_collection(
        client,
        &rule_sets_url(client),
        "curatedRuleSets",
        request,
        "Failed to list rule sets",
    )
    .await
}

/// Get a rule set by id, resolved under any category
pub async fn get_curated_rule_set(client: &ChronicleClient, rule_set_id: &str) -> Result<Value> {
    let rule_set_id = names::require_id("curated rule set id", rule_set_id)?;
    let url = if rule_set_id.contains('/') {
        client.resource_url(rule_set_id)
    } else {
        format!("{}/{}", rule_sets_url(client), rule_set_id)
    };
    client.get(&url, &[], "Failed to get rule set").await
}

/// List curated rule set categories
pub async fn list_curated_rule_set_categories(
    client: &ChronicleClient,
    request: &PageRequest,
) -> Result<Vec<Value>> {
    pagination::fetch_collection(
        client,
        &categories_url(client),
        "curatedRuleSetCategories",
        request,
        "Failed to list rule set categories",
    )
    .await
}

/// Get a category by short id or full resource name
pub async fn get_curated_rule_set_category(
    client: &ChronicleClient,
    category_id: &str,
) -> Result<Value> {
    let category_id = names::require_id("curated rule set category id", category_id)?;
    let url = client.resource_url(&names::qualify(client, CATEGORIES, category_id));
    client.get(&url, &[], "Failed to get rule set category").await
}

// =============================================================================
// Deployments
// =============================================================================

/// List deployments, each enriched with its rule set's `displayName`, then
/// narrowed by `filter`. The rule set listing is always exhaustive.
pub async fn list_curated_rule_set_deployments(
    client: &ChronicleClient,
    request: &PageRequest,
    filter: DeploymentFilter,
) -> Result<Vec<Value>> {
    let mut deployments = pagination::fetch_collection(
        client,
        &deployments_url(client),
        "curatedRuleSetDeployments",
        request,
        "Failed to list rule set deployments",
    )
    .await?;

    let rule_sets = list_curated_rule_sets(client, &PageRequest::all()).await?;
    pagination::enrich_from_parents(&mut deployments, &rule_sets, DEPLOYMENTS, "displayName");

    if filter.only_enabled {
        pagination::retain_truthy(&mut deployments, "enabled");
    }
    if filter.only_alerting {
        pagination::retain_truthy(&mut deployments, "alerting");
    }

    Ok(deployments)
}

async fn deployment_for_rule_set(
    client: &ChronicleClient,
    rule_set: &Value,
    precision: Precision,
) -> Result<Value> {
    let Some(rule_set_name) = rule_set.get("name").and_then(|v| v.as_str()) else {
        return Err(SecOpsError::NotFound("rule set response has no name".to_string()));
    };

    let url = client.resource_url(&format!("{rule_set_name}/{DEPLOYMENTS}/{precision}"));
    let mut deployment = client
        .get(&url, &[], "Failed to get rule set deployment")
        .await?;

    if let (Some(display), Value::Object(map)) = (rule_set.get("displayName"), &mut deployment) {
        map.insert("displayName".to_string(), display.clone());
    }
    Ok(deployment)
}

/// Get the deployment of a rule set at the given precision
pub async fn get_curated_rule_set_deployment(
    client: &ChronicleClient,
    rule_set_id: &str,
    precision: Precision,
) -> Result<Value> {
    let rule_set = get_curated_rule_set(client, rule_set_id).await?;
    deployment_for_rule_set(client, &rule_set, precision).await
}

/// Get a deployment by its rule set's display name (case-insensitive)
pub async fn get_curated_rule_set_deployment_by_name(
    client: &ChronicleClient,
    display_name: &str,
    precision: Precision,
) -> Result<Value> {
    let display_name = names::require_id("curated rule set display name", display_name)?;
    let rule_set = list_curated_rule_sets(client, &PageRequest::all())
        .await?
        .into_iter()
        .find(|rs| display_name_matches(rs, display_name))
        .ok_or_else(|| {
            SecOpsError::NotFound(format!("curated rule set with display name '{display_name}'"))
        })?;

    deployment_for_rule_set(client, &rule_set, precision).await
}

/// Update a single deployment. Only `enabled`, plus `alerting` when given,
/// are named in the update mask.
pub async fn update_curated_rule_set_deployment(
    client: &ChronicleClient,
    update: &DeploymentUpdate,
) -> Result<Value> {
    let name = update.deployment_name(&client.instance_id())?;

    let mut body = json!({
        "name": name,
        "enabled": update.enabled,
    });
    let mut mask = vec!["enabled"];
    if let Some(alerting) = update.alerting {
        body["alerting"] = json!(alerting);
        mask.push("alerting");
    }

    tracing::info!("Updating rule set deployment {} ({})", name, mask.join(","));

    let query = [("update_mask".to_string(), mask.join(","))];
    client
        .patch(
            &client.resource_url(&name),
            &body,
            &query,
            "Failed to update rule set deployment",
        )
        .await
}

/// Build the body of a batch deployment update.
///
/// Every item is checked before anything is built; the first invalid item
/// fails the whole batch.
pub fn build_batch_update_request(instance: &str, updates: &[DeploymentUpdate]) -> Result<Value> {
    let deployment_names = updates
        .iter()
        .map(|u| u.deployment_name(instance))
        .collect::<Result<Vec<_>>>()?;

    let requests: Vec<Value> = updates
        .iter()
        .zip(deployment_names)
        .map(|(update, name)| {
            json!({
                "curated_rule_set_deployment": {
                    "name": name,
                    "enabled": update.enabled.unwrap_or_default(),
                    "alerting": update.alerting.unwrap_or(false),
                },
                "update_mask": {
                    "paths": BATCH_UPDATE_MASK,
                },
            })
        })
        .collect();

    Ok(json!({
        "parent": format!("{instance}/{CATEGORIES}/{ANY}/{RULE_SETS}/{ANY}"),
        "requests": requests,
    }))
}

/// Apply several deployment updates in one call
pub async fn batch_update_curated_rule_set_deployments(
    client: &ChronicleClient,
    updates: &[DeploymentUpdate],
) -> Result<Value> {
    if updates.is_empty() {
        return Err(SecOpsError::validation("At least one deployment must be provided"));
    }
    let body = build_batch_update_request(&client.instance_id(), updates)?;

    tracing::info!("Batch updating {} rule set deployment(s)", updates.len());

    client
        .post(
            &format!("{}:batchUpdate", deployments_url(client)),
            Some(&body),
            "Failed to batch update rule set deployments",
        )
        .await
}
