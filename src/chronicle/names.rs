//! Resource name helpers
//!
//! Chronicle resources are addressed by slash-delimited hierarchical names
//! rooted at the instance. Callers may pass either a short id or a fully
//! qualified name; anything containing `/` is taken verbatim.

use super::client::ChronicleClient;
use crate::error::{Result, SecOpsError};
use std::fmt;
use std::str::FromStr;

pub const CATEGORIES: &str = "curatedRuleSetCategories";
pub const RULE_SETS: &str = "curatedRuleSets";
pub const DEPLOYMENTS: &str = "curatedRuleSetDeployments";
pub const CURATED_RULES: &str = "curatedRules";
pub const DATA_EXPORTS: &str = "dataExports";
pub const LOG_TYPES: &str = "logTypes";

/// Wildcard segment matching every parent in a collection path
pub const ANY: &str = "-";

/// Detection precision of a curated rule set deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Precise,
    Broad,
}

impl Precision {
    pub fn as_str(self) -> &'static str {
        match self {
            Precision::Precise => "precise",
            Precision::Broad => "broad",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Precision {
    type Err = SecOpsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "precise" => Ok(Precision::Precise),
            "broad" => Ok(Precision::Broad),
            other => Err(SecOpsError::validation(format!(
                "precision must be 'precise' or 'broad', got '{other}'"
            ))),
        }
    }
}

impl serde::Serialize for Precision {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Precision {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Reject empty identifiers before they end up as `.../dataExports/`
pub fn require_id<'a>(what: &str, id: &'a str) -> Result<&'a str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(SecOpsError::validation(format!("{what} must not be empty")));
    }
    Ok(id)
}

/// Expand a short id into `{instance}/{collection}/{id}`; qualified names pass through
pub fn qualify(client: &ChronicleClient, collection: &str, id: &str) -> String {
    qualify_under(&client.instance_id(), collection, id)
}

pub fn qualify_under(instance: &str, collection: &str, id: &str) -> String {
    if id.contains('/') {
        id.to_string()
    } else {
        format!("{instance}/{collection}/{id}")
    }
}

/// `{instance}/curatedRuleSetCategories/{category}/curatedRuleSets/{rule_set}`
pub fn rule_set_name(instance: &str, category_id: &str, rule_set_id: &str) -> String {
    format!("{instance}/{CATEGORIES}/{category_id}/{RULE_SETS}/{rule_set_id}")
}

/// `{rule_set_name}/curatedRuleSetDeployments/{precision}`
pub fn deployment_name(
    instance: &str,
    category_id: &str,
    rule_set_id: &str,
    precision: Precision,
) -> String {
    format!(
        "{}/{DEPLOYMENTS}/{}",
        rule_set_name(instance, category_id, rule_set_id),
        precision
    )
}

/// Last path segment of a resource name
pub fn short_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Parent key of a child resource: everything before `child_segment`,
/// minus the trailing separator.
///
/// `.../curatedRuleSets/abc/curatedRuleSetDeployments/precise` with
/// `curatedRuleSetDeployments` yields `.../curatedRuleSets/abc`. A name that
/// does not contain the segment is returned unchanged.
pub fn parent_name<'a>(name: &'a str, child_segment: &str) -> &'a str {
    let head = match name.find(child_segment) {
        Some(idx) => &name[..idx],
        None => name,
    };
    head.trim_end_matches('/')
}
