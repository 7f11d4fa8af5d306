//! Log Type Table
//!
//! Lookup table of log type ids and their descriptions. The table is filled
//! on first use, from the instance's `logTypes` collection when a client is
//! attached or from the embedded static list otherwise, and then kept until
//! [`LogTypeTable::reset`] is called.

use super::client::ChronicleClient;
use super::names::{self, LOG_TYPES};
use super::pagination::{self, PageRequest};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Embedded fallback list (compiled into the binary)
const STATIC_LOG_TYPES: &str = include_str!("../resources/log_types.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogType {
    pub id: String,
    pub description: String,
}

/// Log types keyed by id
pub type LogTypeMap = BTreeMap<String, LogType>;

/// How [`LogTypeTable::search`] matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub search_in_description: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            search_in_description: true,
        }
    }
}

/// Parse the embedded static list
pub fn static_log_types() -> LogTypeMap {
    let entries: Vec<LogType> = serde_json::from_str(STATIC_LOG_TYPES)
        .unwrap_or_else(|e| panic!("Failed to parse embedded log type JSON: {}", e));

    entries.into_iter().map(|lt| (lt.id.clone(), lt)).collect()
}

/// Fetch log types from the API. Items without a `name` are skipped; a
/// missing `displayName` falls back to the id.
pub async fn fetch_log_types(
    client: &ChronicleClient,
    request: &PageRequest,
) -> Result<LogTypeMap> {
    let items = pagination::fetch_collection(
        client,
        &client.instance_url(LOG_TYPES),
        "logTypes",
        request,
        "Failed to list log types",
    )
    .await?;

    let mut map = LogTypeMap::new();
    for item in items {
        let Some(name) = item.get("name").and_then(|v| v.as_str()) else {
            continue;
        };
        let id = names::short_id(name).to_string();
        let description = item
            .get("displayName")
            .and_then(|v| v.as_str())
            .unwrap_or(&id)
            .to_string();
        map.insert(id.clone(), LogType { id, description });
    }

    Ok(map)
}

/// Lazily-loaded, resettable log type lookup table.
///
/// Clones share the same cache.
#[derive(Clone, Default)]
pub struct LogTypeTable {
    client: Option<ChronicleClient>,
    cache: Arc<RwLock<Option<Arc<LogTypeMap>>>>,
}

impl LogTypeTable {
    /// Table backed by the embedded list only
    pub fn static_only() -> Self {
        Self::default()
    }

    /// Table backed by the API, falling back to the embedded list on failure
    pub fn with_client(client: ChronicleClient) -> Self {
        Self {
            client: Some(client),
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Return the table, loading it on first access
    pub async fn load(&self) -> Arc<LogTypeMap> {
        {
            let cache = self.cache.read().await;
            if let Some(map) = cache.as_ref() {
                return Arc::clone(map);
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have filled it while we waited for the write lock
        if let Some(map) = cache.as_ref() {
            return Arc::clone(map);
        }

        let map = Arc::new(self.fetch().await);
        *cache = Some(Arc::clone(&map));
        map
    }

    async fn fetch(&self) -> LogTypeMap {
        let Some(client) = &self.client else {
            return static_log_types();
        };

        match fetch_log_types(client, &PageRequest::all()).await {
            Ok(map) => {
                tracing::debug!("Loaded {} log types from API", map.len());
                map
            }
            Err(e) => {
                tracing::warn!("Failed to load log types from API: {}, using static list", e);
                static_log_types()
            }
        }
    }

    /// Drop the cached table; the next access reloads it
    pub async fn reset(&self) {
        *self.cache.write().await = None;
    }

    pub async fn is_loaded(&self) -> bool {
        self.cache.read().await.is_some()
    }

    pub async fn all(&self) -> Vec<LogType> {
        self.load().await.values().cloned().collect()
    }

    pub async fn is_valid(&self, id: &str) -> bool {
        self.load().await.contains_key(id)
    }

    pub async fn description(&self, id: &str) -> Option<String> {
        self.load().await.get(id).map(|lt| lt.description.clone())
    }

    /// Log types whose id (and optionally description) contains `term`
    pub async fn search(&self, term: &str, options: SearchOptions) -> Vec<LogType> {
        let map = self.load().await;
        map.values()
            .filter(|lt| matches_term(lt, term, options))
            .cloned()
            .collect()
    }
}

fn matches_term(lt: &LogType, term: &str, options: SearchOptions) -> bool {
    let contains = |haystack: &str| {
        if options.case_sensitive {
            haystack.contains(term)
        } else {
            haystack.to_lowercase().contains(&term.to_lowercase())
        }
    };

    contains(&lt.id) || (options.search_in_description && contains(&lt.description))
}
