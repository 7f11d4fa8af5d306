//! Collection Fetcher
//!
//! Drives repeated `list` calls against a Chronicle collection until the
//! continuation token runs out, and provides the join/filter helpers used to
//! post-process accumulated items.

use super::client::ChronicleClient;
use super::names;
use crate::error::Result;
use serde_json::Value;

/// Largest page the API accepts; used whenever the caller does not pick one
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Whether a listing walks every page or stops after the first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageMode {
    #[default]
    Exhaustive,
    SinglePage,
}

/// Parameters for a paginated listing
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub mode: PageMode,
    pub page_size: u32,
    /// Cursor to resume from
    pub page_token: Option<String>,
    /// Merged into every page request (e.g. `filter`)
    pub params: Vec<(String, String)>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::all()
    }
}

impl PageRequest {
    /// Fetch every page using the default page size
    pub fn all() -> Self {
        Self {
            mode: PageMode::Exhaustive,
            page_size: DEFAULT_PAGE_SIZE,
            page_token: None,
            params: Vec::new(),
        }
    }

    /// Fetch exactly one page
    pub fn single(page_size: u32, page_token: Option<String>) -> Self {
        Self {
            mode: PageMode::SinglePage,
            page_size: page_size.max(1),
            page_token,
            params: Vec::new(),
        }
    }

    /// Map CLI-style `--page-size` / `--page-token` flags onto a request.
    ///
    /// An explicit page size means "one bounded page"; omitting it walks the
    /// whole collection, starting at `page_token` when one is given.
    pub fn from_cli(page_size: Option<u32>, page_token: Option<String>) -> Self {
        match page_size {
            Some(size) => Self::single(size, page_token),
            None => Self {
                page_token,
                ..Self::all()
            },
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    fn query(&self, page_token: Option<&str>) -> Vec<(String, String)> {
        let mut query = vec![("pageSize".to_string(), self.page_size.to_string())];
        if let Some(token) = page_token {
            query.push(("pageToken".to_string(), token.to_string()));
        }
        query.extend(self.params.iter().cloned());
        query
    }
}

/// One page of a listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub next_page_token: Option<String>,
}

/// Split a page response into items and the continuation token.
///
/// Empty tokens count as absent. A null or `{}` body is an empty final page.
pub fn parse_page(response: &Value, items_key: &str) -> Page {
    let items = response
        .get(items_key)
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let next_page_token = response
        .get("nextPageToken")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    Page {
        items,
        next_page_token,
    }
}

fn is_empty_body(response: &Value) -> bool {
    match response {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Fetch a collection, following `nextPageToken` unless the request is
/// single-page. Items keep server order; the first failed page aborts the
/// whole listing.
pub async fn fetch_collection(
    client: &ChronicleClient,
    url: &str,
    items_key: &str,
    request: &PageRequest,
    context: &str,
) -> Result<Vec<Value>> {
    let mut all_items = Vec::new();
    let mut page_token = request.page_token.clone();
    let mut pages = 0usize;

    loop {
        let response = client
            .get(url, &request.query(page_token.as_deref()), context)
            .await?;
        pages += 1;

        if is_empty_body(&response) {
            break;
        }

        let page = parse_page(&response, items_key);
        all_items.extend(page.items);

        if request.mode == PageMode::SinglePage {
            break;
        }
        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    tracing::debug!(
        "Fetched {} {} across {} page(s)",
        all_items.len(),
        items_key,
        pages
    );

    Ok(all_items)
}

/// Copy `display_field` from `parents` onto each item whose parent key
/// (its name up to `child_segment`) equals a parent's `name`.
///
/// Items without a match are left untouched.
pub fn enrich_from_parents(
    items: &mut [Value],
    parents: &[Value],
    child_segment: &str,
    display_field: &str,
) {
    for item in items.iter_mut() {
        let Some(name) = item.get("name").and_then(|v| v.as_str()) else {
            continue;
        };
        let parent_key = names::parent_name(name, child_segment);

        let display = parents
            .iter()
            .find(|p| p.get("name").and_then(|v| v.as_str()) == Some(parent_key))
            .and_then(|p| p.get(display_field))
            .cloned();

        if let (Some(display), Value::Object(map)) = (display, item) {
            map.insert(display_field.to_string(), display);
        }
    }
}

/// JSON truthiness of a field: missing, null, `false`, `0`, `""`, `[]` and `{}` are falsy
pub fn is_truthy(item: &Value, field: &str) -> bool {
    match item.get(field) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// Drop items whose `field` is falsy
pub fn retain_truthy(items: &mut Vec<Value>, field: &str) {
    items.retain(|item| is_truthy(item, field));
}
