use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::document::Document;
use super::filter::FilterState;

/// How multiple search terms combine on the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Any,
    All,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Any => "any",
            MatchMode::All => "all",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "any" => Some(MatchMode::Any),
            "all" => Some(MatchMode::All),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
    /// Infinite list driven by the backend cursor
    #[default]
    Reader,
    /// Paged table driven by row offsets
    Grid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewState {
    pub mode: ViewMode,
    /// 1-based; only meaningful in grid mode.
    pub page: usize,
    pub page_size: usize,
}

impl ViewState {
    pub fn new(page_size: usize) -> Self {
        Self {
            mode: ViewMode::Reader,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1) * self.page_size
    }

    pub fn page_count(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size.max(1) as u64)
    }
}

/// The document a followed "attachment of / parent of" link points at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttachmentTarget {
    pub document_id: String,
    pub parent_id: String,
    pub is_attachment: bool,
}

impl AttachmentTarget {
    pub fn from_document(document: &Document) -> Self {
        Self {
            document_id: document.id.clone().unwrap_or_default(),
            parent_id: document.parent_id.clone().unwrap_or_default(),
            is_attachment: document.is_attachment,
        }
    }
}

/// Opaque forward-only continuation token issued by the backend.
pub type Cursor = Vec<Value>;

pub type CountMap = BTreeMap<String, u64>;

/// Facet aggregations. `None` means never fetched; an empty map means
/// fetched with no matches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FacetCounts {
    pub doc_types: Option<CountMap>,
    pub branches: Option<CountMap>,
    pub extensions: Option<CountMap>,
}

impl FacetCounts {
    /// Counts after a completed fresh fetch: missing aggregations become empty.
    pub fn loaded(aggregations: Option<&Aggregations>) -> Self {
        let aggs = aggregations.cloned().unwrap_or_default();
        Self {
            doc_types: Some(aggs.doctype_counts.unwrap_or_default()),
            branches: Some(aggs.branchtype_counts.unwrap_or_default()),
            extensions: Some(aggs.extensiontype_counts.unwrap_or_default()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Aggregations {
    pub doctype_counts: Option<CountMap>,
    pub branchtype_counts: Option<CountMap>,
    pub extensiontype_counts: Option<CountMap>,
}

/// A normalized backend response.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchPage {
    pub documents: Vec<Document>,
    pub next_cursor: Option<Cursor>,
    pub total: Option<u64>,
    pub aggregations: Option<Aggregations>,
}

/// Full snapshot the orchestrator decides a fetch from.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchIntent {
    pub terms: Vec<String>,
    pub filters: FilterState,
    pub view: ViewState,
    pub is_continuation: bool,
    pub cursor: Option<Cursor>,
    pub attachment: Option<AttachmentTarget>,
}

// Wire payloads

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchRequest {
    pub queries: Vec<String>,
    pub size: usize,
    pub search_type: MatchMode,
    pub stream: bool,
    pub enable_fuzzy: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_after: Option<Cursor>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub parents_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttachmentRequest {
    pub app_id: String,
    pub parent_app_id: String,
    pub is_attachment: bool,
}
