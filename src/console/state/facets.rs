//! Sidebar facet entries derived from backend counts.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::FacetCatalog;
use crate::console::domain::models::CountMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FacetKind {
    DocType,
    Branch,
    Extension,
}

impl FacetKind {
    pub const ALL: [FacetKind; 3] = [FacetKind::DocType, FacetKind::Branch, FacetKind::Extension];

    pub fn title(&self) -> &'static str {
        match self {
            FacetKind::DocType => "Document Types",
            FacetKind::Branch => "Branches",
            FacetKind::Extension => "File Extensions",
        }
    }

    pub fn labels<'a>(&self, catalog: &'a FacetCatalog) -> &'a BTreeMap<String, String> {
        match self {
            FacetKind::DocType => &catalog.doc_types,
            FacetKind::Branch => &catalog.branches,
            FacetKind::Extension => &catalog.extensions,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacetEntry {
    pub code: String,
    pub label: String,
    pub count: u64,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacetGroup {
    pub kind: FacetKind,
    pub entries: Vec<FacetEntry>,
    pub total: u64,
}

/// Builds one sidebar group. `None` counts mean the facet is still loading
/// and yield `None`, never an empty group.
pub fn facet_group(
    kind: FacetKind,
    counts: Option<&CountMap>,
    catalog: &FacetCatalog,
    selected: &BTreeSet<String>,
) -> Option<FacetGroup> {
    let labels = kind.labels(catalog);
    let mut entries: Vec<FacetEntry> = counts?
        .iter()
        .filter(|(code, _)| !code.trim().is_empty())
        .map(|(code, count)| FacetEntry {
            code: code.clone(),
            label: labels.get(code).cloned().unwrap_or_else(|| code.clone()),
            count: *count,
            selected: selected.contains(code),
        })
        .collect();
    entries.sort_by(|a, b| a.label.cmp(&b.label));
    let total = entries.iter().map(|entry| entry.count).sum();

    Some(FacetGroup {
        kind,
        entries,
        total,
    })
}
