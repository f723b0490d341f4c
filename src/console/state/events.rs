use crate::console::domain::document::Document;
use crate::console::domain::models::{MatchMode, SearchPage, ViewMode};
use crate::error::SearchError;
use crate::query::UrlParams;

#[derive(Clone, Debug)]
pub enum Message {
    // URL store
    UrlChanged(UrlParams),

    // Search box
    QuerySubmitted(String),
    AdvancedSearchSubmitted {
        query: String,
        rows: Vec<(String, String)>,
    },
    MatchModeChanged(MatchMode),

    // Filter sidebar
    DocTypeToggled(String),
    BranchToggled(String),
    ExtensionToggled(String),
    YearSelected(Option<String>),
    FromDateChanged(Option<String>),
    ToDateChanged(Option<String>),
    DateRangeApplied { from: String, to: String },
    DateRangeCleared,
    ParentsOnlyToggled(bool),
    FuzzyToggled(bool),
    FiltersCleared,

    // View
    ViewModeChanged(ViewMode),
    PageChanged(usize),
    PageSizeChanged(usize),
    LoadMoreRequested,

    // Document links
    AttachmentLinkFollowed(Document),

    // Async events
    SearchCompleted {
        id: u64,
        outcome: Result<SearchPage, SearchError>,
    },
}
