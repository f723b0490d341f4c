use crate::config::{FacetCatalog, SearchSettings};
use crate::console::application::backend::{
    BackendCall, build_attachment_request, build_search_request,
};
use crate::console::domain::document::Document;
use crate::console::domain::filter::FilterState;
use crate::console::domain::models::{
    AttachmentTarget, Cursor, FacetCounts, SearchIntent, SearchPage, ViewMode, ViewState,
};
use crate::console::state::commands::{Command, FetchPlan};
use crate::console::state::events::Message;
use crate::console::state::facets::{FacetGroup, FacetKind, facet_group};
use crate::error::SearchError;
use crate::query::{UrlParams, extract_phrases, format_terms_for_input};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchKind {
    Fresh,
    Continuation,
    Attachment,
}

/// The request the state is currently waiting on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingFetch {
    pub id: u64,
    pub kind: FetchKind,
    pub mode: ViewMode,
}

pub struct ResultsState {
    pub documents: Vec<Document>,
    pub loading: bool,
    pub error: Option<String>,
    pub cursor: Option<Cursor>,
    pub facets: FacetCounts,
    pub total_documents: Option<u64>,
    pub current_search_id: u64,
    pub pending: Option<PendingFetch>,
}

pub struct AppState {
    /// Last URL parameters observed from the store.
    pub url: UrlParams,
    pub terms: Vec<String>,
    pub filters: FilterState,
    pub view: ViewState,
    pub results: ResultsState,
    pub settings: SearchSettings,
    /// Forces the next `UrlChanged` to search even if the parameters did not
    /// change (first observation, resubmits, advanced filters, match mode).
    refresh_on_url: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(SearchSettings::default())
    }
}

impl AppState {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            url: UrlParams::default(),
            terms: Vec::new(),
            filters: FilterState::default(),
            view: ViewState::new(settings.grid_page_size),
            results: ResultsState {
                documents: Vec::new(),
                loading: false,
                error: None,
                cursor: None,
                facets: FacetCounts::default(),
                total_documents: None,
                current_search_id: 0,
                pending: None,
            },
            settings,
            refresh_on_url: true,
        }
    }

    pub fn with_filters(mut self, filters: FilterState) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_view(mut self, view: ViewState) -> Self {
        self.view = ViewState {
            page: view.page.max(1),
            page_size: view.page_size.max(1),
            ..view
        };
        self
    }

    pub fn update(&mut self, msg: Message) -> Command {
        match msg {
            Message::UrlChanged(params) => {
                if params == self.url && !self.refresh_on_url {
                    return Command::None;
                }
                self.refresh_on_url = false;
                if let Some(mode) = params.match_mode {
                    self.filters.match_mode = mode;
                }
                self.terms = params.terms();
                self.url = params;
                self.run_search(false)
            }
            Message::QuerySubmitted(raw) => {
                let terms = extract_phrases(&raw);
                self.filters.simple_filters.clear();
                self.view.page = 1;
                self.refresh_on_url = true;
                Command::PushUrl(UrlParams::search(&terms, self.filters.match_mode))
            }
            Message::AdvancedSearchSubmitted { query, rows } => {
                let terms = extract_phrases(&query);
                self.filters.set_simple_filters(rows);
                self.view.page = 1;
                self.refresh_on_url = true;
                Command::PushUrl(UrlParams::search(&terms, self.filters.match_mode))
            }
            Message::MatchModeChanged(mode) => {
                if mode == self.filters.match_mode {
                    return Command::None;
                }
                self.filters.match_mode = mode;
                self.view.page = 1;
                self.refresh_on_url = true;
                Command::PushUrl(UrlParams {
                    raw_query: self.url.raw_query.clone(),
                    match_mode: Some(mode),
                    attachment: None,
                })
            }
            Message::DocTypeToggled(code) => self.mutate_filters(|f| f.toggle_doc_type(&code)),
            Message::BranchToggled(code) => self.mutate_filters(|f| f.toggle_branch(&code)),
            Message::ExtensionToggled(code) => self.mutate_filters(|f| f.toggle_extension(&code)),
            Message::YearSelected(year) => self.mutate_filters(|f| f.set_year(year)),
            Message::FromDateChanged(date) => self.mutate_filters(|f| f.set_from_date(date)),
            Message::ToDateChanged(date) => self.mutate_filters(|f| f.set_to_date(date)),
            Message::DateRangeApplied { from, to } => {
                let mut next = self.filters.clone();
                match next.apply_date_range(&from, &to) {
                    Ok(()) => self.mutate_filters(|f| *f = next),
                    Err(error) => {
                        self.results.current_search_id += 1;
                        self.reject(error)
                    }
                }
            }
            Message::DateRangeCleared => self.mutate_filters(FilterState::clear_date_range),
            Message::ParentsOnlyToggled(on) => self.mutate_filters(|f| f.parents_only = on),
            Message::FuzzyToggled(on) => self.mutate_filters(|f| f.fuzzy = on),
            Message::FiltersCleared => self.mutate_filters(FilterState::clear_all),
            Message::ViewModeChanged(mode) => {
                if mode == self.view.mode {
                    return Command::None;
                }
                self.view.mode = mode;
                self.view.page = 1;
                if self.has_criteria() && !self.url.is_attachment_view() {
                    self.run_search(false)
                } else {
                    Command::None
                }
            }
            Message::PageChanged(page) => {
                let page = page.max(1);
                if self.view.mode != ViewMode::Grid || page == self.view.page {
                    return Command::None;
                }
                self.view.page = page;
                self.run_search(false)
            }
            Message::PageSizeChanged(size) => {
                let size = size.max(1);
                if size == self.view.page_size {
                    return Command::None;
                }
                self.view.page_size = size;
                self.view.page = 1;
                if self.view.mode == ViewMode::Grid {
                    self.run_search(false)
                } else {
                    Command::None
                }
            }
            Message::LoadMoreRequested => {
                if self.can_load_more() {
                    self.run_search(true)
                } else {
                    Command::None
                }
            }
            Message::AttachmentLinkFollowed(document) => Command::OpenNavigation(
                UrlParams::attachment(AttachmentTarget::from_document(&document)),
            ),
            Message::SearchCompleted { id, outcome } => {
                self.apply_completion(id, outcome);
                Command::None
            }
        }
    }

    /// Load more is offered only for a paginated reader list with a cursor.
    pub fn can_load_more(&self) -> bool {
        self.view.mode == ViewMode::Reader
            && !self.results.loading
            && !self.url.is_attachment_view()
            && self.results.cursor.is_some()
    }

    pub fn page_count(&self) -> u64 {
        self.results
            .total_documents
            .map(|total| self.view.page_count(total))
            .unwrap_or(0)
    }

    /// Terms as shown back in the header search box.
    pub fn header_query(&self) -> String {
        format_terms_for_input(&self.terms)
    }

    pub fn has_criteria(&self) -> bool {
        !self.terms.is_empty() || self.filters.has_simple_filters()
    }

    pub fn facet_group(&self, kind: FacetKind, catalog: &FacetCatalog) -> Option<FacetGroup> {
        let (counts, selected) = match kind {
            FacetKind::DocType => (&self.results.facets.doc_types, &self.filters.doc_types),
            FacetKind::Branch => (&self.results.facets.branches, &self.filters.branches),
            FacetKind::Extension => (&self.results.facets.extensions, &self.filters.extensions),
        };
        facet_group(kind, counts.as_ref(), catalog, selected)
    }

    fn mutate_filters<F>(&mut self, mutate: F) -> Command
    where
        F: FnOnce(&mut FilterState),
    {
        let before = self.filters.clone();
        mutate(&mut self.filters);
        if self.filters == before || self.url.is_attachment_view() {
            return Command::None;
        }
        self.view.page = 1;
        self.run_search(false)
    }

    /// The single place a fetch is decided. Every intent bumps the
    /// generation, so anything still in flight becomes stale.
    fn run_search(&mut self, is_continuation: bool) -> Command {
        self.results.current_search_id += 1;
        let id = self.results.current_search_id;
        let attachment = self.url.attachment.clone();

        if attachment.is_none() && !self.has_criteria() {
            let error = if self.url.raw_query.trim().is_empty() {
                SearchError::MissingCriteria
            } else {
                SearchError::InvalidQuery
            };
            return self.reject(error);
        }

        if !is_continuation {
            self.results.cursor = None;
            self.results.documents.clear();
        }

        let intent = SearchIntent {
            terms: self.terms.clone(),
            filters: self.filters.clone(),
            view: self.view,
            is_continuation,
            cursor: self.results.cursor.clone(),
            attachment,
        };

        let (call, kind) = match &intent.attachment {
            Some(target) => (
                BackendCall::ResolveAttachment(build_attachment_request(target)),
                FetchKind::Attachment,
            ),
            None => match build_search_request(&intent, &self.settings) {
                Ok(request) => {
                    let kind = if is_continuation {
                        FetchKind::Continuation
                    } else {
                        FetchKind::Fresh
                    };
                    (BackendCall::Search(request), kind)
                }
                Err(error) => return self.reject(error),
            },
        };

        tracing::info!(
            event = "search.dispatched",
            id,
            endpoint = call.endpoint(),
            kind = ?kind,
            mode = ?self.view.mode,
            page = self.view.page,
            terms = intent.terms.len(),
            "search dispatched"
        );

        self.results.loading = true;
        self.results.error = None;
        self.results.pending = Some(PendingFetch {
            id,
            kind,
            mode: self.view.mode,
        });
        Command::Fetch(FetchPlan { id, call })
    }

    /// Validation failure: nothing is sent and the result set is cleared.
    fn reject(&mut self, error: SearchError) -> Command {
        if error.is_validation() {
            tracing::info!(event = "search.rejected", error = %error, "search not sent");
        } else {
            tracing::warn!(event = "search.rejected", error = %error, "search not sent");
        }
        let was_pending = self.results.pending.take().is_some();
        self.results.documents.clear();
        self.results.cursor = None;
        self.results.total_documents = None;
        self.results.loading = false;
        self.results.error = Some(error.to_string());
        if was_pending {
            Command::Cancel
        } else {
            Command::None
        }
    }

    fn apply_completion(&mut self, id: u64, outcome: Result<SearchPage, SearchError>) {
        let pending = match self.results.pending {
            Some(pending) if pending.id == id && id == self.results.current_search_id => pending,
            _ => {
                tracing::debug!(
                    event = "search.stale_discarded",
                    id,
                    current = self.results.current_search_id,
                    "discarding superseded response"
                );
                return;
            }
        };
        self.results.pending = None;
        self.results.loading = false;

        let page = match outcome {
            Ok(page) => page,
            Err(error) => {
                tracing::warn!(event = "search.failed", id, error = %error, "search failed");
                self.results.documents.clear();
                self.results.cursor = None;
                self.results.error = Some(error.to_string());
                return;
            }
        };

        tracing::info!(
            event = "search.applied",
            id,
            kind = ?pending.kind,
            documents = page.documents.len(),
            "search results applied"
        );
        self.results.error = None;

        match pending.kind {
            FetchKind::Attachment => {
                self.results.documents = page.documents;
                self.results.cursor = None;
                self.results.total_documents = page.total;
            }
            FetchKind::Fresh => {
                self.results.documents = page.documents;
                self.results.cursor = page.next_cursor;
                self.results.total_documents = page.total;
                self.results.facets = FacetCounts::loaded(page.aggregations.as_ref());
            }
            FetchKind::Continuation => {
                self.results.documents.extend(page.documents);
                self.results.cursor = page.next_cursor;
            }
        }
    }
}
