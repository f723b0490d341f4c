//! Backend adapter: wire payloads out, normalized pages in.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::config::SearchSettings;
use crate::console::domain::document::parse_page;
use crate::console::domain::models::{
    AttachmentRequest, AttachmentTarget, SearchIntent, SearchPage, SearchRequest, ViewMode,
};
use crate::error::{SearchError, SearchResult};

pub const SEARCH_ENDPOINT: &str = "/search";
pub const ATTACHMENT_ENDPOINT: &str = "/handle-attachment-link";

/// One outbound call the orchestrator asked for.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    Search(SearchRequest),
    ResolveAttachment(AttachmentRequest),
}

impl BackendCall {
    pub fn endpoint(&self) -> &'static str {
        match self {
            BackendCall::Search(_) => SEARCH_ENDPOINT,
            BackendCall::ResolveAttachment(_) => ATTACHMENT_ENDPOINT,
        }
    }
}

/// Builds the faceted search payload for `intent`.
///
/// Grid mode sends its page size and a row offset; reader mode sends the
/// fixed batch size and, for continuations only, the cursor.
pub fn build_search_request(
    intent: &SearchIntent,
    settings: &SearchSettings,
) -> SearchResult<SearchRequest> {
    let date_range = intent.filters.effective_date_range()?;
    let grid = intent.view.mode == ViewMode::Grid;

    Ok(SearchRequest {
        queries: intent.terms.clone(),
        size: if grid {
            intent.view.page_size
        } else {
            settings.page_size
        },
        search_type: intent.filters.match_mode,
        stream: false,
        enable_fuzzy: intent.filters.fuzzy,
        filters: intent.filters.backend_filters(&settings.fields),
        date_range,
        search_after: if intent.is_continuation {
            intent.cursor.clone()
        } else {
            None
        },
        parents_only: intent.filters.parents_only,
        from: grid.then(|| intent.view.offset()),
    })
}

pub fn build_attachment_request(target: &AttachmentTarget) -> AttachmentRequest {
    AttachmentRequest {
        app_id: target.document_id.clone(),
        parent_app_id: target.parent_id.clone(),
        is_attachment: target.is_attachment,
    }
}

/// HTTP client for the search backend.
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn execute(&self, call: &BackendCall) -> SearchResult<SearchPage> {
        match call {
            BackendCall::Search(request) => self.post(call.endpoint(), request).await,
            BackendCall::ResolveAttachment(request) => self.post(call.endpoint(), request).await,
        }
    }

    async fn post<T: Serialize>(&self, endpoint: &str, body: &T) -> SearchResult<SearchPage> {
        let started = Instant::now();
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|error| {
                tracing::warn!(
                    event = "backend.request_failed",
                    url = %url,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %error,
                    "search backend request failed"
                );
                SearchError::Transport(error.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                event = "backend.non_success_status",
                url = %url,
                status = %status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "search backend returned non-success status"
            );
            return Err(SearchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body: Value = response.json().await.map_err(|error| {
            tracing::error!(
                event = "backend.decode_failed",
                url = %url,
                error = %error,
                "search backend response is not JSON"
            );
            SearchError::Shape
        })?;

        let page = parse_page(&body)?;
        tracing::debug!(
            event = "backend.completed",
            url = %url,
            documents = page.documents.len(),
            total = ?page.total,
            has_cursor = page.next_cursor.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search backend call completed"
        );
        Ok(page)
    }
}
