//! Preview and download actions against the document file server.
//!
//! One policy for every view: files whose extension is listed in the preview
//! settings render inline from their HTML conversion, everything else opens
//! in a new tab.

use anyhow::{Context, Result};
use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Duration;

use crate::config::ConsoleConfig;
use crate::error::{SearchError, SearchResult};

pub const EMPTY_PREVIEW: &str = "<p>Preview is empty or could not be generated.</p>";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreviewPlan {
    /// Fetch the rendered HTML and show it in place.
    Inline(Url),
    /// Hand the URL to a new browsing context.
    NewTab(Url),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreviewOutcome {
    Inline(String),
    NewTab(Url),
}

pub struct DocumentActions {
    client: Client,
    file_server: Url,
    inline_extensions: Vec<String>,
}

impl DocumentActions {
    pub fn new(config: &ConsoleConfig) -> Result<Self> {
        let file_server = Url::parse(&config.file_server_url)
            .with_context(|| format!("Invalid file server URL: {}", config.file_server_url))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();
        Ok(Self {
            client,
            file_server,
            inline_extensions: config
                .preview
                .inline_extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
        })
    }

    pub fn view_url(&self, file_path: &str) -> Url {
        self.document_url(file_path, "view")
    }

    pub fn download_url(&self, file_path: &str) -> Url {
        self.document_url(file_path, "download")
    }

    /// Archive of a parent document together with all its attachments.
    pub fn download_all_url(&self, parent_id: &str) -> Url {
        let mut url = self.file_server.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("download_all");
        }
        url.query_pairs_mut().append_pair("parent_app_id", parent_id);
        url
    }

    pub fn plan_preview(&self, file_path: &str, file_name: &str) -> SearchResult<PreviewPlan> {
        if file_path.trim().is_empty() {
            return Err(SearchError::MissingFilePath);
        }
        let url = self.view_url(file_path);
        let inline = file_extension(file_name)
            .is_some_and(|ext| self.inline_extensions.iter().any(|known| *known == ext));
        Ok(if inline {
            PreviewPlan::Inline(url)
        } else {
            PreviewPlan::NewTab(url)
        })
    }

    /// Resolves a preview: inline documents are fetched now, others are
    /// returned as a URL to open.
    pub async fn open(&self, file_path: &str, file_name: &str) -> SearchResult<PreviewOutcome> {
        match self.plan_preview(file_path, file_name)? {
            PreviewPlan::NewTab(url) => Ok(PreviewOutcome::NewTab(url)),
            PreviewPlan::Inline(url) => self.fetch_inline(url).await.map(PreviewOutcome::Inline),
        }
    }

    async fn fetch_inline(&self, url: Url) -> SearchResult<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|error| SearchError::Transport(error.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| SearchError::Transport(error.to_string()))?;

        if !status.is_success() {
            tracing::warn!(
                event = "documents.preview_failed",
                url = %url,
                status = %status,
                "preview generation failed"
            );
            return Err(SearchError::Preview {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                detail: error_detail(&body),
            });
        }

        if body.trim().is_empty() {
            Ok(EMPTY_PREVIEW.to_string())
        } else {
            Ok(body)
        }
    }

    fn document_url(&self, file_path: &str, action: &str) -> Url {
        let mut url = self.file_server.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("api")
                .push("documents")
                .push(file_path);
        }
        url.query_pairs_mut().append_pair("action", action);
        url
    }
}

/// Lower-cased extension, ignoring leading-dot names and trailing dots.
pub fn file_extension(name: &str) -> Option<String> {
    let dot = name.rfind('.')?;
    if dot == 0 || dot == name.len() - 1 {
        return None;
    }
    Some(name[dot + 1..].to_lowercase())
}

/// `detail` or `message` from a JSON error body, else the body itself.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            ["detail", "message"]
                .iter()
                .find_map(|key| json.get(key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions() -> DocumentActions {
        DocumentActions::new(&ConsoleConfig {
            file_server_url: "http://files.local:8000".to_string(),
            ..ConsoleConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("Report.DOCX").as_deref(), Some("docx"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension(".bashrc"), None);
        assert_eq!(file_extension("trailing."), None);
        assert_eq!(file_extension("noext"), None);
    }

    #[test]
    fn test_document_urls_encode_path() {
        let actions = actions();
        assert_eq!(
            actions.download_url("/data/a b.pdf").as_str(),
            "http://files.local:8000/api/documents/%2Fdata%2Fa%20b.pdf?action=download"
        );
        assert_eq!(
            actions.download_all_url("p-1").as_str(),
            "http://files.local:8000/download_all?parent_app_id=p-1"
        );
    }

    #[test]
    fn test_preview_policy_by_extension() {
        let actions = actions();
        assert!(matches!(
            actions.plan_preview("/x/memo.docx", "memo.docx"),
            Ok(PreviewPlan::Inline(_))
        ));
        assert!(matches!(
            actions.plan_preview("/x/page.HTML", "page.HTML"),
            Ok(PreviewPlan::Inline(_))
        ));
        assert!(matches!(
            actions.plan_preview("/x/scan.pdf", "scan.pdf"),
            Ok(PreviewPlan::NewTab(_))
        ));
        assert_eq!(
            actions.plan_preview("  ", "memo.docx"),
            Err(SearchError::MissingFilePath)
        );
    }

    #[test]
    fn test_error_detail_extraction() {
        assert_eq!(error_detail(r#"{"detail":"conversion failed"}"#), "conversion failed");
        assert_eq!(error_detail(r#"{"message":"nope"}"#), "nope");
        assert_eq!(error_detail("plain failure"), "plain failure");
    }
}
