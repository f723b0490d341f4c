//! Error taxonomy for the search console.
//!
//! Every variant renders as the user-facing message that ends up in the
//! console's `error` field; nothing here is meant to reach a view as a panic.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    // Input validation, raised before any request is sent
    #[error("Please enter a search query or apply filters to begin.")]
    MissingCriteria,
    #[error("Invalid or empty search query.")]
    InvalidQuery,
    #[error("Please provide a complete date range (both start and end dates).")]
    IncompleteDateRange,
    #[error("Invalid date '{0}': expected YYYY-MM-DD.")]
    InvalidDate(String),
    #[error("The \"From\" date cannot be after the \"To\" date.")]
    InvertedDateRange,

    // Transport and HTTP failures
    #[error("Failed to reach the search backend: {0}")]
    Transport(String),
    #[error("API Error: {status} - {reason}.")]
    Status { status: u16, reason: String },

    // Response did not carry a document list
    #[error("Failed to fetch documents.")]
    Shape,

    // Document actions
    #[error("File path is missing, cannot open document.")]
    MissingFilePath,
    #[error("Preview generation failed: {status} {reason}. {detail}")]
    Preview {
        status: u16,
        reason: String,
        detail: String,
    },
}

impl SearchError {
    /// True for errors detected before a request would have been sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SearchError::MissingCriteria
                | SearchError::InvalidQuery
                | SearchError::IncompleteDateRange
                | SearchError::InvalidDate(_)
                | SearchError::InvertedDateRange
        )
    }
}

pub type SearchResult<T> = Result<T, SearchError>;
