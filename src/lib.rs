pub mod config;
pub mod console;
pub mod error;
pub mod format;
pub mod logging;
pub mod query;

pub use config::{ConsoleConfig, SearchSettings};
pub use console::SearchConsole;
pub use console::application::backend::{BackendCall, BackendClient};
pub use console::application::document_actions::{DocumentActions, PreviewOutcome};
pub use console::domain::document::{Document, normalize};
pub use console::domain::filter::FilterState;
pub use console::domain::models::{MatchMode, SearchPage, ViewMode, ViewState};
pub use console::state::app_state::AppState;
pub use console::state::events::Message;
pub use error::{SearchError, SearchResult};
pub use format::format_document;
pub use query::{UrlParams, extract_phrases, parse_terms};
