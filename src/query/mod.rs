pub mod parser;
pub mod url_params;

pub use parser::{extract_phrases, format_terms_for_input, parse_terms, serialize_terms};
pub use url_params::UrlParams;
