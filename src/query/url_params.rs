//! URL-carried console state.
//!
//! The router is an opaque store; this module only knows how to read the
//! parameters out of a URL and how to write them back.

use reqwest::Url;

use super::parser::{parse_terms, serialize_terms};
use crate::console::domain::models::{AttachmentTarget, MatchMode};

pub const QUERY_PARAM: &str = "q";
pub const MATCH_MODE_PARAM: &str = "type";
pub const DOCUMENT_ID_PARAM: &str = "ProphecyId";
pub const PARENT_ID_PARAM: &str = "ParentProphecyId";
pub const IS_ATTACHMENT_PARAM: &str = "isAttachment";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UrlParams {
    /// Raw `q` value, normally a JSON array of terms.
    pub raw_query: String,
    pub match_mode: Option<MatchMode>,
    pub attachment: Option<AttachmentTarget>,
}

impl UrlParams {
    /// Parameters for a search over `terms`. No terms means the bare page.
    pub fn search(terms: &[String], match_mode: MatchMode) -> Self {
        if terms.is_empty() {
            return Self::default();
        }
        Self {
            raw_query: serialize_terms(terms),
            match_mode: Some(match_mode),
            attachment: None,
        }
    }

    pub fn attachment(target: AttachmentTarget) -> Self {
        Self {
            attachment: Some(target),
            ..Self::default()
        }
    }

    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::default();
        let mut document_id = None;
        let mut parent_id = String::new();
        let mut is_attachment = false;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                QUERY_PARAM => params.raw_query = value.into_owned(),
                MATCH_MODE_PARAM => params.match_mode = MatchMode::parse(&value),
                DOCUMENT_ID_PARAM if !value.is_empty() => document_id = Some(value.into_owned()),
                PARENT_ID_PARAM => parent_id = value.into_owned(),
                IS_ATTACHMENT_PARAM => is_attachment = value == "true",
                _ => {}
            }
        }

        params.attachment = document_id.map(|document_id| AttachmentTarget {
            document_id,
            parent_id,
            is_attachment,
        });
        params
    }

    /// Parses a bare query string such as `q=%5B%22a%22%5D&type=all`.
    pub fn from_query(query: &str) -> Self {
        match Url::parse("http://localhost/") {
            Ok(mut url) => {
                url.set_query(Some(query.trim_start_matches('?')));
                Self::from_url(&url)
            }
            Err(_) => Self::default(),
        }
    }

    pub fn terms(&self) -> Vec<String> {
        parse_terms(&self.raw_query)
    }

    pub fn is_attachment_view(&self) -> bool {
        self.attachment.is_some()
    }

    /// Writes these parameters onto `base`, replacing any existing query.
    pub fn apply_to(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);

        if let Some(target) = &self.attachment {
            url.query_pairs_mut()
                .append_pair(DOCUMENT_ID_PARAM, &target.document_id)
                .append_pair(PARENT_ID_PARAM, &target.parent_id)
                .append_pair(
                    IS_ATTACHMENT_PARAM,
                    if target.is_attachment { "true" } else { "false" },
                );
        } else if !self.raw_query.trim().is_empty() {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(QUERY_PARAM, &self.raw_query);
            if let Some(mode) = self.match_mode {
                pairs.append_pair(MATCH_MODE_PARAM, mode.as_str());
            }
        }
        url
    }
}
