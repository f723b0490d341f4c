//! Canonical document shape and response normalization.
//!
//! The backend sends loosely-typed records. Each one is mapped field by field
//! into [`Document`]; every key it carried is also kept verbatim in
//! [`Document::fields`]. When serialized, canonical values win on their own
//! keys and all other keys pass through untouched.

use chrono::DateTime;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::models::{Aggregations, CountMap, SearchPage};
use crate::error::{SearchError, SearchResult};

pub const NO_TEXT: &str = "No text found";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    /// `ProphecyId`
    pub id: Option<String>,
    /// `ParentProphecyId`
    pub parent_id: Option<String>,
    /// `DocType`, else `DocumentType`, else `Branch`
    pub doc_type: Option<String>,
    /// `Text`, else a placeholder
    pub text: String,
    /// `From`, else `Branch`
    pub from: Option<String>,
    pub to: Option<String>,
    pub report_number: Option<String>,
    /// Epoch seconds
    pub ingestion_date: Option<i64>,
    /// Epoch seconds
    pub document_date: Option<i64>,
    pub file_name: Option<String>,
    pub system_path: Option<String>,
    pub attachments: Option<String>,
    pub attachment_count: Option<u64>,
    pub highlighted_text: Option<String>,
    pub is_attachment: bool,
    /// Every field exactly as the backend sent it.
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn from_raw(raw: &Value) -> Self {
        let empty = Map::new();
        let fields = raw.as_object().unwrap_or(&empty);

        Self {
            id: string_field(fields, "ProphecyId"),
            parent_id: string_field(fields, "ParentProphecyId"),
            doc_type: string_field(fields, "DocType")
                .or_else(|| string_field(fields, "DocumentType"))
                .or_else(|| string_field(fields, "Branch")),
            text: string_field(fields, "Text").unwrap_or_else(|| NO_TEXT.to_string()),
            from: string_field(fields, "From").or_else(|| string_field(fields, "Branch")),
            to: string_field(fields, "To"),
            report_number: string_field(fields, "ReportNumber"),
            ingestion_date: epoch_field(fields, "IngestionDate"),
            document_date: epoch_field(fields, "DocumentDate"),
            file_name: string_field(fields, "FileName"),
            system_path: string_field(fields, "SystemPath"),
            attachments: string_field(fields, "Attachments"),
            attachment_count: fields.get("a_count").and_then(Value::as_u64),
            highlighted_text: string_field(fields, "highlighted_text"),
            is_attachment: flag(fields.get("IsAttachment")),
            fields: fields.clone(),
        }
    }

    /// Key for list rendering: the backend id, else file name and date.
    pub fn key(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!(
                "{}-{}",
                self.file_name.as_deref().unwrap_or("undefined"),
                self.document_date
                    .map(|date| date.to_string())
                    .unwrap_or_else(|| "undefined".to_string())
            ),
        }
    }

    /// Last segment of the stored path.
    pub fn display_file_name(&self) -> Option<&str> {
        self.system_path
            .as_deref()
            .and_then(|path| path.rsplit('/').next())
            .filter(|name| !name.is_empty())
    }

    /// Text for the attachment/parent link, if the document has one.
    pub fn attachment_link_label(&self) -> Option<String> {
        if self.is_attachment {
            return Some("Show Parent".to_string());
        }
        let has_attachments = self
            .attachments
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty());
        if !has_attachments {
            return None;
        }
        match self.attachment_count {
            Some(1) => Some("1 Attachment".to_string()),
            Some(count) if count > 1 => Some(format!("{count} Attachments")),
            _ => Some("View Attachments".to_string()),
        }
    }

    /// Highlighted snippet, else the plain text.
    pub fn snippet(&self) -> &str {
        self.highlighted_text.as_deref().unwrap_or(&self.text)
    }

    /// JSON view: raw fields first, canonical values layered on top.
    pub fn to_json(&self) -> Value {
        let mut out = self.fields.clone();
        let mut put = |key: &str, value: Option<Value>| {
            if let Some(value) = value {
                out.insert(key.to_string(), value);
            }
        };
        put("DocType", self.doc_type.clone().map(Value::from));
        put("Text", Some(Value::from(self.text.clone())));
        put("From", self.from.clone().map(Value::from));
        put("To", self.to.clone().map(Value::from));
        put("ReportNumber", self.report_number.clone().map(Value::from));
        put("IngestionDate", self.ingestion_date.map(Value::from));
        put("DocumentDate", self.document_date.map(Value::from));
        put("FileName", self.file_name.clone().map(Value::from));
        put("IsAttachment", Some(Value::Bool(self.is_attachment)));
        Value::Object(out)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Maps a raw response body onto canonical documents.
pub fn normalize(response: &Value) -> SearchResult<Vec<Document>> {
    match response.get("documents").and_then(Value::as_array) {
        Some(items) => Ok(items.iter().map(Document::from_raw).collect()),
        None => {
            tracing::error!(
                event = "backend.normalize.invalid_shape",
                "response carries no document list"
            );
            Err(SearchError::Shape)
        }
    }
}

/// Normalizes a full response: documents, cursor, total and aggregations.
pub fn parse_page(response: &Value) -> SearchResult<SearchPage> {
    let documents = normalize(response)?;
    let next_cursor = response
        .get("next_search_after")
        .and_then(Value::as_array)
        .cloned();
    let total = response.get("total").and_then(Value::as_u64);
    let aggregations = response
        .get("aggregations")
        .filter(|value| value.is_object())
        .map(|aggs| Aggregations {
            doctype_counts: count_map(aggs.get("doctype_counts")),
            branchtype_counts: count_map(aggs.get("branchtype_counts")),
            extensiontype_counts: count_map(aggs.get("extensiontype_counts")),
        });

    Ok(SearchPage {
        documents,
        next_cursor,
        total,
        aggregations,
    })
}

/// Formats epoch seconds as `MM/DD/YYYY hh:mm AM` in UTC.
pub fn format_epoch(seconds: Option<i64>) -> String {
    seconds
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%m/%d/%Y %I:%M %p").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn epoch_field(fields: &Map<String, Value>, key: &str) -> Option<i64> {
    match fields.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn count_map(value: Option<&Value>) -> Option<CountMap> {
    let object = value?.as_object()?;
    Some(
        object
            .iter()
            .filter_map(|(code, count)| {
                count
                    .as_u64()
                    .or_else(|| count.as_f64().map(|f| f as u64))
                    .map(|count| (code.clone(), count))
            })
            .collect(),
    )
}
