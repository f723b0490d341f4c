//! Terminal rendering of documents and facets.

use colored::Colorize;
use regex::Regex;
use std::sync::LazyLock;

use crate::console::domain::document::{Document, format_epoch};
use crate::console::state::facets::FacetGroup;

const PREVIEW_CHARS: usize = 150;

static MARK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)<mark>(.*?)</mark>").ok());

pub fn format_document(document: &Document, use_color: bool, full_text: bool) -> String {
    let date = format_epoch(document.document_date);
    let doc_type = document.doc_type.as_deref().unwrap_or("-");
    let file = document
        .file_name
        .as_deref()
        .or_else(|| document.display_file_name())
        .unwrap_or("-");
    let key = document.key();
    let limit = (!full_text).then_some(PREVIEW_CHARS);
    let snippet = render_highlights(document.snippet(), use_color, limit);

    let mut out = if use_color {
        format!(
            "{} {} [{}] {}",
            date.bright_blue(),
            doc_type.bright_yellow(),
            file.bright_green(),
            key.dimmed()
        )
    } else {
        format!("{date} {doc_type} [{file}] {key}")
    };

    if let Some(label) = document.attachment_link_label() {
        let label = if use_color {
            label.cyan().to_string()
        } else {
            label
        };
        out.push_str(&format!("\n  -> {label}"));
    }
    out.push_str(&format!("\n  {snippet}"));
    out
}

/// Renders `<mark>` spans from the backend snippet, optionally truncating to
/// `limit` characters. Without color, highlights are bracketed.
pub fn render_highlights(snippet: &str, use_color: bool, limit: Option<usize>) -> String {
    let mut budget = limit.unwrap_or(usize::MAX);
    let mut truncated = false;
    let mut out = String::new();

    for (text, highlighted) in highlight_segments(snippet) {
        if budget == 0 {
            truncated = true;
            break;
        }
        let text = text.replace(['\n', '\r', '\t'], " ");
        let count = text.chars().count();
        let piece: String = if count > budget {
            truncated = true;
            text.chars().take(budget).collect()
        } else {
            text
        };
        budget = budget.saturating_sub(count);

        if !highlighted {
            out.push_str(&piece);
        } else if use_color {
            out.push_str(&piece.black().on_yellow().to_string());
        } else {
            out.push('[');
            out.push_str(&piece);
            out.push(']');
        }
    }

    if truncated {
        out.push_str("...");
    }
    out
}

fn highlight_segments(snippet: &str) -> Vec<(String, bool)> {
    let Some(mark) = MARK.as_ref() else {
        return vec![(snippet.to_string(), false)];
    };

    let mut segments = Vec::new();
    let mut last = 0;
    for captures in mark.captures_iter(snippet) {
        let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if whole.start() > last {
            segments.push((snippet[last..whole.start()].to_string(), false));
        }
        segments.push((inner.as_str().to_string(), true));
        last = whole.end();
    }
    if last < snippet.len() {
        segments.push((snippet[last..].to_string(), false));
    }
    segments
}

pub fn format_facet_group(title: &str, group: Option<&FacetGroup>, use_color: bool) -> String {
    let Some(group) = group else {
        return format!("{title}: loading");
    };
    let header = format!("{title} ({})", group.total);
    let mut out = if use_color {
        header.bold().to_string()
    } else {
        header
    };
    if group.entries.is_empty() {
        out.push_str("\n  (none)");
    }
    for entry in &group.entries {
        let mark = if entry.selected { "[x]" } else { "[ ]" };
        out.push_str(&format!("\n  {mark} {} ({})", entry.label, entry.count));
    }
    out
}
