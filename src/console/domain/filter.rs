use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use super::models::{DateRange, MatchMode};
use crate::config::FacetFields;
use crate::error::{SearchError, SearchResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Every facet selection the user can make, independent of the URL.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
    pub match_mode: MatchMode,
    pub doc_types: BTreeSet<String>,
    pub branches: BTreeSet<String>,
    pub extensions: BTreeSet<String>,
    pub year: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub parents_only: bool,
    pub fuzzy: bool,
    /// Field/value pairs from the advanced search dialog, keyed by backend field.
    pub simple_filters: BTreeMap<String, String>,
}

impl FilterState {
    pub fn new(match_mode: MatchMode) -> Self {
        Self {
            match_mode,
            ..Self::default()
        }
    }

    pub fn toggle_doc_type(&mut self, code: &str) {
        toggle(&mut self.doc_types, code);
    }

    pub fn toggle_branch(&mut self, code: &str) {
        toggle(&mut self.branches, code);
    }

    pub fn toggle_extension(&mut self, code: &str) {
        toggle(&mut self.extensions, code);
    }

    /// Selecting a year drops any explicit date range.
    pub fn set_year(&mut self, year: Option<String>) {
        self.year = non_blank(year);
        if self.year.is_some() {
            self.from_date = None;
            self.to_date = None;
        }
    }

    /// Setting a date drops the year shorthand.
    pub fn set_from_date(&mut self, date: Option<String>) {
        self.from_date = non_blank(date);
        if self.from_date.is_some() {
            self.year = None;
        }
    }

    pub fn set_to_date(&mut self, date: Option<String>) {
        self.to_date = non_blank(date);
        if self.to_date.is_some() {
            self.year = None;
        }
    }

    /// Applies both ends at once; rejected ranges leave the state untouched.
    /// A blank range means no range and keeps the year.
    pub fn apply_date_range(&mut self, from: &str, to: &str) -> SearchResult<()> {
        validate_date_range(from, to)?;
        self.from_date = non_blank(Some(from.to_string()));
        self.to_date = non_blank(Some(to.to_string()));
        if self.from_date.is_some() {
            self.year = None;
        }
        Ok(())
    }

    pub fn clear_date_range(&mut self) {
        self.from_date = None;
        self.to_date = None;
    }

    pub fn set_simple_filters<I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.simple_filters = rows
            .into_iter()
            .filter(|(field, value)| !field.is_empty() && !value.trim().is_empty())
            .collect();
    }

    /// Restores every field to its default in one step.
    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    pub fn has_simple_filters(&self) -> bool {
        !self.simple_filters.is_empty()
    }

    /// Whether anything besides the search terms narrows the results.
    pub fn is_any_active(&self) -> bool {
        self.year.is_some()
            || self.from_date.is_some()
            || self.to_date.is_some()
            || self.match_mode != MatchMode::Any
            || !self.doc_types.is_empty()
            || !self.branches.is_empty()
            || !self.extensions.is_empty()
            || self.parents_only
    }

    /// Backend filter map. Facet sets contribute only when non-empty; an
    /// advanced-search value replaces a facet set targeting the same field.
    pub fn backend_filters(&self, fields: &FacetFields) -> BTreeMap<String, Vec<String>> {
        let mut filters = BTreeMap::new();
        for (field, values) in [
            (&fields.doc_type, &self.doc_types),
            (&fields.branch, &self.branches),
            (&fields.extension, &self.extensions),
        ] {
            if !values.is_empty() {
                filters.insert(field.clone(), values.iter().cloned().collect());
            }
        }
        for (field, value) in &self.simple_filters {
            filters.insert(field.clone(), vec![value.clone()]);
        }
        filters
    }

    /// Date constraint to send. A year expands to the whole calendar year and
    /// wins over explicit dates; a one-sided range is an error.
    pub fn effective_date_range(&self) -> SearchResult<Option<DateRange>> {
        if let Some(year) = &self.year {
            return Ok(Some(DateRange {
                from: Some(format!("{year}-01-01")),
                to: Some(format!("{year}-12-31")),
            }));
        }
        match (&self.from_date, &self.to_date) {
            (None, None) => Ok(None),
            (Some(from), Some(to)) => Ok(Some(DateRange {
                from: Some(from.clone()),
                to: Some(to.clone()),
            })),
            _ => Err(SearchError::IncompleteDateRange),
        }
    }
}

fn toggle(set: &mut BTreeSet<String>, code: &str) {
    if !set.remove(code) {
        set.insert(code.to_string());
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_date(value: &str) -> SearchResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| SearchError::InvalidDate(value.to_string()))
}

pub fn validate_date_range(from: &str, to: &str) -> SearchResult<()> {
    if from.trim().is_empty() != to.trim().is_empty() {
        return Err(SearchError::IncompleteDateRange);
    }
    if from.trim().is_empty() {
        return Ok(());
    }
    if parse_date(from)? > parse_date(to)? {
        return Err(SearchError::InvertedDateRange);
    }
    Ok(())
}

/// Years offered by the year selector: this year and the nine before it.
pub fn year_options(current_year: i32) -> Vec<String> {
    (0..10).map(|back| (current_year - back).to_string()).collect()
}
