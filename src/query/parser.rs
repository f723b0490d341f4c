use nom::{
    IResult, Parser,
    bytes::complete::take_while,
    character::complete::char,
    multi::many0,
    sequence::{delimited, preceded},
};
use serde_json::Value;

/// Turns the raw `q` URL parameter into an ordered list of search terms.
///
/// A JSON array of strings yields its non-blank elements in order. Anything
/// else (bad JSON, a scalar, an array holding non-strings) degrades to the
/// whole raw string as a single term, or to no terms when it is blank.
pub fn parse_terms(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) if items.iter().all(Value::is_string) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(term) if !term.trim().is_empty() => Some(term),
                _ => None,
            })
            .collect(),
        _ => whole_input(raw),
    }
}

fn whole_input(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        Vec::new()
    } else {
        vec![raw.to_string()]
    }
}

/// Extracts the terms typed into the search box.
///
/// Double-quoted phrases become terms; blank phrases are dropped. Input
/// without any quoted phrase is taken as one trimmed term.
pub fn extract_phrases(input: &str) -> Vec<String> {
    let phrases: Vec<String> = match many0(next_phrase).parse(input) {
        Ok((_, found)) => found
            .into_iter()
            .filter(|phrase| !phrase.trim().is_empty())
            .map(str::to_string)
            .collect(),
        Err(_) => Vec::new(),
    };

    if phrases.is_empty() && !input.trim().is_empty() {
        vec![input.trim().to_string()]
    } else {
        phrases
    }
}

fn next_phrase(input: &str) -> IResult<&str, &str> {
    preceded(take_while(|c: char| c != '"'), quoted).parse(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_while(|c: char| c != '"'), char('"')).parse(input)
}

/// Renders terms back into the search box as `"a", "b"`.
pub fn format_terms_for_input(terms: &[String]) -> String {
    terms
        .iter()
        .map(|term| format!("\"{term}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Serializes terms the way the `q` parameter carries them.
pub fn serialize_terms(terms: &[String]) -> String {
    Value::from(terms.to_vec()).to_string()
}
