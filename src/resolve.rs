use crate::error::AttachError;
use crate::schema::{aliases, line};

/// Resolved mapping from canonical fields to raw input headers.
///
/// `description` is optional; everything else must resolve or loading fails
/// with a single error naming all missing fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub order_id: String,
    pub line_number: String,
    pub item_code: String,
    pub description: Option<String>,
}

/// Normalize a raw header for alias matching: trim, lowercase, fold spaces
/// and dashes to underscores, collapse underscore runs.
pub fn normalize_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_underscore = false;
    for ch in raw.trim().chars() {
        let ch = match ch {
            ' ' | '\t' | '-' => '_',
            c => c.to_ascii_lowercase(),
        };
        if ch == '_' {
            if !prev_underscore && !out.is_empty() {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(ch);
            prev_underscore = false;
        }
    }
    if out.ends_with('_') {
        out.pop();
    }
    out
}

fn affix_matches(normalized: &str, alias: &str) -> bool {
    normalized == alias
        || normalized.starts_with(&format!("{alias}_"))
        || normalized.ends_with(&format!("_{alias}"))
        || normalized.contains(&format!("_{alias}_"))
}

/// Find the raw header matching one canonical field.
///
/// Two passes over the headers in input order: exact normalized match first,
/// then affix match. The first hit wins, so resolution is deterministic even
/// when several headers would qualify.
fn find_header<'a>(headers: &'a [String], field_aliases: &[&str]) -> Option<&'a str> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

    for (raw, norm) in headers.iter().zip(&normalized) {
        if field_aliases.iter().any(|a| norm == *a) {
            return Some(raw);
        }
    }
    for (raw, norm) in headers.iter().zip(&normalized) {
        if field_aliases.iter().any(|a| affix_matches(norm, a)) {
            return Some(raw);
        }
    }
    None
}

/// Resolve raw input headers to the canonical order-line fields.
pub fn resolve_columns(headers: &[String]) -> Result<ColumnMap, AttachError> {
    let order_id = find_header(headers, aliases::ORDER_ID);
    let line_number = find_header(headers, aliases::LINE_NUMBER);
    let item_code = find_header(headers, aliases::ITEM_CODE);
    let description = find_header(headers, aliases::DESCRIPTION);

    let mut missing = Vec::new();
    if order_id.is_none() {
        missing.push(line::ORDER_ID.to_string());
    }
    if line_number.is_none() {
        missing.push(line::LINE_NUMBER.to_string());
    }
    if item_code.is_none() {
        missing.push(line::ITEM_CODE.to_string());
    }
    if !missing.is_empty() {
        return Err(AttachError::MissingColumns(missing));
    }

    Ok(ColumnMap {
        order_id: order_id.unwrap().to_string(),
        line_number: line_number.unwrap().to_string(),
        item_code: item_code.unwrap().to_string(),
        description: description.map(|h| h.to_string()),
    })
}
