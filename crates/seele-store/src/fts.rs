//! FTS5 MATCH query validation.
//!
//! FTS5 aborts the whole statement on a malformed query, so the boolean
//! syntax is checked up front and rejected with a distinguished `BadQuery`
//! instead of surfacing as an opaque SQLite error.
//!
//! Accepted surface: bare terms, prefix terms (`mem*`), exact phrases in
//! double quotes, grouping parentheses, and the `AND` / `OR` / `NOT`
//! operators between terms.

use crate::error::{Result, StoreError};

const OPERATORS: &[&str] = &["AND", "OR", "NOT"];

/// Validate a user-supplied MATCH query.
///
/// Rejects: empty input, unbalanced double quotes, unbalanced parentheses,
/// and an operator at the start or end of the query.
pub fn validate_query(query: &str) -> Result<()> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(StoreError::BadQuery("empty query".into()));
    }

    let mut in_quote = false;
    let mut depth: i32 = 0;
    for ch in trimmed.chars() {
        match ch {
            '"' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                depth -= 1;
                if depth < 0 {
                    return Err(StoreError::BadQuery(format!(
                        "unbalanced parentheses: {trimmed}"
                    )));
                }
            }
            _ => {}
        }
    }
    if in_quote {
        return Err(StoreError::BadQuery(format!("unbalanced quotes: {trimmed}")));
    }
    if depth != 0 {
        return Err(StoreError::BadQuery(format!(
            "unbalanced parentheses: {trimmed}"
        )));
    }

    let tokens = tokenize(trimmed);
    if tokens.is_empty() {
        return Err(StoreError::BadQuery("no search terms".into()));
    }
    let first = tokens.first().map(String::as_str).unwrap_or("");
    let last = tokens.last().map(String::as_str).unwrap_or("");
    if OPERATORS.contains(&first) {
        return Err(StoreError::BadQuery(format!(
            "operator at start of query: {first}"
        )));
    }
    if OPERATORS.contains(&last) {
        return Err(StoreError::BadQuery(format!(
            "operator at end of query: {last}"
        )));
    }

    Ok(())
}

/// Split into terms/operators, treating a quoted phrase as one token and
/// dropping parentheses.
fn tokenize(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;

    for ch in query.chars() {
        match ch {
            '"' => {
                in_quote = !in_quote;
                current.push(ch);
                if !in_quote {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            '(' | ')' if !in_quote => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c if c.is_whitespace() && !in_quote => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
