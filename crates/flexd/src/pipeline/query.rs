//! Query-string parsing.

use flex_types::QueryParams;
use url::form_urlencoded;

use super::errors::PipelineError;

/// Parses a query string from the URL, skipping anything undecodable.
pub(crate) fn parse_lenient(raw: &str) -> QueryParams {
    collect(raw)
}

/// Parses a query string supplied in an envelope.
///
/// Rejects `;` separators and percent signs not followed by two hex digits.
pub(crate) fn parse_strict(raw: &str) -> Result<QueryParams, PipelineError> {
    if raw.contains(';') {
        return Err(PipelineError::malformed_query(raw, "invalid semicolon separator"));
    }
    let bytes = raw.as_bytes();
    for (index, byte) in bytes.iter().enumerate() {
        if *byte != b'%' {
            continue;
        }
        let valid = [index + 1, index + 2]
            .into_iter()
            .all(|position| bytes.get(position).is_some_and(u8::is_ascii_hexdigit));
        if !valid {
            return Err(PipelineError::malformed_query(raw, "invalid percent escape"));
        }
    }
    Ok(collect(raw))
}

fn collect(raw: &str) -> QueryParams {
    let mut params = QueryParams::new();
    for (key, value) in form_urlencoded::parse(raw.trim_start_matches('?').as_bytes()) {
        params
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    params
}
