use crate::parser::ParseError;

use chrono::{Local, NaiveDate};
use url::Url;

/// Resolves `href` against `base` the way a browser would.
pub fn resolve_link(base: &str, href: &str) -> Result<String, ParseError> {
    let base = Url::parse(base)
        .map_err(|e| ParseError::UrlParseError(format!("Invalid base URL '{}': {}", base, e)))?;
    let resolved = base
        .join(href.trim())
        .map_err(|e| ParseError::UrlParseError(format!("Invalid link '{}': {}", href, e)))?;
    Ok(resolved.into())
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
