//! Bookmark form validation.

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;

/// Why a bookmark draft was refused. `Display` is the user-facing warning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a title.")]
    EmptyTitle,
    #[error("Please enter a URL.")]
    EmptyUrl,
    #[error("Please enter a valid URL (include https://)")]
    InvalidUrl,
}

/// Trimmed, accepted bookmark input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidBookmark {
    pub title: String,
    pub url: String,
}

/// Trim both fields and require a title plus a well-formed absolute URL.
///
/// # Errors
///
/// Returns the first failing rule, checked in field order.
pub fn validate_bookmark_input(title: &str, url: &str) -> Result<ValidBookmark, ValidationError> {
    let title = title.trim();
    let url = url.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }
    if !is_absolute_url(url) {
        return Err(ValidationError::InvalidUrl);
    }
    Ok(ValidBookmark { title: title.to_owned(), url: url.to_owned() })
}

/// WHATWG parse, the same rule browsers apply to `new URL(value)`.
#[must_use]
pub fn is_absolute_url(value: &str) -> bool {
    url::Url::parse(value).is_ok()
}
