//! Validation helpers and constants for project submissions

use regex::Regex;

use gagasan_common::{Error, Result};

/// Maximum project title length
pub const MAX_TITLE_LENGTH: usize = 255;

/// Maximum length of a single tag
pub const MAX_TAG_LENGTH: usize = 50;

/// Maximum access request reason length
pub const MAX_REASON_LENGTH: usize = 1000;

/// Maximum poster size (5 MiB)
pub const MAX_POSTER_BYTES: i64 = 5 * 1024 * 1024;

/// Accepted poster content types
pub const POSTER_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Hosts accepted for source-code links
pub const SOURCE_CODE_HOSTS: &[&str] = &["github.com", "drive.google.com"];

lazy_static::lazy_static! {
    /// Category slug validation regex
    /// Allows lowercase alphanumeric characters with hyphens
    /// No leading/trailing hyphens, minimum 1 character
    pub static ref CATEGORY_SLUG_REGEX: Regex =
        Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$").unwrap();

    /// http(s) URL with a host part
    static ref HTTP_URL_REGEX: Regex =
        Regex::new(r"^(?i)https?://([a-z0-9.-]+)(:[0-9]{1,5})?([/?#][^\s]*)?$").unwrap();
}

/// Validate a category slug
pub fn validate_category_slug(slug: &str) -> bool {
    if !CATEGORY_SLUG_REGEX.is_match(slug) {
        return false;
    }

    // Check for double hyphens
    !slug.contains("--")
}

/// Lower-cased host of an http(s) URL, or `None` if the URL is malformed
pub fn url_host(url: &str) -> Option<String> {
    HTTP_URL_REGEX
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|host| host.as_str().to_ascii_lowercase())
}

pub fn validate_demo_link(url: &str) -> Result<()> {
    match url_host(url) {
        Some(_) => Ok(()),
        None => Err(Error::Validation(format!(
            "Demo link '{}' is not a valid http(s) URL",
            url
        ))),
    }
}

/// Source code must live on GitHub or Google Drive
pub fn validate_source_code_link(url: &str) -> Result<()> {
    let host = url_host(url).ok_or_else(|| {
        Error::Validation(format!("Source code link '{}' is not a valid URL", url))
    })?;

    let host = host.strip_prefix("www.").unwrap_or(&host);
    if SOURCE_CODE_HOSTS.contains(&host) {
        Ok(())
    } else {
        Err(Error::Validation(
            "Source code link must be hosted on github.com or drive.google.com".to_string(),
        ))
    }
}

pub fn validate_poster(content_type: &str, size_bytes: i64) -> Result<()> {
    if !POSTER_CONTENT_TYPES.contains(&content_type) {
        return Err(Error::Validation(format!(
            "Poster must be JPEG, PNG or WebP, got '{}'",
            content_type
        )));
    }
    if size_bytes <= 0 {
        return Err(Error::Validation("Poster image is empty".to_string()));
    }
    if size_bytes > MAX_POSTER_BYTES {
        return Err(Error::Validation(format!(
            "Poster is {} bytes, maximum is {} bytes",
            size_bytes, MAX_POSTER_BYTES
        )));
    }
    Ok(())
}

/// Split comma-separated tag input into normalized tags.
///
/// Each tag is trimmed and lower-cased; empty entries and duplicates are dropped,
/// first occurrence wins.
pub fn parse_tags(input: &str) -> Result<Vec<String>> {
    let mut tags: Vec<String> = Vec::new();
    for raw in input.split(',') {
        let tag = raw.trim().to_lowercase();
        if tag.is_empty() || tags.contains(&tag) {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LENGTH {
            return Err(Error::Validation(format!(
                "Tag '{}' exceeds {} characters",
                tag, MAX_TAG_LENGTH
            )));
        }
        tags.push(tag);
    }
    Ok(tags)
}

/// Validate and de-duplicate category slugs, preserving order
pub fn normalize_categories(categories: &[String]) -> Result<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(categories.len());
    for slug in categories {
        if !validate_category_slug(slug) {
            return Err(Error::Validation(format!("Invalid category slug '{}'", slug)));
        }
        if !normalized.contains(slug) {
            normalized.push(slug.clone());
        }
    }
    Ok(normalized)
}

pub fn validate_title(title: &str) -> Result<()> {
    let length = title.trim().chars().count();
    if length == 0 {
        return Err(Error::Validation("Title must not be empty".to_string()));
    }
    if length > MAX_TITLE_LENGTH {
        return Err(Error::Validation(format!(
            "Title must be ≤{} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_reason(reason: &str) -> Result<()> {
    if reason.chars().count() > MAX_REASON_LENGTH {
        return Err(Error::Validation(format!(
            "Reason must be ≤{} characters",
            MAX_REASON_LENGTH
        )));
    }
    Ok(())
}
