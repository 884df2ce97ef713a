//! File and directory naming helpers.

use crate::config::FALLBACK_PROJECT_NAME;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use time::OffsetDateTime;

static INVALID_DIR_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("valid dir-name regex"));
static WORD_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[_-]").expect("valid separator regex"));

/// Turns a display name into a project directory name.
///
/// Spaces become `_`, everything outside `[A-Za-z0-9_-]` is dropped, and an
/// empty result falls back to `Untitled_Project`.
pub fn sanitize_project_name(name: &str) -> String {
    let underscored = name.replace(' ', "_");
    let sanitized = INVALID_DIR_CHARS_RE.replace_all(&underscored, "");
    if sanitized.is_empty() {
        FALLBACK_PROJECT_NAME.to_string()
    } else {
        sanitized.into_owned()
    }
}

/// Derives a readable title from a paper file name:
/// `deep_residual-learning.md` -> `Deep Residual Learning`.
pub fn extract_title_from_filename(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name);
    title_case(&WORD_SEPARATOR_RE.replace_all(stem, " "))
}

/// Upper-cases the first letter of every letter run and lower-cases the rest.
fn title_case(value: &str) -> String {
    let mut titled = String::with_capacity(value.len());
    let mut previous_is_letter = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                titled.extend(ch.to_lowercase());
            } else {
                titled.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            titled.push(ch);
            previous_is_letter = false;
        }
    }
    titled
}

/// `YYYYMMDD_HHMMSS` in UTC.
pub(crate) fn timestamp() -> String {
    timestamp_from(OffsetDateTime::now_utc())
}

/// `YYYYMMDD_HHMMSS_ffffff` in UTC.
pub(crate) fn timestamp_micros() -> String {
    let now = OffsetDateTime::now_utc();
    format!("{}_{:06}", timestamp_from(now), now.microsecond())
}

fn timestamp_from(now: OffsetDateTime) -> String {
    format!(
        "{:04}{:02}{:02}_{:02}{:02}{:02}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}
