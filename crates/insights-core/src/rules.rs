//! Payload validation rules for insight writes.
//!
//! All checks run on every call and accumulate into one [`ValidationErrors`]
//! report; none short-circuits another. The functions are pure.

use std::collections::HashSet;

use crate::domain::{InsightInput, TAG_NAME_MAX_LEN};
use crate::error::ValidationErrors;

pub const TITLE_MIN_LEN: usize = 5;
pub const TITLE_MAX_LEN: usize = 200;
pub const BODY_MIN_LEN: usize = 20;
pub const TAGS_MIN: usize = 1;
pub const TAGS_MAX: usize = 10;

pub const TITLE_LENGTH_MESSAGE: &str = "Must be between 5 and 200 characters.";
pub const BODY_LENGTH_MESSAGE: &str = "Must be at least 20 characters.";
pub const TAG_COUNT_MESSAGE: &str = "Must contain between 1 and 10 tags.";
pub const TAG_DUPLICATE_MESSAGE: &str = "Tags must not contain duplicates.";
pub const TAG_NAME_LENGTH_MESSAGE: &str = "Ensure each tag has no more than 50 characters.";

/// Trim every tag and drop the blank ones, keeping input order.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    tags.iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Structural checks on a candidate insight.
///
/// Title and body are measured after trimming, in characters. The category
/// is accepted as given.
pub fn validate_insight_payload(input: &InsightInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let title_len = input.title.trim().chars().count();
    if !(TITLE_MIN_LEN..=TITLE_MAX_LEN).contains(&title_len) {
        errors.add("title", TITLE_LENGTH_MESSAGE);
    }

    if input.body.trim().chars().count() < BODY_MIN_LEN {
        errors.add("body", BODY_LENGTH_MESSAGE);
    }

    let tags = normalize_tags(&input.tags);
    if !(TAGS_MIN..=TAGS_MAX).contains(&tags.len()) {
        errors.add("tags", TAG_COUNT_MESSAGE);
    }

    let mut seen = HashSet::with_capacity(tags.len());
    if !tags.iter().all(|t| seen.insert(t.as_str())) {
        errors.add("tags", TAG_DUPLICATE_MESSAGE);
    }

    errors.into_result()
}

/// Per-tag length limit imposed by tag storage.
pub fn validate_tag_names<S: AsRef<str>>(tags: &[S]) -> Result<(), ValidationErrors> {
    let too_long = normalize_tags(tags)
        .iter()
        .any(|t| t.chars().count() > TAG_NAME_MAX_LEN);

    if too_long {
        Err(ValidationErrors::single("tags", TAG_NAME_LENGTH_MESSAGE))
    } else {
        Ok(())
    }
}

/// Everything a write must pass before it reaches storage: the payload rules
/// followed by the tag-name limit, in a single report.
pub fn validate_insight_write(input: &InsightInput) -> Result<(), ValidationErrors> {
    let mut errors = validate_insight_payload(input).err().unwrap_or_default();
    if let Err(more) = validate_tag_names(&input.tags) {
        errors.merge(more);
    }
    errors.into_result()
}
