//! Maps opaque engine failure text onto [`JobError`].
//!
//! Rules are checked in order against the lowercased text and the first
//! match wins. Text that matches nothing is passed through unchanged.

use crate::error::{JobError, Restriction};

const FILTER_REJECTION: &str = "does not pass filter";

/// Substring rules for content restrictions, in precedence order.
const RESTRICTION_RULES: &[(&[&str], Restriction)] = &[
    (&["private video", "sign in"], Restriction::PrivateOrLogin),
    (&["copyright", "blocked"], Restriction::Copyright),
    (&["age"], Restriction::AgeRestricted),
    (&["unavailable", "not available"], Restriction::Unavailable),
    (&["live"], Restriction::LiveStream),
    (&["premieres", "scheduled"], Restriction::NotPremiered),
    (&["members only"], Restriction::MembersOnly),
    (&["unsupported url"], Restriction::UnsupportedUrl),
];

/// Classify raw engine failure text.
///
/// `max_duration_secs` is the configured duration limit, reported in whole
/// minutes when the duration filter rejected the item.
pub fn classify(raw: &str, max_duration_secs: u64) -> JobError {
    let lower = raw.to_lowercase();

    if lower.contains(FILTER_REJECTION) {
        let limit_minutes = lower
            .contains("duration")
            .then_some(max_duration_secs / 60);
        return JobError::DurationTooLong { limit_minutes };
    }

    RESTRICTION_RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| lower.contains(needle)))
        .map(|(_, restriction)| JobError::Restricted(*restriction))
        .unwrap_or_else(|| JobError::Engine(raw.to_string()))
}
