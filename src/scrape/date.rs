//! Lenient timestamp parsing for scraped text.
//!
//! [`normalize`] never fails: anything it cannot read becomes the supplied
//! fallback instant, so a bad date can never keep an offer out of a feed.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Offset-qualified layouts, tried after RFC 3339.
const OFFSET_LAYOUTS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Layouts for strings that carried no zone and had a `Z` appended.
const UTC_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%d %H:%M:%S%.fZ"];

/// Parse `raw` into an instant, or return `fallback`.
pub fn normalize(raw: &str, fallback: DateTime<Utc>) -> DateTime<Utc> {
    if raw.trim().is_empty() {
        return fallback;
    }
    parse(raw).unwrap_or_else(|| {
        tracing::debug!(raw, "Unparseable timestamp, using fallback");
        fallback
    })
}

/// Strict counterpart of [`normalize`]: `None` when no layout matches.
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    // Zone-less stamps are read as UTC rather than local time.
    let stamped = if has_zone_marker(raw) {
        raw.to_string()
    } else {
        format!("{}Z", raw)
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&stamped) {
        return Some(dt.with_timezone(&Utc));
    }

    OFFSET_LAYOUTS
        .iter()
        .find_map(|layout| DateTime::parse_from_str(&stamped, layout).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            UTC_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDateTime::parse_from_str(&stamped, layout).ok())
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(&stamped, "%Y-%m-%dZ")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

/// Read availability text such as "Ends tomorrow" or "Ends Mar 5, 2025".
/// Relative and calendar dates resolve to the start of that day in UTC.
pub fn parse_availability(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let mut text = raw.trim();
    if text.get(..4).is_some_and(|word| word.eq_ignore_ascii_case("ends")) {
        text = text[4..].trim_start();
    }
    if text.is_empty() {
        return None;
    }

    let today = now.date_naive().and_hms_opt(0, 0, 0)?.and_utc();
    match text.to_lowercase().as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        _ => {}
    }

    NaiveDate::parse_from_str(text, "%b %d, %Y")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .or_else(|| parse(text))
}

fn has_zone_marker(raw: &str) -> bool {
    if raw.ends_with(['Z', 'z']) {
        return true;
    }
    // An offset sign can only appear after the date/time separator.
    match raw.find(['T', 't', ' ']) {
        Some(split) => raw[split..].contains(['+', '-']),
        None => false,
    }
}
