//! Check-in date resolution
//!
//! Booking sites encode the stay in the URL, each in its own dialect. The
//! resolved date is always ISO `YYYY-MM-DD`.

use chrono::NaiveDate;
use url::Url;

/// Query parameters known to carry the check-in date, compared
/// case-insensitively
pub const CHECK_IN_PARAMS: &[&str] = &[
    "checkin",
    "check_in",
    "checkindate",
    "checkin_date",
    "check_in_date",
    "arrival",
    "arrivaldate",
];

const ISO_FORMAT: &str = "%Y-%m-%d";

/// Normalize a raw date parameter to `YYYY-MM-DD`
///
/// ISO input comes back unchanged. An 8-digit run without separators is read
/// as `MMDDYYYY`, falling back to `YYYYMMDD` when that is not a real date.
/// Anything else is `None`.
#[must_use]
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();

    if raw.len() >= 10 && raw.is_char_boundary(10) {
        let head = &raw[..10];
        if NaiveDate::parse_from_str(head, ISO_FORMAT).is_ok()
            && head.as_bytes()[4] == b'-'
            && head.as_bytes()[7] == b'-'
        {
            return Some(head.to_string());
        }
    }

    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        let mdy = date_from_parts(&raw[4..8], &raw[0..2], &raw[2..4]);
        let ymd = || date_from_parts(&raw[0..4], &raw[4..6], &raw[6..8]);
        return mdy.or_else(ymd).map(|d| d.format(ISO_FORMAT).to_string());
    }

    None
}

/// Check-in date carried by a URL, if any
///
/// Looks at the query string first, then at Booking's split
/// `checkin_year` / `checkin_month` / `checkin_monthday` triple, then at
/// parameters embedded in the fragment (`#/hotel?checkIn=...`).
#[must_use]
pub fn check_in_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let query: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if let Some(date) = from_pairs(&query) {
        return Some(date);
    }
    if let Some(date) = from_split_params(&query) {
        return Some(date);
    }

    let fragment = parsed.fragment()?;
    let fragment_query = fragment.rsplit_once('?').map_or(fragment, |(_, q)| q);
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(fragment_query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    from_pairs(&pairs)
}

/// Check-in date for a page, defaulting to `today`
#[must_use]
pub fn resolve_check_in_date(url: &str, today: NaiveDate) -> String {
    check_in_from_url(url).unwrap_or_else(|| today.format(ISO_FORMAT).to_string())
}

fn from_pairs(pairs: &[(String, String)]) -> Option<String> {
    CHECK_IN_PARAMS.iter().find_map(|name| {
        pairs
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .find_map(|(_, v)| normalize_date(v))
    })
}

fn from_split_params(pairs: &[(String, String)]) -> Option<String> {
    let get = |name: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| v.trim().parse::<u32>().ok())
    };
    let year = i32::try_from(get("checkin_year")?).ok()?;
    let date = NaiveDate::from_ymd_opt(year, get("checkin_month")?, get("checkin_monthday")?)?;
    Some(date.format(ISO_FORMAT).to_string())
}

fn date_from_parts(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}
