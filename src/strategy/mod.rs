//! Scraping strategy engine
//!
//! Each supported booking site gets a `SiteStrategy`: how to tell the page is
//! sold out, where the price lives and what the room is called. `Site` picks
//! the strategy from the page host; `poll` runs the attempt loop over
//! whichever strategy was picked.

pub mod agoda;
pub mod booking;
pub mod dates;
pub mod generic;
pub mod poll;
pub mod price;
pub mod snapshot;

pub use dates::{check_in_from_url, normalize_date, resolve_check_in_date};
pub use poll::{Attempt, Observation, PollReport, PollingPolicy, evaluate_attempt, run_polling};
pub use price::{parse_price, scan_currency_amount};
pub use snapshot::{Locator, PageSnapshot, PageSource, is_visible};

use crate::utils::{DEFAULT_ROOM_TYPE, host_of};

/// Phrases that mean "nothing bookable" on any site
pub const SOLD_OUT_PHRASES: &[&str] = &[
    "sold out",
    "no availability",
    "not available",
    "no rooms available",
    "fully booked",
    "we have no availability",
    "no longer available",
];

/// Site-specific extraction rules
///
/// Implementations are stateless; every method reads a single snapshot.
pub trait SiteStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Polling attempts before giving up and reporting the page as sold out
    fn max_attempts(&self) -> u32;

    fn detect_sold_out(&self, page: &PageSnapshot) -> bool;

    /// Displayed price, `None` when nothing price-like is on the page yet
    fn extract_price(&self, page: &PageSnapshot) -> Option<f64>;

    fn extract_room_type(&self, page: &PageSnapshot) -> String;
}

/// Booking sites with dedicated rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    Booking,
    Agoda,
    Generic,
}

impl Site {
    pub const ALL: [Site; 3] = [Self::Booking, Self::Agoda, Self::Generic];

    /// Largest attempt budget of any strategy
    #[must_use]
    pub fn largest_attempt_budget() -> u32 {
        Self::ALL
            .iter()
            .map(|site| site.strategy().max_attempts())
            .max()
            .unwrap_or(1)
    }

    /// Pick the site for a page URL. Unknown hosts get the generic rules.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        match host_of(url) {
            Some(host) if host_matches(&host, "booking.com") => Self::Booking,
            Some(host) if host_matches(&host, "agoda.com") => Self::Agoda,
            _ => Self::Generic,
        }
    }

    #[must_use]
    pub fn strategy(self) -> &'static dyn SiteStrategy {
        match self {
            Self::Booking => &booking::BookingStrategy,
            Self::Agoda => &agoda::AgodaStrategy,
            Self::Generic => &generic::GenericStrategy,
        }
    }
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Sold-out check shared by every site: a dedicated marker element first,
/// then a phrase search over the page text
pub(crate) fn sold_out_by(page: &PageSnapshot, markers: &[Locator], phrases: &[&str]) -> bool {
    page.first_visible(markers).is_some() || page.contains_any_phrase(phrases).is_some()
}

/// Price from the first matching price element, else a currency scan of the
/// whole page
pub(crate) fn price_by(page: &PageSnapshot, locators: &[Locator]) -> Option<f64> {
    match page.first_visible_text(locators) {
        Some(text) => Some(parse_price(&text)),
        None => scan_currency_amount(page.text()),
    }
}

pub(crate) fn room_type_by(page: &PageSnapshot, locators: &[Locator]) -> String {
    page.first_visible_text(locators)
        .unwrap_or_else(|| DEFAULT_ROOM_TYPE.to_string())
}
