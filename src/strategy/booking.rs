//! booking.com

use super::{Locator, PageSnapshot, SOLD_OUT_PHRASES, SiteStrategy, price_by, room_type_by, sold_out_by};

pub const SOLD_OUT_MARKERS: &[Locator] = &[
    Locator::Path(r#"//*[@id="no_availability_msg"]"#),
    Locator::Css(r#"[data-testid="property-sold-out-banner"]"#),
    Locator::Css(".soldout_property"),
    Locator::Css(".sold_out_property"),
];

pub const PRICE_LOCATORS: &[Locator] = &[
    Locator::Css(r#"[data-testid="price-and-discounted-price"]"#),
    Locator::Css(".prco-valign-middle-helper"),
    Locator::Css(".bui-price-display__value"),
    Locator::Path(r#"//*[@id="hprt-table"]/tbody/tr[1]/td[3]"#),
];

pub const ROOM_TYPE_LOCATORS: &[Locator] = &[
    Locator::Css(".hprt-roomtype-icon-link"),
    Locator::Css(r#"[data-testid="recommended-units"] h3"#),
    Locator::Css(".hprt-roomtype-link"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct BookingStrategy;

impl SiteStrategy for BookingStrategy {
    fn name(&self) -> &'static str {
        "booking"
    }

    fn max_attempts(&self) -> u32 {
        8
    }

    fn detect_sold_out(&self, page: &PageSnapshot) -> bool {
        sold_out_by(page, SOLD_OUT_MARKERS, SOLD_OUT_PHRASES)
    }

    fn extract_price(&self, page: &PageSnapshot) -> Option<f64> {
        price_by(page, PRICE_LOCATORS)
    }

    fn extract_room_type(&self, page: &PageSnapshot) -> String {
        room_type_by(page, ROOM_TYPE_LOCATORS)
    }
}
