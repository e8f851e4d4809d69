//! agoda.com

use super::{Locator, PageSnapshot, SOLD_OUT_PHRASES, SiteStrategy, price_by, room_type_by, sold_out_by};

pub const SOLD_OUT_MARKERS: &[Locator] = &[
    Locator::Css(r#"[data-selenium="sold-out-message"]"#),
    Locator::Css(r#"[data-element-name="sold-out-message"]"#),
    Locator::Css(".SoldOutMessage"),
];

pub const PRICE_LOCATORS: &[Locator] = &[
    Locator::Css(r#"[data-selenium="display-price"]"#),
    Locator::Css(r#"[data-element-name="final-price"]"#),
    Locator::Css(".PropertyCardPrice__Value"),
    Locator::Path(r#"//*[@id="roomGrid"]//*[@data-ppapi="room-price"]"#),
];

pub const ROOM_TYPE_LOCATORS: &[Locator] = &[
    Locator::Css(r#"[data-selenium="masterroom-title-name"]"#),
    Locator::Css(".MasterRoom__HotelName"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct AgodaStrategy;

impl SiteStrategy for AgodaStrategy {
    fn name(&self) -> &'static str {
        "agoda"
    }

    fn max_attempts(&self) -> u32 {
        5
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
