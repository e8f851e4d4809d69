//! Fallback rules for hosts without a dedicated strategy

use super::{Locator, PageSnapshot, SOLD_OUT_PHRASES, SiteStrategy, price_by, room_type_by, sold_out_by};

pub const SOLD_OUT_MARKERS: &[Locator] = &[
    Locator::Css(".sold-out"),
    Locator::Css(".soldout"),
    Locator::Css("[data-sold-out]"),
];

pub const PRICE_LOCATORS: &[Locator] = &[
    Locator::Css(r#"[itemprop="price"]"#),
    Locator::Css(".room-price"),
    Locator::Css(".price"),
];

pub const ROOM_TYPE_LOCATORS: &[Locator] = &[
    Locator::Css(".room-type"),
    Locator::Css(".room-name"),
    Locator::Css("[data-room-name]"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct GenericStrategy;

impl SiteStrategy for GenericStrategy {
    fn name(&self) -> &'static str {
        "generic"
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
