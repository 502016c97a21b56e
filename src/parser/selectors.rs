//! CSS selectors for the draw-game results page
//!
//! The results page groups the latest drawings inside a header card; each
//! drawing has a date label (with a time-of-day icon) and a list of
//! number balls plus an optional Fireball bonus ball.

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

/// Structured container holding the latest drawings
pub const CARD: &str = "div.draw-game-header__card";

lazy_static! {
    static ref CARD_SELECTOR: Selector = parse_selector!("div.draw-game-header__card");
    static ref DATE_LABEL: Selector = parse_selector!("p.draw-date");
    static ref TIME_ICON_TITLE: Selector = parse_selector!("svg title");
    static ref NUMBERS_LIST: Selector = parse_selector!("ul.game-numbers");
    static ref NUMBER_LEAF: Selector = parse_selector!("li.game-numbers__number span");
    static ref BONUS_LEAF: Selector =
        parse_selector!("li.game-numbers__bonus span.game-numbers__bonus-text");
}

/// Selectors used by the draw extractor
pub struct DrawSelectors {
    pub card: &'static Selector,
    pub date_label: &'static Selector,
    pub time_icon_title: &'static Selector,
    pub numbers_list: &'static Selector,
    pub number_leaf: &'static Selector,
    pub bonus_leaf: &'static Selector,
}

impl DrawSelectors {
    pub fn new() -> Self {
        Self {
            card: &CARD_SELECTOR,
            date_label: &DATE_LABEL,
            time_icon_title: &TIME_ICON_TITLE,
            numbers_list: &NUMBERS_LIST,
            number_leaf: &NUMBER_LEAF,
            bonus_leaf: &BONUS_LEAF,
        }
    }
}

impl Default for DrawSelectors {
    fn default() -> Self {
        Self::new()
    }
}
