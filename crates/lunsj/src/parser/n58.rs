use std::sync::LazyLock;

use super::{ParseError, parse_document, select_text};
use crate::types::{DailyMenu, WeekDay, WeeklyMenu};

use scraper::Selector;

static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table tr").expect("invalid selector: row"));
static DAY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.dag").expect("invalid selector: day"));
static MAIN_DISH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.hovedrett").expect("invalid selector: main dish"));
static SOUP_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.suppe").expect("invalid selector: soup"));

/// Parses the N58 table. The first row is the header; the page has no salad.
pub fn parse_n58_menu(html: &str) -> Result<WeeklyMenu, ParseError> {
    let document = parse_document(html)?;
    let mut menu = WeeklyMenu::new();

    for row in document.select(&ROW_SELECTOR).skip(1) {
        let day_name = select_text(row, &DAY_SELECTOR);
        if day_name.is_empty() {
            log::warn!("Skipping menu row without a day name");
            continue;
        }
        let day: WeekDay = match day_name.to_uppercase().parse() {
            Ok(day) => day,
            Err(e) => {
                log::warn!("Skipping menu row: {}", e);
                continue;
            }
        };

        menu.insert(
            day,
            DailyMenu {
                main_dish: select_text(row, &MAIN_DISH_SELECTOR),
                soup: select_text(row, &SOUP_SELECTOR),
                salad: String::new(),
            },
        );
    }

    Ok(menu)
}
