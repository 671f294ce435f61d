use std::str::FromStr;
use std::sync::LazyLock;

use super::{ParseError, elem_text, normalize_whitespace, parse_document};
use crate::types::{DailyMenu, WeekDay, WeeklyMenu};

use regex::Regex;
use scraper::Selector;

const MAIN_DISH_LABEL: &str = "VARMMAT";
const SOUP_LABEL: &str = "DAGENS SUPPE";
const SALAD_LABEL: &str = "DAGENS SALAT";

static RE_PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)").expect("invalid regex: parenthesized"));
static BLOCK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.sqs-html-content").expect("invalid selector: block"));
static HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2").expect("invalid selector: heading"));

/// Parses the FB38 page, where every day is a content block headed by the day
/// name and the categories are only separated by their labels in running text.
pub fn parse_fb38_menu(html: &str) -> Result<WeeklyMenu, ParseError> {
    let document = parse_document(html)?;
    let mut menu = WeeklyMenu::new();

    for block in document.select(&BLOCK_SELECTOR) {
        let Some(heading) = block.select(&HEADING_SELECTOR).next() else {
            continue;
        };
        let day_name = normalize_whitespace(&elem_text(heading));
        let day = match WeekDay::from_str(&day_name) {
            Ok(day) => day,
            Err(e) => {
                log::debug!("Skipping block: {}", e);
                continue;
            }
        };

        let text = normalize_whitespace(&elem_text(block));
        let daily = DailyMenu {
            main_dish: extract_category(&text, MAIN_DISH_LABEL, Some(SOUP_LABEL)),
            soup: extract_category(&text, SOUP_LABEL, Some(SALAD_LABEL)),
            salad: extract_category(&text, SALAD_LABEL, None),
        };
        menu.insert(day, daily);
    }

    Ok(menu)
}

fn extract_category(text: &str, label: &str, next_label: Option<&str>) -> String {
    let Some(start) = text.find(label) else {
        return String::new();
    };
    let content_start = start + label.len();
    let rest = &text[content_start..];
    let end = next_label
        .and_then(|next| rest.find(next))
        .unwrap_or(rest.len());

    RE_PARENTHESIZED
        .replace_all(&rest[..end], "\n")
        .replace("(-)", "\n")
        .replace("\n ", "\n")
        .trim()
        .to_string()
}
