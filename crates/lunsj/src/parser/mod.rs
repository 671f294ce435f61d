mod fb38;
mod n58;

use crate::types::{Location, WeeklyMenu};

use scraper::{ElementRef, Html, Selector};

pub use fb38::parse_fb38_menu;
pub use n58::parse_n58_menu;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Document is empty")]
    EmptyDocument,
    #[error("Document contains no HTML markup")]
    NoMarkup,
}

/// Picks the parser matching the page layout of `location`.
pub fn parse_menu(location: Location, html: &str) -> Result<WeeklyMenu, ParseError> {
    match location {
        Location::Fb38 => parse_fb38_menu(html),
        Location::N58 => parse_n58_menu(html),
    }
}

// html5ever recovers from any markup error, so only input that is not HTML at
// all is rejected here.
fn parse_document(html: &str) -> Result<Html, ParseError> {
    if html.trim().is_empty() {
        return Err(ParseError::EmptyDocument);
    }
    if !html.contains('<') {
        return Err(ParseError::NoMarkup);
    }
    Ok(Html::parse_document(html))
}

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn select_text(element: ElementRef, selector: &Selector) -> String {
    let text = element
        .select(selector)
        .map(elem_text)
        .collect::<Vec<_>>()
        .join(" ");
    normalize_whitespace(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_blank_and_non_html_input() {
        assert_eq!(parse_menu(Location::Fb38, ""), Err(ParseError::EmptyDocument));
        assert_eq!(parse_menu(Location::N58, "  \n\t"), Err(ParseError::EmptyDocument));
        assert_eq!(
            parse_menu(Location::Fb38, "502 Bad Gateway"),
            Err(ParseError::NoMarkup)
        );
        assert_eq!(
            parse_menu(Location::N58, "{\"error\": true}"),
            Err(ParseError::NoMarkup)
        );
    }

    #[test]
    fn test_unclosed_markup_still_parses() {
        let html = "<table><tr><td>Dag<tr><td><a class=\"dag\">Mandag</a><td><a class=\"hovedrett\">Lasagne";
        let menu = parse_menu(Location::N58, html).expect("html5ever should recover");
        assert_eq!(menu.len(), 1);
    }

    #[test]
    fn test_select_text_joins_and_normalizes() {
        let document = Html::parse_fragment("<div><a class=\"x\">Fisk\n  og</a><a class=\"x\">potet</a></div>");
        let selector = Selector::parse("a.x").unwrap();
        assert_eq!(select_text(document.root_element(), &selector), "Fisk og potet");
    }
}
