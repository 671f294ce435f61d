use std::collections::BTreeMap;
use std::{fmt::Display, str::FromStr};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Placeholder shown when a day has no menu.
pub const NO_MENU_TEXT: &str = "Ingen meny tilgjengelig i dag";

#[derive(Debug, thiserror::Error)]
#[error("Invalid location '{0}'. Accepted values: 'FB38', 'N58'")]
pub struct LocationParseError(String);

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Location {
    #[serde(rename = "FB38")]
    Fb38,
    #[default]
    #[serde(rename = "N58")]
    N58,
}

impl Location {
    pub const ALL: [Location; 2] = [Location::Fb38, Location::N58];

    pub fn key(&self) -> &'static str {
        match self {
            Location::Fb38 => "FB38",
            Location::N58 => "N58",
        }
    }

    pub fn menu_url(&self) -> &'static str {
        match self {
            Location::Fb38 => "https://fb38.squarespace.com/meny",
            Location::N58 => "https://drittserver.net/lunsj/",
        }
    }

    pub fn payment_url(&self) -> &'static str {
        match self {
            Location::Fb38 => {
                "https://www.alreadyordered.no/fb38/content/uncode-lite_child/TemplateProductTable_pure.php"
            }
            Location::N58 => {
                "https://www.goldbyopen.no/nostegaten58/content/uncode-lite_child/TemplateProductTable_pure.php"
            }
        }
    }
}

impl FromStr for Location {
    type Err = LocationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FB38" => Ok(Location::Fb38),
            "N58" => Ok(Location::N58),
            _ => Err(LocationParseError(s.to_string())),
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("'{0}' is not a weekday")]
pub struct WeekDayParseError(String);

/// Monday to Friday, keyed by the upper-case Norwegian day name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WeekDay {
    Mandag,
    Tirsdag,
    Onsdag,
    Torsdag,
    Fredag,
}

impl WeekDay {
    pub const ORDERED: [WeekDay; 5] = [
        WeekDay::Mandag,
        WeekDay::Tirsdag,
        WeekDay::Onsdag,
        WeekDay::Torsdag,
        WeekDay::Fredag,
    ];

    pub fn key(&self) -> &'static str {
        day_label(self.weekday())
    }

    pub fn weekday(&self) -> Weekday {
        match self {
            WeekDay::Mandag => Weekday::Mon,
            WeekDay::Tirsdag => Weekday::Tue,
            WeekDay::Onsdag => Weekday::Wed,
            WeekDay::Torsdag => Weekday::Thu,
            WeekDay::Fredag => Weekday::Fri,
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Option<Self> {
        match weekday {
            Weekday::Mon => Some(WeekDay::Mandag),
            Weekday::Tue => Some(WeekDay::Tirsdag),
            Weekday::Wed => Some(WeekDay::Onsdag),
            Weekday::Thu => Some(WeekDay::Torsdag),
            Weekday::Fri => Some(WeekDay::Fredag),
            Weekday::Sat | Weekday::Sun => None,
        }
    }

    /// `None` on weekends.
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        Self::from_weekday(date.weekday())
    }
}

impl FromStr for WeekDay {
    type Err = WeekDayParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MANDAG" => Ok(WeekDay::Mandag),
            "TIRSDAG" => Ok(WeekDay::Tirsdag),
            "ONSDAG" => Ok(WeekDay::Onsdag),
            "TORSDAG" => Ok(WeekDay::Torsdag),
            "FREDAG" => Ok(WeekDay::Fredag),
            _ => Err(WeekDayParseError(s.to_string())),
        }
    }
}

impl Display for WeekDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Upper-case Norwegian name for any day of the week.
pub fn day_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MANDAG",
        Weekday::Tue => "TIRSDAG",
        Weekday::Wed => "ONSDAG",
        Weekday::Thu => "TORSDAG",
        Weekday::Fri => "FREDAG",
        Weekday::Sat => "LØRDAG",
        Weekday::Sun => "SØNDAG",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyMenu {
    pub main_dish: String,
    pub soup: String,
    pub salad: String,
}

impl DailyMenu {
    pub fn no_menu() -> Self {
        Self {
            main_dish: NO_MENU_TEXT.to_string(),
            ..Default::default()
        }
    }

    pub fn dish_list(&self) -> Vec<&str> {
        self.main_dish
            .split('\n')
            .map(str::trim)
            .filter(|dish| !dish.is_empty())
            .collect()
    }
}

impl Display for DailyMenu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dishes = self.dish_list();
        if !dishes.is_empty() {
            writeln!(f, "  Varmmat:")?;
            for dish in dishes {
                writeln!(f, "    • {}", dish)?;
            }
        }
        if !self.soup.trim().is_empty() {
            writeln!(f, "  Dagens suppe: {}", self.soup.trim())?;
        }
        if !self.salad.trim().is_empty() {
            writeln!(f, "  Dagens salat: {}", self.salad.trim())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklyMenu(BTreeMap<WeekDay, DailyMenu>);

impl WeeklyMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, day: WeekDay, menu: DailyMenu) -> Option<DailyMenu> {
        self.0.insert(day, menu)
    }

    pub fn get(&self, day: WeekDay) -> Option<&DailyMenu> {
        self.0.get(&day)
    }

    pub fn today(&self, date: NaiveDate) -> Option<&DailyMenu> {
        WeekDay::from_date(date).and_then(|day| self.get(day))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Days in Monday..Friday order.
    pub fn iter(&self) -> impl Iterator<Item = (WeekDay, &DailyMenu)> {
        self.0.iter().map(|(day, menu)| (*day, menu))
    }
}

impl FromIterator<(WeekDay, DailyMenu)> for WeeklyMenu {
    fn from_iter<I: IntoIterator<Item = (WeekDay, DailyMenu)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Display for WeeklyMenu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (day, menu) in self.iter() {
            writeln!(f, "── {}", day)?;
            write!(f, "{}", menu)?;
        }
        Ok(())
    }
}
