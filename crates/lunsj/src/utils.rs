use crate::settings::Settings;
use crate::types::{DailyMenu, WeekDay, WeeklyMenu};

use chrono::NaiveDate;

/// What part of the menu to show, taken from the display settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuFilter {
    pub whole_week: bool,
    pub main_dish: bool,
    pub soup: bool,
    pub salad: bool,
}

impl Default for MenuFilter {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for MenuFilter {
    fn from(settings: &Settings) -> Self {
        Self {
            whole_week: settings.show_whole_menu,
            main_dish: settings.show_main_dish,
            soup: settings.show_soup,
            salad: settings.show_salad,
        }
    }
}

impl MenuFilter {
    /// Blanks the sections that are switched off.
    pub fn apply(&self, menu: &DailyMenu) -> DailyMenu {
        let keep = |enabled: bool, text: &str| if enabled { text.to_string() } else { String::new() };
        DailyMenu {
            main_dish: keep(self.main_dish, &menu.main_dish),
            soup: keep(self.soup, &menu.soup),
            salad: keep(self.salad, &menu.salad),
        }
    }

    /// The whole week in day order, or only `today`. An empty result means
    /// there is nothing to show for today.
    pub fn select(&self, menu: &WeeklyMenu, today: NaiveDate) -> Vec<(WeekDay, DailyMenu)> {
        if self.whole_week {
            menu.iter().map(|(day, daily)| (day, self.apply(daily))).collect()
        } else {
            WeekDay::from_date(today)
                .and_then(|day| menu.get(day).map(|daily| (day, self.apply(daily))))
                .into_iter()
                .collect()
        }
    }
}
