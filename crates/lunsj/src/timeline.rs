//! Widget timelines built from a parsed week.
//!
//! The weekly timeline always lists Monday to Friday of the week containing
//! the reference date and asks to be rebuilt on Monday morning. The daily
//! timeline shows a single day and moves on to tomorrow once lunch is over.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Timelike};
use serde::Serialize;

use crate::types::{DailyMenu, WeekDay, WeeklyMenu, day_label};

/// Local hour after which the daily timeline shows tomorrow.
pub const CUTOVER_HOUR: u32 = 13;
/// Local hour on Monday when a new week's menu is expected.
pub const WEEKLY_REFRESH_HOUR: u32 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub date: NaiveDate,
    pub day_label: String,
    pub menu: DailyMenu,
}

impl TimelineEntry {
    fn for_date(menu: &WeeklyMenu, date: NaiveDate) -> Self {
        let menu = WeekDay::from_date(date)
            .and_then(|day| menu.get(day))
            .cloned()
            .unwrap_or_else(DailyMenu::no_menu);
        Self {
            date,
            day_label: day_label(date.weekday()).to_string(),
            menu,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
    pub refresh_after: DateTime<FixedOffset>,
}

/// Monday..Friday of the ISO week containing `reference`.
pub fn generate_entries(menu: &WeeklyMenu, reference: NaiveDate) -> Vec<TimelineEntry> {
    let monday =
        reference - Duration::days(reference.weekday().num_days_from_monday().into());
    (0..WeekDay::ORDERED.len() as i64)
        .map(|offset| TimelineEntry::for_date(menu, monday + Duration::days(offset)))
        .collect()
}

/// Today's entry before [`CUTOVER_HOUR`], tomorrow's from then on.
pub fn current_entry<Tz: TimeZone>(menu: &WeeklyMenu, now: &DateTime<Tz>) -> TimelineEntry {
    let today = now.date_naive();
    let date = if now.hour() < CUTOVER_HOUR {
        today
    } else {
        today + Duration::days(1)
    };
    TimelineEntry::for_date(menu, date)
}

/// Next Monday at [`WEEKLY_REFRESH_HOUR`] strictly after `reference`, or
/// `reference` + 24 h when that wall-clock time does not exist.
pub fn next_weekly_refresh<Tz: TimeZone>(reference: &DateTime<Tz>) -> DateTime<Tz> {
    let today = reference.date_naive();
    let days_until_monday = (7 - today.weekday().num_days_from_monday()) % 7;
    let mut monday = today + Duration::days(days_until_monday.into());
    if monday == today && reference.hour() >= WEEKLY_REFRESH_HOUR {
        monday = monday + Duration::days(7);
    }

    resolve_after(reference, monday, WEEKLY_REFRESH_HOUR)
}

/// Next [`CUTOVER_HOUR`] strictly after `now`, or `now` + 24 h when that
/// wall-clock time does not exist.
pub fn next_cutover<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let today = now.date_naive();
    let date = if now.hour() < CUTOVER_HOUR {
        today
    } else {
        today + Duration::days(1)
    };

    resolve_after(now, date, CUTOVER_HOUR)
}

pub fn weekly_timeline<Tz: TimeZone>(menu: &WeeklyMenu, now: &DateTime<Tz>) -> Timeline {
    Timeline {
        entries: generate_entries(menu, now.date_naive()),
        refresh_after: next_weekly_refresh(now).fixed_offset(),
    }
}

pub fn daily_timeline<Tz: TimeZone>(menu: &WeeklyMenu, now: &DateTime<Tz>) -> Timeline {
    Timeline {
        entries: vec![current_entry(menu, now)],
        refresh_after: next_cutover(now).fixed_offset(),
    }
}

fn resolve_after<Tz: TimeZone>(reference: &DateTime<Tz>, date: NaiveDate, hour: u32) -> DateTime<Tz> {
    local_at(reference, date, hour)
        .filter(|candidate| candidate > reference)
        .unwrap_or_else(|| fallback(reference))
}

// None when the wall-clock time is skipped or repeated in the reference zone.
fn local_at<Tz: TimeZone>(reference: &DateTime<Tz>, date: NaiveDate, hour: u32) -> Option<DateTime<Tz>> {
    let naive = date.and_hms_opt(hour, 0, 0)?;
    reference.timezone().from_local_datetime(&naive).single()
}

fn fallback<Tz: TimeZone>(reference: &DateTime<Tz>) -> DateTime<Tz> {
    log::warn!("Could not resolve the next refresh time, retrying in 24 hours");
    reference.clone() + Duration::hours(24)
}
