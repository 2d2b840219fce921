//! Service-date navigation.
//!
//! The event runs on one fixed weekday. The navigator pins the selected
//! date to that weekday and only ever moves in whole weeks, so the
//! attendance partition key can never land on a non-event day.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Next occurrence of `weekday` on or after `today` (today itself when
/// it matches).
pub fn upcoming_service_date(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let today_num = today.weekday().num_days_from_monday();
    let target_num = weekday.num_days_from_monday();
    let ahead = (7 + target_num - today_num) % 7;
    today + Days::new(ahead as u64)
}

/// Tracks the currently selected weekly occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDateNavigator {
    weekday: Weekday,
    selected: NaiveDate,
}

impl ServiceDateNavigator {
    /// Start at the next occurrence of the event weekday on/after today.
    pub fn new(weekday: Weekday, today: NaiveDate) -> Self {
        Self {
            weekday,
            selected: upcoming_service_date(today, weekday),
        }
    }

    pub fn selected(&self) -> NaiveDate {
        self.selected
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    /// Move one week forward. Returns the newly selected date so the
    /// caller knows to re-fetch the roster.
    pub fn next(&mut self) -> NaiveDate {
        self.selected = self.selected + Days::new(7);
        self.selected
    }

    /// Move one week backward.
    pub fn prev(&mut self) -> NaiveDate {
        self.selected = self.selected - Days::new(7);
        self.selected
    }
}
