//! Business-day calendar, week keys and date windows.
//!
//! # Time Model
//! All dates are calendar days (`chrono::NaiveDate`). A department
//! window is an inclusive `[start, end]` range of dates; its length is
//! counted in working days only.
//!
//! # Precedence
//! A date is a working day iff:
//! - It is not the weekly rest day, AND
//! - It is not a holiday.
//!
//! Overtime may put the rest day back to work. That only changes how
//! much capacity a week offers (`capacity_days_in_week`), never the date
//! arithmetic (`add_working_days` and friends).

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An inclusive date range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    /// First day (inclusive).
    pub start: NaiveDate,
    /// Last day (inclusive).
    pub end: NaiveDate,
}

impl DateWindow {
    /// Creates a new window.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A single-day window.
    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// Whether a date falls within this window.
    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Whether `start <= end`.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }
}

/// Canonical week identifier: the Monday that starts the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekKey(NaiveDate);

impl WeekKey {
    /// The week containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        let back = date.weekday().num_days_from_monday() as u64;
        Self(date.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN))
    }

    /// Monday of this week.
    #[inline]
    pub fn monday(&self) -> NaiveDate {
        self.0
    }

    /// Sunday of this week.
    pub fn sunday(&self) -> NaiveDate {
        self.0.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX)
    }

    /// The following week.
    pub fn next(&self) -> Self {
        Self(self.0.checked_add_days(Days::new(7)).unwrap_or(NaiveDate::MAX))
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Overtime level a run executes under.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum OvertimeTier {
    /// Standard capacity.
    #[default]
    None,
    /// Extended shifts.
    Tier1,
    /// Extended shifts plus the rest day.
    Tier2,
}

impl OvertimeTier {
    /// Tiers that add capacity, cheapest first.
    pub const ESCALATION: [OvertimeTier; 2] = [OvertimeTier::Tier1, OvertimeTier::Tier2];
}

impl fmt::Display for OvertimeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OvertimeTier::None => "none",
            OvertimeTier::Tier1 => "tier-1",
            OvertimeTier::Tier2 => "tier-2",
        };
        f.write_str(s)
    }
}

/// Working-day calendar for the shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    /// The weekly day off.
    pub rest_day: Weekday,
    /// Dates the shop is closed.
    pub holidays: BTreeSet<NaiveDate>,
    /// Count the rest day as capacity (overtime only).
    pub overtime_rest_day: bool,
}

impl Calendar {
    /// Creates a calendar with the given rest day and no holidays.
    pub fn new(rest_day: Weekday) -> Self {
        Self {
            rest_day,
            holidays: BTreeSet::new(),
            overtime_rest_day: false,
        }
    }

    /// Adds a holiday.
    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.holidays.insert(date);
        self
    }

    /// Treats the rest day as available for capacity lookups.
    pub fn with_overtime_rest_day(mut self, enabled: bool) -> Self {
        self.overtime_rest_day = enabled;
        self
    }

    /// Whether regular work happens on `date`.
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        date.weekday() != self.rest_day && !self.holidays.contains(&date)
    }

    /// `date` itself if it is a working day, otherwise the next one.
    ///
    /// Saturates at the last representable date.
    pub fn next_working_day(&self, date: NaiveDate) -> NaiveDate {
        let mut d = date;
        while !self.is_working_day(d) {
            match d.succ_opt() {
                Some(next) => d = next,
                None => break,
            }
        }
        d
    }

    /// The date `n` working days after `date` (`date` itself not counted).
    ///
    /// Saturates at the last representable date.
    pub fn add_working_days(&self, date: NaiveDate, n: u32) -> NaiveDate {
        let mut d = date;
        let mut left = n;
        while left > 0 {
            match d.succ_opt() {
                Some(next) => d = next,
                None => break,
            }
            if self.is_working_day(d) {
                left -= 1;
            }
        }
        d
    }

    /// The date `n` working days before `date` (`date` itself not counted).
    ///
    /// Saturates at the first representable date.
    pub fn subtract_working_days(&self, date: NaiveDate, n: u32) -> NaiveDate {
        let mut d = date;
        let mut left = n;
        while left > 0 {
            match d.pred_opt() {
                Some(prev) => d = prev,
                None => break,
            }
            if self.is_working_day(d) {
                left -= 1;
            }
        }
        d
    }

    /// Number of working days in `[start, end]`. Zero if `end < start`.
    pub fn working_days_between(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        if end < start {
            return 0;
        }
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| self.is_working_day(*d))
            .count() as u32
    }

    /// Window of `days` working days beginning on the first working day
    /// at or after `start`.
    pub fn window_from(&self, start: NaiveDate, days: u32) -> DateWindow {
        let first = self.next_working_day(start);
        let last = self.add_working_days(first, days.saturating_sub(1));
        DateWindow::new(first, last)
    }

    /// Working days per week when nothing is closed.
    pub fn nominal_days_per_week(&self) -> u32 {
        6
    }

    /// Regular working days in `week`.
    pub fn working_days_in_week(&self, week: WeekKey) -> u32 {
        self.working_days_between(week.monday(), week.sunday())
    }

    /// Days that count toward capacity in `week`.
    ///
    /// Same as `working_days_in_week` unless overtime puts the rest day
    /// back to work (holidays stay closed).
    pub fn capacity_days_in_week(&self, week: WeekKey) -> u32 {
        let base = self.working_days_in_week(week);
        if !self.overtime_rest_day {
            return base;
        }
        let rest = week
            .monday()
            .iter_days()
            .take(7)
            .find(|d| d.weekday() == self.rest_day);
        match rest {
            Some(d) if !self.holidays.contains(&d) => base + 1,
            _ => base,
        }
    }

    /// Splits a window into per-week working-day counts, in week order.
    pub fn week_spans(&self, window: &DateWindow) -> Vec<(WeekKey, u32)> {
        let mut spans: Vec<(WeekKey, u32)> = Vec::new();
        let mut week = WeekKey::of(window.start);
        while week.monday() <= window.end {
            let from = week.monday().max(window.start);
            let to = week.sunday().min(window.end);
            let days = self.working_days_between(from, to);
            if days > 0 {
                spans.push((week, days));
            }
            let next = week.next();
            if next == week {
                break;
            }
            week = next;
        }
        spans
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new(Weekday::Sun)
    }
}
