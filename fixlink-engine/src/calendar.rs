/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Market-hours calendars used to gate connect attempts.

use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Weekday};

/// Answers whether the market is open at a given exchange-local time.
pub trait MarketCalendar: Send + Sync {
    /// Offset of the exchange time zone from UTC.
    fn exchange_offset(&self) -> FixedOffset;

    /// Returns true if trading is permitted at `at`.
    fn is_open(&self, at: DateTime<FixedOffset>, include_extended_hours: bool) -> bool;
}

/// Calendar that is always open, for 24/7 venues.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOpen;

impl MarketCalendar for AlwaysOpen {
    fn exchange_offset(&self) -> FixedOffset {
        utc()
    }

    fn is_open(&self, _at: DateTime<FixedOffset>, _include_extended_hours: bool) -> bool {
        true
    }
}

/// Half-open window `[start, end)` in minutes since local midnight.
///
/// A start later than the end wraps past midnight, e.g. an 18:00-17:00
/// futures session. Trading days apply to the local date of each minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    start_minute: u32,
    end_minute: u32,
}

impl SessionWindow {
    /// Creates a window from `(hour, minute)` bounds.
    #[must_use]
    pub const fn new(start: (u32, u32), end: (u32, u32)) -> Self {
        Self {
            start_minute: start.0 * 60 + start.1,
            end_minute: end.0 * 60 + end.1,
        }
    }

    fn contains(&self, minute_of_day: u32) -> bool {
        if self.start_minute <= self.end_minute {
            (self.start_minute..self.end_minute).contains(&minute_of_day)
        } else {
            minute_of_day >= self.start_minute || minute_of_day < self.end_minute
        }
    }
}

/// Fixed weekly trading schedule.
///
/// The offset is fixed, so daylight-saving shifts must be handled by whoever
/// builds the schedule.
#[derive(Debug, Clone)]
pub struct WeeklySchedule {
    offset_seconds: i32,
    trading_days: Vec<Weekday>,
    regular: SessionWindow,
    extended: Option<SessionWindow>,
}

impl WeeklySchedule {
    /// Creates a Monday to Friday schedule with only regular hours.
    ///
    /// # Arguments
    /// * `offset_seconds` - Exchange offset east of UTC
    /// * `regular` - Regular session window
    #[must_use]
    pub fn new(offset_seconds: i32, regular: SessionWindow) -> Self {
        Self {
            offset_seconds,
            trading_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            regular,
            extended: None,
        }
    }

    /// US equities: 09:30-16:00 regular, 04:00-20:00 extended, Eastern Standard Time.
    #[must_use]
    pub fn us_equities() -> Self {
        Self::new(-5 * 3600, SessionWindow::new((9, 30), (16, 0)))
            .with_extended_hours(SessionWindow::new((4, 0), (20, 0)))
    }

    /// Sets the extended-hours window.
    #[must_use]
    pub fn with_extended_hours(mut self, window: SessionWindow) -> Self {
        self.extended = Some(window);
        self
    }

    /// Replaces the trading days.
    #[must_use]
    pub fn with_trading_days(mut self, days: impl IntoIterator<Item = Weekday>) -> Self {
        self.trading_days = days.into_iter().collect();
        self
    }
}

impl MarketCalendar for WeeklySchedule {
    fn exchange_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.offset_seconds).unwrap_or_else(utc)
    }

    fn is_open(&self, at: DateTime<FixedOffset>, include_extended_hours: bool) -> bool {
        let local = at.with_timezone(&self.exchange_offset());
        if !self.trading_days.contains(&local.weekday()) {
            return false;
        }
        let minute = local.hour() * 60 + local.minute();
        let window = match (include_extended_hours, self.extended) {
            (true, Some(extended)) => extended,
            _ => self.regular,
        };
        window.contains(minute)
    }
}

fn utc() -> FixedOffset {
    chrono::Utc.fix()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn eastern(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_always_open() {
        assert!(AlwaysOpen.is_open(eastern(2026, 1, 4, 3, 0), false));
    }

    #[test]
    fn test_us_equities_regular_and_extended() {
        let calendar = WeeklySchedule::us_equities();
        // Monday 2026-01-05
        assert!(calendar.is_open(eastern(2026, 1, 5, 10, 0), false));
        assert!(!calendar.is_open(eastern(2026, 1, 5, 16, 0), false));
        assert!(calendar.is_open(eastern(2026, 1, 5, 16, 0), true));
        assert!(calendar.is_open(eastern(2026, 1, 5, 4, 0), true));
        assert!(!calendar.is_open(eastern(2026, 1, 5, 3, 59), true));
        assert!(!calendar.is_open(eastern(2026, 1, 5, 20, 0), true));
    }

    #[test]
    fn test_weekend_closed() {
        let calendar = WeeklySchedule::us_equities();
        // Saturday 2026-01-03
        assert!(!calendar.is_open(eastern(2026, 1, 3, 10, 0), true));
    }

    #[test]
    fn test_converts_to_exchange_time() {
        let calendar = WeeklySchedule::us_equities();
        let utc_time = chrono::Utc
            .with_ymd_and_hms(2026, 1, 5, 15, 0, 0)
            .unwrap()
            .fixed_offset();
        assert!(calendar.is_open(utc_time, false));
    }

    #[test]
    fn test_window_wrapping_midnight() {
        let calendar = WeeklySchedule::new(-5 * 3600, SessionWindow::new((18, 0), (17, 0)));
        // Monday 2026-01-05
        assert!(calendar.is_open(eastern(2026, 1, 5, 18, 0), false));
        assert!(calendar.is_open(eastern(2026, 1, 5, 23, 59), false));
        assert!(calendar.is_open(eastern(2026, 1, 5, 2, 0), false));
        assert!(calendar.is_open(eastern(2026, 1, 5, 16, 59), false));
        assert!(!calendar.is_open(eastern(2026, 1, 5, 17, 0), false));
        assert!(!calendar.is_open(eastern(2026, 1, 5, 17, 59), false));
    }

    #[test]
    fn test_custom_trading_days() {
        let calendar = WeeklySchedule::new(0, SessionWindow::new((0, 0), (24, 0)))
            .with_trading_days([Weekday::Sat, Weekday::Sun]);
        let saturday = chrono::Utc
            .with_ymd_and_hms(2026, 1, 3, 12, 0, 0)
            .unwrap()
            .fixed_offset();
        assert!(calendar.is_open(saturday, false));
        assert_eq!(calendar.exchange_offset().local_minus_utc(), 0);
    }
}
