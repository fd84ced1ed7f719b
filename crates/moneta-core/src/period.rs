//! Calendar months and month navigation
//!
//! The month being viewed is always an explicit value. Nothing in the
//! aggregation or budget code reads the wall clock; only `YearMonth::current`
//! does, and callers decide when to use it.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A calendar month
///
/// Only months whose first day chrono can represent are constructible, so
/// every `YearMonth` has real first and last days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawYearMonth")]
pub struct YearMonth {
    year: i32,
    /// 1-12
    month: u32,
}

#[derive(Deserialize)]
struct RawYearMonth {
    year: i32,
    month: u32,
}

impl TryFrom<RawYearMonth> for YearMonth {
    type Error = Error;

    fn try_from(raw: RawYearMonth) -> Result<Self> {
        Self::new(raw.year, raw.month)
    }
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidData(format!("Month out of range: {}", month)));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(Error::InvalidData(format!("Year out of range: {}", year)));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month containing today's local date
    pub fn current() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    /// Parse `YYYY-MM`
    pub fn parse(s: &str) -> Result<Self> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| Error::InvalidData(format!("Expected YYYY-MM, got '{}'", s)))?;
        let year: i32 = year
            .parse()
            .map_err(|_| Error::InvalidData(format!("Invalid year in '{}'", s)))?;
        let month: u32 = month
            .parse()
            .map_err(|_| Error::InvalidData(format!("Invalid month in '{}'", s)))?;
        Self::new(year, month)
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        (28..=31)
            .rev()
            .find_map(|day| NaiveDate::from_ymd_opt(self.year, self.month, day))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Whether `date` falls within this month, both ends inclusive
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day() && date <= self.last_day()
    }

    /// The month before; the earliest representable month is its own predecessor
    pub fn prev(&self) -> Self {
        let (year, month) = if self.month == 1 {
            (self.year.checked_sub(1), 12)
        } else {
            (Some(self.year), self.month - 1)
        };
        year.and_then(|y| Self::new(y, month).ok()).unwrap_or(*self)
    }

    /// The month after; the latest representable month is its own successor
    pub fn next(&self) -> Self {
        let (year, month) = if self.month == 12 {
            (self.year.checked_add(1), 1)
        } else {
            (Some(self.year), self.month + 1)
        };
        year.and_then(|y| Self::new(y, month).ok()).unwrap_or(*self)
    }

    /// Human label, e.g. "June 2024"
    pub fn label(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for YearMonth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// The month currently being viewed, independent of "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    current: YearMonth,
}

impl MonthCursor {
    pub fn new(start: YearMonth) -> Self {
        Self { current: start }
    }

    pub fn current(&self) -> YearMonth {
        self.current
    }

    pub fn step(&mut self, direction: Direction) -> YearMonth {
        self.current = match direction {
            Direction::Prev => self.current.prev(),
            Direction::Next => self.current.next(),
        };
        self.current
    }

    pub fn prev(&mut self) -> YearMonth {
        self.step(Direction::Prev)
    }

    pub fn next(&mut self) -> YearMonth {
        self.step(Direction::Next)
    }

    pub fn jump_to(&mut self, month: YearMonth) {
        self.current = month;
    }
}

impl Default for MonthCursor {
    fn default() -> Self {
        Self::new(YearMonth::current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    #[test]
    fn test_month_bounds() {
        let feb = ym(2024, 2);
        assert_eq!(feb.first_day(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(ym(2023, 12).last_day(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_contains_is_inclusive() {
        let june = ym(2024, 6);
        assert!(june.contains(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
        assert!(june.contains(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()));
        assert!(!june.contains(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()));
        assert!(!june.contains(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()));
    }

    #[test]
    fn test_prev_next_wrap_year() {
        assert_eq!(ym(2024, 1).prev(), ym(2023, 12));
        assert_eq!(ym(2023, 12).next(), ym(2024, 1));
    }

    #[test]
    fn test_parse_and_display() {
        let m = YearMonth::parse("2024-06").unwrap();
        assert_eq!(m, ym(2024, 6));
        assert_eq!(m.to_string(), "2024-06");
        assert_eq!(m.label(), "June 2024");
        assert!(YearMonth::parse("2024-13").is_err());
        assert!(YearMonth::parse("june").is_err());
    }

    #[test]
    fn test_years_outside_calendar_rejected() {
        assert!(YearMonth::new(300_000, 1).is_err());
        assert!(YearMonth::parse("300000-01").is_err());
        assert!(YearMonth::parse("2147483647-12").is_err());
        assert!(YearMonth::parse("-2147483648-01").is_err());

        let err = serde_json::from_value::<YearMonth>(serde_json::json!({"year": 300000, "month": 1}));
        assert!(err.is_err());
        let ok: YearMonth = serde_json::from_value(serde_json::json!({"year": 2024, "month": 6})).unwrap();
        assert_eq!(ok, ym(2024, 6));
    }

    #[test]
    fn test_navigation_stops_at_calendar_edges() {
        let last = YearMonth::from_date(NaiveDate::MAX);
        assert_eq!(last.next(), last);
        assert_eq!(last.last_day(), NaiveDate::MAX);
        assert!(!last.contains(NaiveDate::from_ymd_opt(2024, 6, 5).unwrap()));

        let first = YearMonth::from_date(NaiveDate::MIN);
        assert_eq!(first.prev(), first);
        assert!(!first.contains(NaiveDate::from_ymd_opt(2024, 6, 5).unwrap()));
    }

    #[test]
    fn test_cursor_navigation() {
        let mut cursor = MonthCursor::new(ym(2024, 1));
        assert_eq!(cursor.prev(), ym(2023, 12));
        assert_eq!(cursor.next(), ym(2024, 1));
        assert_eq!(cursor.next(), ym(2024, 2));
        cursor.jump_to(ym(2030, 5));
        assert_eq!(cursor.current(), ym(2030, 5));
    }
}
