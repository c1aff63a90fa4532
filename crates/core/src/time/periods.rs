use anyhow::bail;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Named relative window, resolved against an explicitly supplied date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePreset {
    Last7Days,
    Last14Days,
    Last30Days,
}

impl RangePreset {
    pub fn days(&self) -> i64 {
        match self {
            RangePreset::Last7Days => 7,
            RangePreset::Last14Days => 14,
            RangePreset::Last30Days => 30,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RangePreset::Last7Days => "last_7_days",
            RangePreset::Last14Days => "last_14_days",
            RangePreset::Last30Days => "last_30_days",
        }
    }
}

impl FromStr for RangePreset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last_7_days" => Ok(RangePreset::Last7Days),
            "last_14_days" => Ok(RangePreset::Last14Days),
            "last_30_days" => Ok(RangePreset::Last30Days),
            other => bail!("unknown range preset: {other}"),
        }
    }
}

/// Requested reporting window: a preset resolved against "today", or an
/// explicit inclusive start/end pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    Preset(RangePreset),
    Explicit { start: NaiveDate, end: NaiveDate },
}

/// Inclusive calendar-date window. NaiveDate serializes as yyyy-MM-dd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    /// Inclusive day count.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodPair {
    pub current: Period,
    pub previous: Period,
}

/// Compute the current window and the equal-length comparison window that
/// immediately precedes it (no gap, no overlap).
///
/// `today` is passed in rather than read from the clock so batch runs and
/// tests resolve presets reproducibly. Explicit ranges ignore `today`
/// entirely.
pub fn comparison_periods(range: DateRange, today: NaiveDate) -> PeriodPair {
    match range {
        DateRange::Preset(preset) => {
            let n = preset.days();
            let current = Period {
                start: today - Duration::days(n),
                end: today,
            };
            let previous_end = current.start - Duration::days(1);
            PeriodPair {
                current,
                previous: Period {
                    start: previous_end - Duration::days(n),
                    end: previous_end,
                },
            }
        }
        DateRange::Explicit { start, end } => {
            let days = (end - start).num_days() + 1;
            let previous_end = start - Duration::days(1);
            PeriodPair {
                current: Period { start, end },
                previous: Period {
                    start: previous_end - Duration::days(days - 1),
                    end: previous_end,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn last_7_days_resolves_against_today() {
        let pair = comparison_periods(DateRange::Preset(RangePreset::Last7Days), d(2026, 2, 16));
        assert_eq!(pair.current.start, d(2026, 2, 9));
        assert_eq!(pair.current.end, d(2026, 2, 16));
        assert_eq!(pair.previous.start, d(2026, 2, 1));
        assert_eq!(pair.previous.end, d(2026, 2, 8));
    }

    #[test]
    fn last_14_days_crosses_month_boundary() {
        let pair = comparison_periods(DateRange::Preset(RangePreset::Last14Days), d(2026, 2, 16));
        assert_eq!(pair.current.start, d(2026, 2, 2));
        assert_eq!(pair.current.end, d(2026, 2, 16));
        assert_eq!(pair.previous.start, d(2026, 1, 18));
        assert_eq!(pair.previous.end, d(2026, 2, 1));
    }

    #[test]
    fn explicit_range_keeps_current_and_mirrors_previous() {
        let range = DateRange::Explicit {
            start: d(2026, 2, 10),
            end: d(2026, 2, 16),
        };
        let pair = comparison_periods(range, d(2026, 8, 30));
        assert_eq!(pair.current.start, d(2026, 2, 10));
        assert_eq!(pair.current.end, d(2026, 2, 16));
        assert_eq!(pair.previous.start, d(2026, 2, 3));
        assert_eq!(pair.previous.end, d(2026, 2, 9));
    }

    #[test]
    fn windows_are_equal_length_and_contiguous() {
        for preset in [
            RangePreset::Last7Days,
            RangePreset::Last14Days,
            RangePreset::Last30Days,
        ] {
            let pair = comparison_periods(DateRange::Preset(preset), d(2026, 3, 1));
            assert_eq!(pair.current.days(), pair.previous.days());
            assert_eq!(
                pair.previous.end + Duration::days(1),
                pair.current.start,
                "previous must end the day before current starts"
            );
        }
    }

    #[test]
    fn single_day_explicit_range() {
        let range = DateRange::Explicit {
            start: d(2026, 3, 1),
            end: d(2026, 3, 1),
        };
        let pair = comparison_periods(range, d(2026, 3, 5));
        assert_eq!(pair.previous.start, d(2026, 2, 28));
        assert_eq!(pair.previous.end, d(2026, 2, 28));
    }

    #[test]
    fn explicit_range_ignores_today() {
        let range = DateRange::Explicit {
            start: d(2026, 2, 10),
            end: d(2026, 2, 16),
        };
        let a = comparison_periods(range, d(2026, 1, 1));
        let b = comparison_periods(range, d(2027, 12, 31));
        assert_eq!(a, b);
    }

    #[test]
    fn period_serializes_as_calendar_dates() {
        let period = Period {
            start: d(2026, 2, 9),
            end: d(2026, 2, 16),
        };
        let v = serde_json::to_value(period).unwrap();
        assert_eq!(v["start"], "2026-02-09");
        assert_eq!(v["end"], "2026-02-16");
    }
}
