//! ISO-8601 style durations used for every time offset in a job.
//!
//! The grammar is `[-]P[nY][nM][nD][T[nH][nM][nS]]`, where only the seconds
//! component may carry a fraction. Converting to seconds or days is an
//! approximation: calendar units are folded with the fixed constants below,
//! so a month is always [`DAYS_PER_MONTH`] days and a year always
//! [`DAYS_PER_YEAR`] days.

use crate::error::{Result, WiseError};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

pub const SECONDS_PER_MINUTE: f64 = 60.0;
pub const SECONDS_PER_HOUR: f64 = 3600.0;
pub const SECONDS_PER_DAY: f64 = 86400.0;
/// Days folded into one month by [`Duration::to_seconds`].
pub const DAYS_PER_MONTH: f64 = 30.0;
/// Days folded into one year by [`Duration::to_seconds`].
pub const DAYS_PER_YEAR: f64 = 365.0;

/// A signed duration split into calendar and clock components.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Duration {
    pub negative: bool,
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: f64,
}

impl Duration {
    /// A duration made only of calendar components.
    pub fn create_date(years: u32, months: u32, days: u32, negative: bool) -> Duration {
        Duration {
            negative,
            years,
            months,
            days,
            ..Default::default()
        }
    }

    /// A duration made only of clock components.
    pub fn create_time(hours: u32, minutes: u32, seconds: f64, negative: bool) -> Duration {
        Duration::create_date_time(0, 0, 0, hours, minutes, seconds, negative)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_date_time(
        years: u32,
        months: u32,
        days: u32,
        hours: u32,
        minutes: u32,
        seconds: f64,
        negative: bool,
    ) -> Duration {
        let mut value = Duration {
            negative,
            years,
            months,
            days,
            hours,
            minutes,
            seconds,
        };
        value.normalize_seconds();
        value
    }

    /// Keep `seconds` printable. A lone negative seconds value moves its
    /// sign to `negative`; a non-finite value, or a negative one next to
    /// other components, becomes zero.
    fn normalize_seconds(&mut self) {
        let only_seconds = self.years == 0
            && self.months == 0
            && self.days == 0
            && self.hours == 0
            && self.minutes == 0;
        if !self.seconds.is_finite() {
            warn!("Dropping non-finite seconds {} from duration", self.seconds);
            self.seconds = 0.0;
        } else if self.seconds < 0.0 {
            if only_seconds {
                self.negative = !self.negative;
                self.seconds = -self.seconds;
            } else {
                warn!("Dropping negative seconds {} from mixed duration", self.seconds);
                self.seconds = 0.0;
            }
        }
    }

    /// Shorthand for a whole number of hours.
    pub fn hours(hours: u32) -> Duration {
        Duration::create_time(hours, 0, 0.0, false)
    }

    /// Shorthand for a whole number of minutes.
    pub fn minutes(minutes: u32) -> Duration {
        Duration::create_time(0, minutes, 0.0, false)
    }

    /// Offset from local midnight, used for burning windows and
    /// time-of-day ranges.
    pub fn time_of_day(hours: u32, minutes: u32, seconds: u32) -> Duration {
        Duration::create_time(hours, minutes, f64::from(seconds), false)
    }

    /// Build a clock-only duration from a std duration, carrying whole
    /// minutes and hours upward. Sub-second precision is kept in `seconds`.
    pub fn from_std(value: std::time::Duration) -> Duration {
        let total = value.as_secs();
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = (total % 60) as f64 + f64::from(value.subsec_nanos()) / 1e9;
        Duration::create_time(
            u32::try_from(hours).unwrap_or(u32::MAX),
            minutes as u32,
            seconds,
            false,
        )
    }

    /// Convert to a std duration using the approximation constants.
    /// Returns `None` for negative durations.
    pub fn to_std(&self) -> Option<std::time::Duration> {
        let seconds = self.to_seconds();
        if seconds < 0.0 || !seconds.is_finite() {
            return None;
        }
        Some(std::time::Duration::from_secs_f64(seconds))
    }

    /// Parse the ISO-8601 duration grammar.
    pub fn parse(input: &str) -> Result<Duration> {
        let text = input.trim();
        let mut chars = text.chars().peekable();
        let mut value = Duration::default();

        match chars.peek() {
            Some('-') => {
                value.negative = true;
                chars.next();
            }
            Some('+') => {
                chars.next();
            }
            _ => {}
        }
        if chars.next() != Some('P') {
            return Err(format_error(input, "missing 'P' designator"));
        }

        let mut in_time = false;
        let mut last_rank = 0u8;
        let mut any_component = false;
        let mut any_time_component = false;

        while let Some(c) = chars.next() {
            if c == 'T' {
                if in_time {
                    return Err(format_error(input, "repeated 'T' designator"));
                }
                in_time = true;
                continue;
            }
            if !c.is_ascii_digit() {
                return Err(format_error(input, &format!("unexpected token '{c}'")));
            }
            let mut number = String::from(c);
            while let Some(&next) = chars.peek() {
                match next {
                    '0'..='9' | '.' => number.push(next),
                    ',' => number.push('.'),
                    _ => break,
                }
                chars.next();
            }
            let unit = chars
                .next()
                .ok_or_else(|| format_error(input, &format!("'{number}' has no unit")))?;
            let rank = match (in_time, unit) {
                (false, 'Y') => 1,
                (false, 'M') => 2,
                (false, 'D') => 3,
                (true, 'H') => 4,
                (true, 'M') => 5,
                (true, 'S') => 6,
                _ => return Err(format_error(input, &format!("unknown unit '{unit}'"))),
            };
            if rank <= last_rank {
                return Err(format_error(input, "components out of order"));
            }
            last_rank = rank;
            if rank != 6 && number.contains('.') {
                return Err(format_error(input, "only seconds may be fractional"));
            }
            if rank == 6 {
                value.seconds = number
                    .parse::<f64>()
                    .map_err(|_| format_error(input, &format!("bad number '{number}'")))?;
            } else {
                let whole = number
                    .parse::<u32>()
                    .map_err(|_| format_error(input, &format!("bad number '{number}'")))?;
                match rank {
                    1 => value.years = whole,
                    2 => value.months = whole,
                    3 => value.days = whole,
                    4 => value.hours = whole,
                    _ => value.minutes = whole,
                }
            }
            any_component = true;
            any_time_component |= in_time;
        }

        if in_time && !any_time_component {
            return Err(format_error(input, "'T' without a time component"));
        }
        if !any_component {
            return Err(format_error(input, "no components"));
        }
        Ok(value)
    }

    /// Approximate signed length in seconds.
    ///
    /// Lossy: months count as [`DAYS_PER_MONTH`] days and years as
    /// [`DAYS_PER_YEAR`] days regardless of the calendar.
    pub fn to_seconds(&self) -> f64 {
        let days = f64::from(self.days)
            + f64::from(self.months) * DAYS_PER_MONTH
            + f64::from(self.years) * DAYS_PER_YEAR;
        let total = self.seconds
            + f64::from(self.minutes) * SECONDS_PER_MINUTE
            + f64::from(self.hours) * SECONDS_PER_HOUR
            + days * SECONDS_PER_DAY;
        if self.negative {
            -total
        } else {
            total
        }
    }

    /// Approximate signed length in days, see [`Duration::to_seconds`].
    pub fn to_days(&self) -> f64 {
        self.to_seconds() / SECONDS_PER_DAY
    }

    /// Ordering helper over the approximate length in seconds.
    pub fn is_less_than(&self, other: &Duration) -> bool {
        self.to_seconds() < other.to_seconds()
    }

    /// All components well formed and at least one of them non-zero.
    pub fn is_valid(&self) -> bool {
        self.seconds.is_finite() && self.seconds >= 0.0 && !self.is_zero()
    }

    pub fn is_zero(&self) -> bool {
        self.years == 0
            && self.months == 0
            && self.days == 0
            && self.hours == 0
            && self.minutes == 0
            && self.seconds == 0.0
    }
}

fn format_error(input: &str, reason: &str) -> WiseError {
    WiseError::DurationFormat {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        write!(f, "P")?;
        if self.years > 0 {
            write!(f, "{}Y", self.years)?;
        }
        if self.months > 0 {
            write!(f, "{}M", self.months)?;
        }
        if self.days > 0 {
            write!(f, "{}D", self.days)?;
        }
        let has_time = self.hours > 0 || self.minutes > 0 || self.seconds != 0.0;
        if has_time {
            write!(f, "T")?;
            if self.hours > 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes > 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.seconds != 0.0 {
                write!(f, "{}S", self.seconds)?;
            }
        } else if self.years == 0 && self.months == 0 && self.days == 0 {
            write!(f, "T0S")?;
        }
        Ok(())
    }
}

impl FromStr for Duration {
    type Err = WiseError;

    fn from_str(s: &str) -> Result<Self> {
        Duration::parse(s)
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Duration::parse(&text).map_err(serde::de::Error::custom)
    }
}
