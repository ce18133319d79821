use std::fmt;
use std::str::FromStr;

/// Valid UTC offsets span -12:00 to +14:00.
const MIN_OFFSET_MINUTES: i32 = -12 * 60;
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// A UTC offset in whole minutes, parsed from a "{+|-}HHMM" literal.
///
/// Capture timestamps carry no timezone, so the user supplies one; all
/// offset arithmetic stays in integer minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimezoneOffset {
    minutes: i32,
}

impl TimezoneOffset {
    pub fn from_minutes(minutes: i32) -> Option<Self> {
        if (MIN_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&minutes) {
            Some(Self { minutes })
        } else {
            None
        }
    }

    pub fn minutes(self) -> i32 {
        self.minutes
    }
}

impl FromStr for TimezoneOffset {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 5
            || !(bytes[0] == b'+' || bytes[0] == b'-')
            || !bytes[1..].iter().all(u8::is_ascii_digit)
        {
            return Err("timezone offset must look like {+|-}HHMM, e.g. -0700");
        }
        let hours: i32 = s[1..3].parse().map_err(|_| "invalid hours digits")?;
        let minutes: i32 = s[3..5].parse().map_err(|_| "invalid minutes digits")?;
        if minutes >= 60 {
            return Err("minutes part of the offset must be below 60");
        }
        let mut total = hours * 60 + minutes;
        if bytes[0] == b'-' {
            total = -total;
        }
        Self::from_minutes(total).ok_or("offset outside the valid UTC range (-1200 to +1400)")
    }
}

impl fmt::Display for TimezoneOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minutes < 0 { '-' } else { '+' };
        let abs = self.minutes.abs();
        write!(f, "{}{:02}{:02}", sign, abs / 60, abs % 60)
    }
}
