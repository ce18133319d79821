use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::FixError;
use crate::exif_segment::{
    ExifSegment, Ifd, TAG_DATETIME_ORIGINAL, TAG_GPS_DATESTAMP, TAG_GPS_TIMESTAMP,
};
use crate::timezone::TimezoneOffset;

/// DateTimeOriginal layout, 24-hour local time.
const DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
/// GPSDateStamp layout, UTC.
const DATE_FORMAT: &str = "%Y:%m:%d";

/// Stored GPS stamps deviating from the capture timestamp by at most this
/// many seconds count as correct.
const MATCH_TOLERANCE_SECONDS: i64 = 1;

/// Computes corrected GPS stamps from the capture timestamp and rewrites
/// them into an EXIF segment. Carries only the offset; no state survives
/// from one file to the next.
#[derive(Debug, Clone, Copy)]
pub struct GpsTimeFixer {
    offset: TimezoneOffset,
}

impl GpsTimeFixer {
    pub fn new(offset: TimezoneOffset) -> Self {
        Self { offset }
    }

    /// DateTimeOriginal as a naive local timestamp; `None` when the field
    /// is absent or does not match the EXIF pattern.
    pub fn capture_timestamp(&self, segment: &ExifSegment) -> Option<NaiveDateTime> {
        let raw = segment.ascii(Ifd::Exif, TAG_DATETIME_ORIGINAL)?;
        NaiveDateTime::parse_from_str(raw.trim(), DATETIME_FORMAT).ok()
    }

    /// Whether both GPS stamp fields exist with their schema types.
    pub fn has_gps_stamps(&self, segment: &ExifSegment) -> bool {
        segment.ascii(Ifd::Gps, TAG_GPS_DATESTAMP).is_some()
            && segment.rationals(Ifd::Gps, TAG_GPS_TIMESTAMP).is_some()
    }

    /// The GPS moment currently stored in the segment; `None` when either
    /// stamp is unreadable.
    pub fn current_gps(&self, segment: &ExifSegment) -> Option<NaiveDateTime> {
        let date_raw = segment.ascii(Ifd::Gps, TAG_GPS_DATESTAMP)?;
        let date = NaiveDate::parse_from_str(date_raw.trim(), DATE_FORMAT).ok()?;
        let time = time_from_rationals(segment.rationals(Ifd::Gps, TAG_GPS_TIMESTAMP)?)?;
        Some(date.and_time(time))
    }

    /// Capture local time shifted to UTC by the configured offset.
    pub fn corrected_gps(&self, capture: NaiveDateTime) -> NaiveDateTime {
        capture - Duration::minutes(self.offset.minutes() as i64)
    }

    /// False when the stored GPS moment, shifted back to local time by the
    /// same offset, matches the capture timestamp within one second.
    pub fn needs_fix(&self, segment: &ExifSegment, capture: NaiveDateTime) -> bool {
        match self.current_gps(segment) {
            Some(gps) => {
                let local = gps + Duration::minutes(self.offset.minutes() as i64);
                (local - capture).num_seconds().abs() > MATCH_TOLERANCE_SECONDS
            }
            // Unreadable stamps are exactly what a rewrite repairs.
            None => true,
        }
    }

    /// Overwrites GPSDateStamp and GPSTimeStamp with values derived from
    /// the capture timestamp, leaving every other field untouched. Returns
    /// the new GPS moment.
    pub fn apply(
        &self,
        segment: &mut ExifSegment,
        capture: NaiveDateTime,
    ) -> Result<NaiveDateTime, FixError> {
        let gps = self.corrected_gps(capture);
        segment.set_ascii(Ifd::Gps, TAG_GPS_DATESTAMP, &gps.format(DATE_FORMAT).to_string())?;
        let time = gps.time();
        segment.set_rationals(
            Ifd::Gps,
            TAG_GPS_TIMESTAMP,
            &[(time.hour(), 1), (time.minute(), 1), (time.second(), 1)],
        )?;
        Ok(gps)
    }
}

/// Whole-second time of day from the three GPSTimeStamp rationals.
/// Denominators other than 1 are reduced by integer division; a zero
/// denominator makes the stamp unreadable.
fn time_from_rationals(parts: &[(u32, u32)]) -> Option<NaiveTime> {
    if parts.len() != 3 {
        return None;
    }
    let mut whole = [0u32; 3];
    for (slot, &(num, den)) in whole.iter_mut().zip(parts) {
        if den == 0 {
            return None;
        }
        *slot = num / den;
    }
    NaiveTime::from_hms_opt(whole[0], whole[1], whole[2])
}
