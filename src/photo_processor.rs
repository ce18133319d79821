use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use log::debug;

use crate::error::FixError;
use crate::exif_segment::{ExifSegment, Ifd};
use crate::gps_time_fixer::GpsTimeFixer;
use crate::image_container;
use crate::timezone::TimezoneOffset;

/// Outcome of examining one file. Every file yields exactly one outcome;
/// failures are the `Err` side of [`process`].
#[derive(Debug)]
pub enum FixOutcome {
    /// No GPS directory, or no GPS stamp fields to rewrite.
    NoGpsData,
    /// DateTimeOriginal missing or malformed; nothing to derive a fix from.
    NoCaptureTime,
    /// Stored GPS stamps already match the capture timestamp.
    AlreadyCorrect,
    /// Corrected stamps computed; commit pending.
    Proposed(ProposedFix),
}

/// A computed correction carrying the fully rebuilt file, so committing is
/// a plain write with no further parsing.
#[derive(Debug)]
pub struct ProposedFix {
    /// The stored GPS moment, when it was readable at all.
    pub old_gps: Option<NaiveDateTime>,
    /// The corrected GPS moment (UTC).
    pub new_gps: NaiveDateTime,
    /// The complete updated file bytes.
    pub updated: Vec<u8>,
}

/// Examines one file and classifies it, composing the updated bytes in
/// memory when a correction applies. Never writes to disk.
pub fn process(path: &Path, offset: TimezoneOffset) -> Result<FixOutcome, FixError> {
    let original = fs::read(path)?;
    let raw = image_container::extract_exif(&original)?
        .ok_or(FixError::MalformedContainer("no EXIF metadata segment"))?;
    let mut segment = ExifSegment::parse(&raw)?;

    let fixer = GpsTimeFixer::new(offset);
    let capture = match fixer.capture_timestamp(&segment) {
        Some(capture) => capture,
        None => return Ok(FixOutcome::NoCaptureTime),
    };
    if !segment.has_directory(Ifd::Gps) || !fixer.has_gps_stamps(&segment) {
        return Ok(FixOutcome::NoGpsData);
    }
    if !fixer.needs_fix(&segment, capture) {
        return Ok(FixOutcome::AlreadyCorrect);
    }

    let old_gps = fixer.current_gps(&segment);
    let new_gps = fixer.apply(&mut segment, capture)?;
    let updated = image_container::replace_exif(&original, segment.as_bytes())?;
    debug!("{}: GPS {:?} -> {}", path.display(), old_gps, new_gps);
    Ok(FixOutcome::Proposed(ProposedFix {
        old_gps,
        new_gps,
        updated,
    }))
}

/// Writes a proposed fix to disk: the full buffer goes to a temporary
/// sibling which is then renamed over the original, so a failure at any
/// point leaves the original untouched.
pub fn commit(path: &Path, fix: &ProposedFix) -> Result<(), FixError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("img");
    let temp_path = path.with_extension(format!("tmp.{}", extension));
    fs::write(&temp_path, &fix.updated)?;
    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        FixError::Io(e)
    })?;
    Ok(())
}
