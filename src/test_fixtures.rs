//! Builders for little-endian EXIF segments used across unit tests.

fn push_entry(out: &mut Vec<u8>, tag: u16, type_id: u16, count: u32, value: [u8; 4]) {
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(&type_id.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&value);
}

/// Builds a TIFF segment with an optional DateTimeOriginal ("YYYY:MM:DD
/// HH:MM:SS") and optional GPS stamps ("YYYY:MM:DD" plus h/m/s rationals
/// with denominator 1).
pub fn build_tiff(capture: Option<&str>, gps: Option<(&str, (u32, u32, u32))>) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"II\x2a\x00");
    out.extend_from_slice(&8u32.to_le_bytes());

    let pointer_count = capture.is_some() as usize + gps.is_some() as usize;
    let ifd0_len = 2 + pointer_count * 12 + 4;
    let exif_ifd_offset = 8 + ifd0_len;
    let exif_ifd_len = if capture.is_some() { 2 + 12 + 4 } else { 0 };
    let gps_ifd_offset = exif_ifd_offset + exif_ifd_len;
    let gps_ifd_len = if gps.is_some() { 2 + 2 * 12 + 4 } else { 0 };
    let mut value_offset = gps_ifd_offset + gps_ifd_len;

    out.extend_from_slice(&(pointer_count as u16).to_le_bytes());
    if capture.is_some() {
        push_entry(&mut out, 0x8769, 4, 1, (exif_ifd_offset as u32).to_le_bytes());
    }
    if gps.is_some() {
        push_entry(&mut out, 0x8825, 4, 1, (gps_ifd_offset as u32).to_le_bytes());
    }
    out.extend_from_slice(&0u32.to_le_bytes());

    let mut values = Vec::new();
    if let Some(capture) = capture {
        assert_eq!(capture.len(), 19, "capture must be YYYY:MM:DD HH:MM:SS");
        out.extend_from_slice(&1u16.to_le_bytes());
        push_entry(&mut out, 0x9003, 2, 20, (value_offset as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        values.extend_from_slice(capture.as_bytes());
        values.push(0);
        value_offset += 20;
    }
    if let Some((date, (hours, minutes, seconds))) = gps {
        assert_eq!(date.len(), 10, "GPS date must be YYYY:MM:DD");
        out.extend_from_slice(&2u16.to_le_bytes());
        push_entry(&mut out, 0x0007, 5, 3, (value_offset as u32).to_le_bytes());
        for part in [hours, minutes, seconds] {
            values.extend_from_slice(&part.to_le_bytes());
            values.extend_from_slice(&1u32.to_le_bytes());
        }
        value_offset += 24;
        push_entry(&mut out, 0x001d, 2, 11, (value_offset as u32).to_le_bytes());
        values.extend_from_slice(date.as_bytes());
        values.push(0);
        out.extend_from_slice(&0u32.to_le_bytes());
    }
    out.extend_from_slice(&values);
    out
}
