//! Fixture builders shared by the integration tests: little-endian EXIF
//! segments and minimal JPEG/PNG files wrapping them.

use std::fs;
use std::path::{Path, PathBuf};

fn push_entry(out: &mut Vec<u8>, tag: u16, type_id: u16, count: u32, value: [u8; 4]) {
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(&type_id.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&value);
}

/// TIFF segment with an optional DateTimeOriginal ("YYYY:MM:DD HH:MM:SS")
/// and optional GPS stamps ("YYYY:MM:DD" plus h/m/s with denominator 1).
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

/// SOI, one APP1 EXIF segment wrapping `tiff`, an empty scan, EOI.
pub fn wrap_jpeg(tiff: &[u8]) -> Vec<u8> {
    let mut out = vec![0xff, 0xd8];
    out.extend_from_slice(&[0xff, 0xe1]);
    out.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\x00\x00");
    out.extend_from_slice(tiff);
    out.extend_from_slice(&[0xff, 0xda, 0x00, 0x02]);
    out.extend_from_slice(&[0x00, 0xff, 0xd9]);
    out
}

pub fn write_jpeg(dir: &Path, name: &str, tiff: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, wrap_jpeg(tiff)).expect("failed to write fixture image");
    path
}

/// PNG signature, IHDR for a 1x1 grayscale image, the eXIf chunk wrapping
/// `tiff`, a stub IDAT, IEND.
pub fn wrap_png(tiff: &[u8]) -> Vec<u8> {
    let mut out = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    push_chunk(&mut out, b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 0]);
    push_chunk(&mut out, b"eXIf", tiff);
    push_chunk(&mut out, b"IDAT", &[0x78, 0x9c, 0x63, 0x60, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01]);
    push_chunk(&mut out, b"IEND", &[]);
    out
}

pub fn write_png(dir: &Path, name: &str, tiff: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, wrap_png(tiff)).expect("failed to write fixture image");
    path
}

fn push_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let mut checked = kind.to_vec();
    checked.extend_from_slice(data);
    out.extend_from_slice(&png_crc(&checked).to_be_bytes());
}

// CRC-32 over chunk type + data, as the PNG chunk layout requires.
fn png_crc(data: &[u8]) -> u32 {
    let mut crc = 0xffff_ffffu32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xedb8_8320
            } else {
                crc >> 1
            };
        }
    }
    !crc
}
