//! In-place codec for the TIFF structure inside an EXIF segment.
//!
//! The segment's original bytes are retained verbatim and edits are
//! patched into them. Whatever this module does not understand (maker
//! notes, vendor tags, unknown value types) survives a rewrite untouched,
//! and a segment that was parsed but never patched re-encodes byte for
//! byte.

use crate::error::FixError;

// TIFF header magic numbers.
const BYTE_ORDER_LE: [u8; 2] = *b"II";
const BYTE_ORDER_BE: [u8; 2] = *b"MM";
const TIFF_MAGIC: u16 = 42;

// Directory entry layout: tag(2) type(2) count(4) value-or-offset(4).
const ENTRY_LEN: usize = 12;

// Sub-directory pointer tags in the primary directory.
const TAG_EXIF_IFD_POINTER: u16 = 0x8769;
const TAG_GPS_IFD_POINTER: u16 = 0x8825;

/// DateTimeOriginal: ASCII "YYYY:MM:DD HH:MM:SS", 24-hour local time.
pub const TAG_DATETIME_ORIGINAL: u16 = 0x9003;
/// GPSTimeStamp: three RATIONALs (hours, minutes, seconds), 24-hour UTC.
pub const TAG_GPS_TIMESTAMP: u16 = 0x0007;
/// GPSDateStamp: ASCII "YYYY:MM:DD", UTC.
pub const TAG_GPS_DATESTAMP: u16 = 0x001d;

// Value type identifiers from the TIFF specification.
const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;

/// Storage size of one element of a value type, 0 when unknown.
fn type_unit_len(type_id: u16) -> usize {
    match type_id {
        1 | 2 | 6 | 7 => 1,  // BYTE, ASCII, SBYTE, UNDEFINED
        3 | 8 => 2,          // SHORT, SSHORT
        4 | 9 | 11 => 4,     // LONG, SLONG, FLOAT
        5 | 10 | 12 => 8,    // RATIONAL, SRATIONAL, DOUBLE
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn u16(self, data: &[u8], offset: usize) -> u16 {
        let raw = [data[offset], data[offset + 1]];
        match self {
            ByteOrder::Little => u16::from_le_bytes(raw),
            ByteOrder::Big => u16::from_be_bytes(raw),
        }
    }

    fn u32(self, data: &[u8], offset: usize) -> u32 {
        let raw = [
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ];
        match self {
            ByteOrder::Little => u32::from_le_bytes(raw),
            ByteOrder::Big => u32::from_be_bytes(raw),
        }
    }

    fn put_u32(self, data: &mut [u8], offset: usize, value: u32) {
        let raw = match self {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        };
        data[offset..offset + 4].copy_from_slice(&raw);
    }
}

/// The directory a field lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ifd {
    Primary,
    Exif,
    Gps,
    Thumbnail,
}

/// Decoded value of a directory entry, restricted to the closed set of
/// types this tool interprets. Anything else stays opaque in the buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Ascii(String),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<(u32, u32)>),
    Opaque { type_id: u16 },
}

/// One directory entry plus the location of its value slot in the buffer.
#[derive(Debug, Clone)]
pub struct FieldEntry {
    pub ifd: Ifd,
    pub tag: u16,
    pub type_id: u16,
    pub count: u32,
    pub value: FieldValue,
    entry_offset: usize,
    value_offset: usize,
    value_len: usize,
    inline: bool,
}

/// A parsed EXIF segment: the raw TIFF bytes plus an index of its fields.
pub struct ExifSegment {
    buf: Vec<u8>,
    order: ByteOrder,
    entries: Vec<FieldEntry>,
    ifds: Vec<Ifd>,
}

impl ExifSegment {
    pub fn parse(data: &[u8]) -> Result<Self, FixError> {
        if data.len() < 8 {
            return Err(FixError::MalformedContainer("truncated TIFF header"));
        }
        let order = match [data[0], data[1]] {
            BYTE_ORDER_LE => ByteOrder::Little,
            BYTE_ORDER_BE => ByteOrder::Big,
            _ => return Err(FixError::UnsupportedSchema("unrecognized byte-order marker")),
        };
        if order.u16(data, 2) != TIFF_MAGIC {
            return Err(FixError::UnsupportedSchema("missing TIFF magic number"));
        }
        let ifd0_offset = order.u32(data, 4) as usize;

        let mut entries = Vec::new();
        let mut ifds = Vec::new();
        let mut visited = Vec::new();
        let next = parse_ifd(
            data,
            order,
            ifd0_offset,
            Ifd::Primary,
            &mut entries,
            &mut ifds,
            &mut visited,
        )?;
        if next != 0 {
            let after = parse_ifd(
                data,
                order,
                next,
                Ifd::Thumbnail,
                &mut entries,
                &mut ifds,
                &mut visited,
            )?;
            if after != 0 {
                return Err(FixError::MalformedContainer("unexpected directory after thumbnail"));
            }
        }

        Ok(ExifSegment {
            buf: data.to_vec(),
            order,
            entries,
            ifds,
        })
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Whether the given directory was present in the segment.
    pub fn has_directory(&self, ifd: Ifd) -> bool {
        self.ifds.contains(&ifd)
    }

    pub fn field(&self, ifd: Ifd, tag: u16) -> Option<&FieldEntry> {
        self.entries.iter().find(|e| e.ifd == ifd && e.tag == tag)
    }

    /// ASCII value of a field, `None` when absent or not declared ASCII.
    pub fn ascii(&self, ifd: Ifd, tag: u16) -> Option<&str> {
        match &self.field(ifd, tag)?.value {
            FieldValue::Ascii(s) => Some(s),
            _ => None,
        }
    }

    /// Rational values of a field, `None` when absent or not declared
    /// RATIONAL.
    pub fn rationals(&self, ifd: Ifd, tag: u16) -> Option<&[(u32, u32)]> {
        match &self.field(ifd, tag)?.value {
            FieldValue::Rational(values) => Some(values),
            _ => None,
        }
    }

    /// Rewrites an ASCII field in place. The NUL-terminated value must fit
    /// the slot the original writer allocated.
    pub fn set_ascii(&mut self, ifd: Ifd, tag: u16, value: &str) -> Result<(), FixError> {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        let count = bytes.len() as u32;
        let index = self.entry_index(ifd, tag, TYPE_ASCII)?;
        self.write_value(index, &bytes, count)?;
        self.entries[index].value = FieldValue::Ascii(value.to_string());
        Ok(())
    }

    /// Rewrites a RATIONAL field in place, in the segment's byte order.
    pub fn set_rationals(
        &mut self,
        ifd: Ifd,
        tag: u16,
        values: &[(u32, u32)],
    ) -> Result<(), FixError> {
        let mut bytes = Vec::with_capacity(values.len() * 8);
        for &(num, den) in values {
            match self.order {
                ByteOrder::Little => {
                    bytes.extend_from_slice(&num.to_le_bytes());
                    bytes.extend_from_slice(&den.to_le_bytes());
                }
                ByteOrder::Big => {
                    bytes.extend_from_slice(&num.to_be_bytes());
                    bytes.extend_from_slice(&den.to_be_bytes());
                }
            }
        }
        let index = self.entry_index(ifd, tag, TYPE_RATIONAL)?;
        self.write_value(index, &bytes, values.len() as u32)?;
        self.entries[index].value = FieldValue::Rational(values.to_vec());
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn entry_index(&self, ifd: Ifd, tag: u16, type_id: u16) -> Result<usize, FixError> {
        self.entries
            .iter()
            .position(|e| e.ifd == ifd && e.tag == tag && e.type_id == type_id)
            .ok_or(FixError::UnsupportedSchema("field absent or mistyped"))
    }

    fn write_value(&mut self, index: usize, bytes: &[u8], count: u32) -> Result<(), FixError> {
        let (entry_offset, value_offset, old_len, inline) = {
            let entry = &self.entries[index];
            (entry.entry_offset, entry.value_offset, entry.value_len, entry.inline)
        };
        let capacity = if inline { 4 } else { old_len };
        if bytes.len() > capacity {
            return Err(FixError::EncodingOverflow("value larger than its slot"));
        }
        self.buf[value_offset..value_offset + bytes.len()].copy_from_slice(bytes);
        // Blank the stale tail of a shrinking value; nothing references it.
        for byte in &mut self.buf[value_offset + bytes.len()..value_offset + old_len.max(bytes.len())] {
            *byte = 0;
        }
        self.order.put_u32(&mut self.buf, entry_offset + 4, count);
        let entry = &mut self.entries[index];
        entry.count = count;
        entry.value_len = bytes.len();
        Ok(())
    }
}

/// Parses one directory, descending into the Exif and GPS sub-directories
/// from the primary one. Returns the offset of the chained directory, 0
/// when there is none.
fn parse_ifd(
    data: &[u8],
    order: ByteOrder,
    offset: usize,
    ifd: Ifd,
    entries: &mut Vec<FieldEntry>,
    ifds: &mut Vec<Ifd>,
    visited: &mut Vec<usize>,
) -> Result<usize, FixError> {
    if visited.contains(&offset) {
        return Err(FixError::MalformedContainer("directory offset cycle"));
    }
    visited.push(offset);

    if data.len() < offset || data.len() - offset < 2 {
        return Err(FixError::MalformedContainer("truncated directory count"));
    }
    let count = order.u16(data, offset) as usize;
    if data.len() - offset - 2 < count * ENTRY_LEN {
        return Err(FixError::MalformedContainer("truncated directory"));
    }
    if data.len() - offset - 2 - count * ENTRY_LEN < 4 {
        return Err(FixError::MalformedContainer("truncated chained-directory offset"));
    }
    ifds.push(ifd);

    for i in 0..count {
        let entry_offset = offset + 2 + i * ENTRY_LEN;
        let tag = order.u16(data, entry_offset);
        let type_id = order.u16(data, entry_offset + 2);
        let value_count = order.u32(data, entry_offset + 4);
        let unit_len = type_unit_len(type_id);
        let value_len = unit_len
            .checked_mul(value_count as usize)
            .ok_or(FixError::MalformedContainer("entry count overflow"))?;
        let (value_offset, inline) = if value_len <= 4 {
            (entry_offset + 8, true)
        } else {
            let external = order.u32(data, entry_offset + 8) as usize;
            if data.len() < external || data.len() - external < value_len {
                return Err(FixError::MalformedContainer("field value out of bounds"));
            }
            (external, false)
        };

        if ifd == Ifd::Primary && (tag == TAG_EXIF_IFD_POINTER || tag == TAG_GPS_IFD_POINTER) {
            let child_offset = order.u32(data, value_offset) as usize;
            let child = if tag == TAG_EXIF_IFD_POINTER {
                Ifd::Exif
            } else {
                Ifd::Gps
            };
            let next = parse_ifd(data, order, child_offset, child, entries, ifds, visited)?;
            if next != 0 {
                return Err(FixError::MalformedContainer("unexpected chained sub-directory"));
            }
            continue;
        }

        let value = decode_value(data, order, type_id, value_count, value_offset);
        entries.push(FieldEntry {
            ifd,
            tag,
            type_id,
            count: value_count,
            value,
            entry_offset,
            value_offset,
            value_len,
            inline,
        });
    }

    Ok(order.u32(data, offset + 2 + count * ENTRY_LEN) as usize)
}

fn decode_value(
    data: &[u8],
    order: ByteOrder,
    type_id: u16,
    count: u32,
    offset: usize,
) -> FieldValue {
    let count = count as usize;
    match type_id {
        TYPE_ASCII => {
            let raw = &data[offset..offset + count];
            let end = raw.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
            FieldValue::Ascii(String::from_utf8_lossy(&raw[..end]).into_owned())
        }
        TYPE_SHORT => {
            FieldValue::Short((0..count).map(|i| order.u16(data, offset + i * 2)).collect())
        }
        TYPE_LONG => {
            FieldValue::Long((0..count).map(|i| order.u32(data, offset + i * 4)).collect())
        }
        TYPE_RATIONAL => FieldValue::Rational(
            (0..count)
                .map(|i| {
                    (
                        order.u32(data, offset + i * 8),
                        order.u32(data, offset + i * 8 + 4),
                    )
                })
                .collect(),
        ),
        _ => FieldValue::Opaque { type_id },
    }
}
