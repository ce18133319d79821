use img_parts::jpeg::Jpeg;
use img_parts::png::Png;
use img_parts::{Bytes, ImageEXIF};

use crate::error::FixError;

const JPEG_SOI: [u8; 2] = [0xff, 0xd8];
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Jpeg,
    Png,
}

fn detect(file_bytes: &[u8]) -> Result<ContainerKind, FixError> {
    if file_bytes.starts_with(&JPEG_SOI) {
        Ok(ContainerKind::Jpeg)
    } else if file_bytes.starts_with(&PNG_SIGNATURE) {
        Ok(ContainerKind::Png)
    } else {
        Err(FixError::MalformedContainer("not a JPEG or PNG file"))
    }
}

/// Raw TIFF payload of the file's EXIF segment: the APP1 body after the
/// `Exif\0\0` identifier for JPEG, the eXIf chunk for PNG. `Ok(None)` when
/// the container parses but carries no EXIF.
pub fn extract_exif(file_bytes: &[u8]) -> Result<Option<Vec<u8>>, FixError> {
    match detect(file_bytes)? {
        ContainerKind::Jpeg => {
            let jpeg = Jpeg::from_bytes(Bytes::copy_from_slice(file_bytes))
                .map_err(|_| FixError::MalformedContainer("unparsable JPEG segment structure"))?;
            Ok(jpeg.exif().map(|payload| payload.to_vec()))
        }
        ContainerKind::Png => {
            let png = Png::from_bytes(Bytes::copy_from_slice(file_bytes))
                .map_err(|_| FixError::MalformedContainer("unparsable PNG chunk structure"))?;
            Ok(png.exif().map(|payload| payload.to_vec()))
        }
    }
}

/// Splices a rewritten EXIF segment back into the container. Segment
/// length prefixes are recomputed on encode; every other segment's bytes
/// are carried over as they were.
pub fn replace_exif(file_bytes: &[u8], segment: &[u8]) -> Result<Vec<u8>, FixError> {
    let payload = Bytes::copy_from_slice(segment);
    match detect(file_bytes)? {
        ContainerKind::Jpeg => {
            let mut jpeg = Jpeg::from_bytes(Bytes::copy_from_slice(file_bytes))
                .map_err(|_| FixError::MalformedContainer("unparsable JPEG segment structure"))?;
            jpeg.set_exif(Some(payload));
            Ok(jpeg.encoder().bytes().to_vec())
        }
        ContainerKind::Png => {
            let mut png = Png::from_bytes(Bytes::copy_from_slice(file_bytes))
                .map_err(|_| FixError::MalformedContainer("unparsable PNG chunk structure"))?;
            png.set_exif(Some(payload));
            Ok(png.encoder().bytes().to_vec())
        }
    }
}
