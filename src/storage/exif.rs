//! EXIF extraction for JPEG files
//!
//! A small reader for the JPEG header segments: it walks the APP1 `Exif` TIFF
//! structure far enough to pick up the camera and exposure tags shown next to
//! each photo, and takes the pixel size from the frame header. Only the bytes
//! before the first scan are looked at, so a bounded prefix of the file is
//! enough. Everything here is pure, so malformed input simply yields `None`.

use crate::storage::results::ImageInfo;

/// Bytes of a JPEG file handed to [`image_info`]. APP segments are capped at
/// 64 KiB each; this leaves room for EXIF, an ICC profile and the tables
/// ahead of the frame header.
pub const HEADER_READ_LIMIT: u64 = 256 * 1024;

const MARKER_SOI: u8 = 0xD8;
const MARKER_SOS: u8 = 0xDA;
const MARKER_EOI: u8 = 0xD9;
const MARKER_APP1: u8 = 0xE1;
const EXIF_HEADER: &[u8] = b"Exif\0\0";

const TAG_MAKE: u16 = 0x010F;
const TAG_MODEL: u16 = 0x0110;
const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_EXPOSURE_TIME: u16 = 0x829A;
const TAG_F_NUMBER: u16 = 0x829D;
const TAG_FOCAL_LENGTH: u16 = 0x920A;

const TYPE_ASCII: u16 = 2;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;
const TYPE_IFD: u16 = 13;

/// Camera and exposure tags read from EXIF
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifTags {
    pub camera: Option<String>,
    pub settings: Option<String>,
}

/// Builds the image attributes of a JPEG from its leading bytes.
///
/// Returns `None` when the bytes carry no readable EXIF or no frame header.
pub fn image_info(bytes: &[u8]) -> Option<ImageInfo> {
    let headers = scan_headers(bytes)?;
    let tags = read_tiff(headers.exif?)?;
    let size = headers.frame_size?;

    Some(ImageInfo {
        camera: tags.camera,
        settings: tags.settings,
        size,
    })
}

/// Reads the EXIF tags of a JPEG held in memory.
pub fn read_exif(bytes: &[u8]) -> Option<ExifTags> {
    read_tiff(scan_headers(bytes)?.exif?)
}

fn read_tiff(tiff: &[u8]) -> Option<ExifTags> {
    let reader = TiffReader::new(tiff)?;

    let ifd0 = reader.u32_at(4)? as usize;
    let mut make = None;
    let mut model = None;
    let mut exif_ifd = None;
    for entry in reader.entries(ifd0)? {
        match entry.tag {
            TAG_MAKE => make = reader.ascii(&entry),
            TAG_MODEL => model = reader.ascii(&entry),
            TAG_EXIF_IFD if matches!(entry.kind, TYPE_LONG | TYPE_IFD) => {
                exif_ifd = Some(entry.value_offset)
            }
            _ => {}
        }
    }

    let mut exposure = None;
    let mut f_number = None;
    let mut focal_length = None;
    if let Some(offset) = exif_ifd {
        for entry in reader.entries(offset as usize)? {
            match entry.tag {
                TAG_EXPOSURE_TIME => exposure = reader.rational(&entry),
                TAG_F_NUMBER => f_number = reader.rational(&entry),
                TAG_FOCAL_LENGTH => focal_length = reader.rational(&entry),
                _ => {}
            }
        }
    }

    let settings = match (f_number, exposure, focal_length) {
        (Some(f), Some(t), Some(l)) => format_settings(f, t, l),
        _ => None,
    };

    Some(ExifTags {
        camera: camera_name(make, model),
        settings,
    })
}

/// Joins make and model, avoiding repeats such as "Canon Canon EOS 450D".
fn camera_name(make: Option<String>, model: Option<String>) -> Option<String> {
    match (make, model) {
        (Some(make), Some(model)) if model.starts_with(&make) => Some(model),
        (Some(make), Some(model)) => Some(format!("{make} {model}")),
        (make, model) => make.or(model),
    }
}

/// Formats `f/<aperture>, <shutter> sec, <focal> mm` with non-breaking spaces
/// before the units.
fn format_settings(
    f_number: (u32, u32),
    exposure: (u32, u32),
    focal_length: (u32, u32),
) -> Option<String> {
    let aperture = ratio(f_number)?;
    let shutter = format_shutter(exposure)?;
    let focal = ratio(focal_length)?;
    Some(format!(
        "f/{aperture:.1}, {shutter}\u{a0}sec, {focal:.0}\u{a0}mm"
    ))
}

fn ratio((num, den): (u32, u32)) -> Option<f64> {
    if den == 0 {
        return None;
    }
    Some(num as f64 / den as f64)
}

/// Exposures under a second are shown as a reduced fraction, longer ones in
/// seconds.
fn format_shutter((num, den): (u32, u32)) -> Option<String> {
    if den == 0 || num == 0 {
        return None;
    }
    if num >= den {
        let seconds = num as f64 / den as f64;
        if num % den == 0 {
            return Some(format!("{}", num / den));
        }
        return Some(format!("{seconds:.1}"));
    }
    let divisor = gcd(num, den);
    Some(format!("{}/{}", num / divisor, den / divisor))
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// What the header segments of a JPEG carry
#[derive(Debug, Default)]
struct Headers<'a> {
    /// TIFF payload of the first APP1 `Exif` segment
    exif: Option<&'a [u8]>,
    /// `(width, height)` from the frame header
    frame_size: Option<(u32, u32)>,
}

/// Start-of-frame markers; C4, C8 and CC share the range but are not frames.
fn is_frame_marker(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}

/// Walks the segments ahead of the first scan.
///
/// Stops at the frame header, at the start of scan or where the bytes run
/// out, returning whatever was found on the way.
fn scan_headers(bytes: &[u8]) -> Option<Headers<'_>> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != MARKER_SOI {
        return None;
    }

    let mut headers = Headers::default();
    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            break;
        }
        let marker = bytes[pos + 1];
        if marker == 0xFF {
            // fill byte
            pos += 1;
            continue;
        }
        if marker == MARKER_SOS || marker == MARKER_EOI {
            break;
        }

        let length = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        if length < 2 {
            break;
        }
        let Some(data) = bytes.get(pos + 4..pos + 2 + length) else {
            break;
        };

        if marker == MARKER_APP1 && headers.exif.is_none() && data.starts_with(EXIF_HEADER) {
            headers.exif = Some(&data[EXIF_HEADER.len()..]);
        } else if is_frame_marker(marker) && data.len() >= 5 {
            let height = u16::from_be_bytes([data[1], data[2]]) as u32;
            let width = u16::from_be_bytes([data[3], data[4]]) as u32;
            headers.frame_size = Some((width, height));
            break;
        }
        pos += 2 + length;
    }
    Some(headers)
}

#[derive(Debug)]
struct IfdEntry {
    tag: u16,
    kind: u16,
    count: u32,
    value_offset: u32,
    /// Offset of the 4-byte value field, for values stored inline
    field_pos: usize,
}

struct TiffReader<'a> {
    data: &'a [u8],
    little_endian: bool,
}

impl<'a> TiffReader<'a> {
    fn new(data: &'a [u8]) -> Option<Self> {
        let little_endian = match data.get(0..2)? {
            b"II" => true,
            b"MM" => false,
            _ => return None,
        };
        let reader = Self {
            data,
            little_endian,
        };
        if reader.u16_at(2)? != 42 {
            return None;
        }
        Some(reader)
    }

    fn u16_at(&self, pos: usize) -> Option<u16> {
        let raw: [u8; 2] = self.data.get(pos..pos + 2)?.try_into().ok()?;
        Some(if self.little_endian {
            u16::from_le_bytes(raw)
        } else {
            u16::from_be_bytes(raw)
        })
    }

    fn u32_at(&self, pos: usize) -> Option<u32> {
        let raw: [u8; 4] = self.data.get(pos..pos + 4)?.try_into().ok()?;
        Some(if self.little_endian {
            u32::from_le_bytes(raw)
        } else {
            u32::from_be_bytes(raw)
        })
    }

    fn entries(&self, offset: usize) -> Option<Vec<IfdEntry>> {
        let count = self.u16_at(offset)? as usize;
        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let pos = offset + 2 + i * 12;
            entries.push(IfdEntry {
                tag: self.u16_at(pos)?,
                kind: self.u16_at(pos + 2)?,
                count: self.u32_at(pos + 4)?,
                value_offset: self.u32_at(pos + 8)?,
                field_pos: pos + 8,
            });
        }
        Some(entries)
    }

    fn ascii(&self, entry: &IfdEntry) -> Option<String> {
        if entry.kind != TYPE_ASCII {
            return None;
        }
        let len = entry.count as usize;
        let start = if len <= 4 {
            entry.field_pos
        } else {
            entry.value_offset as usize
        };
        let raw = self.data.get(start..start.checked_add(len)?)?;
        let text = String::from_utf8_lossy(raw);
        let text = text.trim_end_matches('\0').trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    fn rational(&self, entry: &IfdEntry) -> Option<(u32, u32)> {
        if entry.kind != TYPE_RATIONAL || entry.count == 0 {
            return None;
        }
        let pos = entry.value_offset as usize;
        Some((self.u32_at(pos)?, self.u32_at(pos.checked_add(4)?)?))
    }
}
