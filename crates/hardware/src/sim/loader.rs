//! Program image loading.
//!
//! This module parses on-disk program images into an in-memory [`Image`]
//! before anything touches simulated memory. It supports:
//! 1. **Custom records:** one `<address> <word>` assignment per line, as
//!    written by the simulator's own tooling.
//! 2. **Intel HEX:** `:LLAAAATT<data>CC` records with checksums, extended
//!    segment/linear addressing and start-address records.
//!
//! Parsing is all-or-nothing: the first malformed record aborts the load and
//! no partial image is returned.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::trace;

use crate::common::error::LoadError;

/// On-disk record format of a program image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    /// `<address> <word>` per line, both hexadecimal.
    #[serde(alias = "CustomHex", alias = "custom")]
    CustomHex,
    /// Standard Intel HEX.
    #[default]
    #[serde(alias = "IntelHex", alias = "ihex")]
    IntelHex,
}

/// Intel HEX record types.
mod record {
    pub const DATA: u8 = 0x00;
    pub const END_OF_FILE: u8 = 0x01;
    pub const EXTENDED_SEGMENT_ADDRESS: u8 = 0x02;
    pub const START_SEGMENT_ADDRESS: u8 = 0x03;
    pub const EXTENDED_LINEAR_ADDRESS: u8 = 0x04;
    pub const START_LINEAR_ADDRESS: u8 = 0x05;
}

/// Byte count, two address bytes, record type and checksum.
const IHEX_OVERHEAD: usize = 5;

/// Contiguous bytes destined for one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Target byte address.
    pub addr: u64,
    /// Bytes to store.
    pub data: Vec<u8>,
    /// 1-based source line, for error reporting.
    pub line: usize,
}

/// Fully parsed program image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    /// Data in file order; later segments overwrite earlier ones.
    pub segments: Vec<Segment>,
    /// Entry point from a start-address record, if present.
    pub entry: Option<u32>,
}

/// What a successful load wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Data records applied.
    pub records: usize,
    /// Data bytes written.
    pub bytes: usize,
    /// Entry point from a start-address record, if present.
    pub entry: Option<u32>,
}

impl Image {
    /// Summarizes the image.
    pub fn summary(&self) -> LoadSummary {
        LoadSummary {
            records: self.segments.len(),
            bytes: self.segments.iter().map(|s| s.data.len()).sum(),
            entry: self.entry,
        }
    }

    /// Checks that every segment fits in a memory of `capacity` bytes.
    ///
    /// # Errors
    ///
    /// [`LoadError::OutOfRange`] for the first segment that does not fit.
    pub fn check_fits(&self, capacity: u64) -> Result<(), LoadError> {
        for seg in &self.segments {
            let end = seg.addr.checked_add(seg.data.len() as u64);
            if end.is_none_or(|end| end > capacity) {
                return Err(LoadError::OutOfRange {
                    line: seg.line,
                    addr: seg.addr,
                    len: seg.data.len(),
                    capacity,
                });
            }
        }
        Ok(())
    }
}

/// Reads and parses an image file.
///
/// # Errors
///
/// [`LoadError::Io`] if the file cannot be read, otherwise as
/// [`parse_image`].
pub fn read_image(path: &Path, format: ImageFormat) -> Result<Image, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_image(&text, format)
}

/// Parses image text in the given format.
///
/// # Errors
///
/// Any structural [`LoadError`].
pub fn parse_image(text: &str, format: ImageFormat) -> Result<Image, LoadError> {
    match format {
        ImageFormat::CustomHex => parse_custom_hex(text),
        ImageFormat::IntelHex => parse_intel_hex(text),
    }
}

fn parse_custom_hex(text: &str) -> Result<Image, LoadError> {
    let mut image = Image::default();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let rec = raw.trim();
        if rec.is_empty() || rec.starts_with('#') {
            continue;
        }

        let mut fields = rec.split_whitespace();
        let (Some(addr), Some(word), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(LoadError::malformed(line, "expected `<address> <word>`"));
        };

        let addr = parse_hex_u32(addr)
            .ok_or_else(|| LoadError::malformed(line, format!("invalid address `{addr}`")))?;
        let word = parse_hex_u32(word)
            .ok_or_else(|| LoadError::malformed(line, format!("invalid word `{word}`")))?;
        if addr % 4 != 0 {
            return Err(LoadError::malformed(
                line,
                format!("address {addr:#x} is not word-aligned"),
            ));
        }

        trace!(line, addr, word, "custom record");
        image.segments.push(Segment {
            addr: u64::from(addr),
            data: word.to_le_bytes().to_vec(),
            line,
        });
    }

    Ok(image)
}

fn parse_hex_u32(token: &str) -> Option<u32> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

fn parse_intel_hex(text: &str) -> Result<Image, LoadError> {
    let mut image = Image::default();
    let mut base: u64 = 0;
    let mut seen_eof = false;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let rec = raw.trim();
        if rec.is_empty() {
            continue;
        }

        let bytes = decode_record(line, rec)?;
        let count = bytes[0] as usize;
        let offset = u64::from(u16::from_be_bytes([bytes[1], bytes[2]]));
        let kind = bytes[3];
        let data = &bytes[4..4 + count];

        match kind {
            record::DATA => {
                trace!(line, addr = base + offset, len = count, "data record");
                image.segments.push(Segment {
                    addr: base + offset,
                    data: data.to_vec(),
                    line,
                });
            }
            record::END_OF_FILE => {
                seen_eof = true;
                break;
            }
            record::EXTENDED_SEGMENT_ADDRESS => {
                base = u64::from(be_u16(line, data)?) << 4;
            }
            record::EXTENDED_LINEAR_ADDRESS => {
                base = u64::from(be_u16(line, data)?) << 16;
            }
            record::START_SEGMENT_ADDRESS => {
                let cs_ip = be_u32(line, data)?;
                image.entry = Some(((cs_ip >> 16) << 4).wrapping_add(cs_ip & 0xFFFF));
            }
            record::START_LINEAR_ADDRESS => {
                image.entry = Some(be_u32(line, data)?);
            }
            other => trace!(line, kind = other, "ignoring record"),
        }
    }

    if !seen_eof {
        return Err(LoadError::MissingEndOfFile);
    }
    Ok(image)
}

/// Decodes one `:`-prefixed record into its bytes and verifies length and
/// checksum. The returned vector is at least [`IHEX_OVERHEAD`] bytes long
/// and its length matches the byte count.
fn decode_record(line: usize, rec: &str) -> Result<Vec<u8>, LoadError> {
    let Some(hex) = rec.strip_prefix(':') else {
        return Err(LoadError::malformed(line, "record does not start with ':'"));
    };
    if hex.len() % 2 != 0 {
        return Err(LoadError::malformed(line, "odd number of hex digits"));
    }

    let bytes = hex
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .filter(|s| s.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|s| u8::from_str_radix(s, 16).ok())
        })
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(|| LoadError::malformed(line, "invalid hex digit"))?;

    if bytes.len() < IHEX_OVERHEAD {
        return Err(LoadError::malformed(line, "truncated record"));
    }
    let count = bytes[0] as usize;
    if bytes.len() != count + IHEX_OVERHEAD {
        return Err(LoadError::malformed(
            line,
            format!(
                "byte count {count} does not match {} data bytes",
                bytes.len() - IHEX_OVERHEAD
            ),
        ));
    }

    let (body, checksum) = bytes.split_at(bytes.len() - 1);
    let sum = body.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    let computed = sum.wrapping_neg();
    if computed != checksum[0] {
        return Err(LoadError::Checksum {
            line,
            expected: checksum[0],
            computed,
        });
    }

    Ok(bytes)
}

fn be_u16(line: usize, data: &[u8]) -> Result<u16, LoadError> {
    match data {
        [hi, lo] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(LoadError::malformed(line, "address record needs 2 data bytes")),
    }
}

fn be_u32(line: usize, data: &[u8]) -> Result<u32, LoadError> {
    match data {
        [a, b, c, d] => Ok(u32::from_be_bytes([*a, *b, *c, *d])),
        _ => Err(LoadError::malformed(line, "start record needs 4 data bytes")),
    }
}
