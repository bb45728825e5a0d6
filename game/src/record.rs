//! Helpers for the fixed-size little endian records kept on disk.
//!
//! Text fields are ASCII, NUL padded to their width. A field completely
//! filled with text has no terminator.

use std::{fmt, io};

use serde::{Deserialize, Serialize};

/// A calendar date as stored in records: three little endian `i32`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Date {
    pub day: i32,
    pub month: i32,
    pub year: i32,
}

impl Date {
    pub const LEN: usize = 12;

    pub const fn new(day: i32, month: i32, year: i32) -> Self {
        Self { day, month, year }
    }

    pub fn read(data: &[u8]) -> Result<Self, RecordError> {
        Ok(Self {
            day: read_i32(data, 0)?,
            month: read_i32(data, 4)?,
            year: read_i32(data, 8)?,
        })
    }

    pub fn write(&self, out: &mut [u8]) {
        out[0..4].copy_from_slice(&self.day.to_le_bytes());
        out[4..8].copy_from_slice(&self.month.to_le_bytes());
        out[8..12].copy_from_slice(&self.year.to_le_bytes());
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    Truncated { expected: usize, actual: usize },
    NotAscii { field: &'static str },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { expected, actual } => {
                write!(f, "record is {actual} bytes, expected {expected}")
            }
            Self::NotAscii { field } => write!(f, "field `{field}` is not valid ASCII"),
        }
    }
}

impl std::error::Error for RecordError {}

impl From<RecordError> for io::Error {
    fn from(err: RecordError) -> Self {
        Self::new(io::ErrorKind::InvalidData, err)
    }
}

pub fn check_len(data: &[u8], expected: usize) -> Result<(), RecordError> {
    if data.len() < expected {
        return Err(RecordError::Truncated {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

pub fn read_i32(data: &[u8], offset: usize) -> Result<i32, RecordError> {
    check_len(data, offset + 4)?;
    let mut bytes = [0; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    Ok(i32::from_le_bytes(bytes))
}

/// Reads a NUL padded ASCII field.
pub fn read_text(data: &[u8], field: &'static str) -> Result<String, RecordError> {
    let end = data.iter().position(|b| *b == 0).unwrap_or(data.len());
    let text = &data[..end];
    if !text.is_ascii() {
        return Err(RecordError::NotAscii { field });
    }
    Ok(text.iter().map(|b| char::from(*b)).collect())
}

/// Writes `text` into `out`, dropping non ASCII characters, truncating to
/// the field width and padding with NUL.
pub fn write_text(out: &mut [u8], text: &str) {
    out.fill(0);
    for (dest, byte) in out.iter_mut().zip(text.bytes().filter(u8::is_ascii)) {
        *dest = byte;
    }
}
