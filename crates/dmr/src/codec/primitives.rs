//! Primitive encoding/decoding for the DMR binary format.
//!
//! All multi-byte integers are big-endian. Strings use the modified UTF-8
//! encoding of `java.io.DataOutput`: a 16-bit length prefix, NUL written as
//! `0xC0 0x80`, and supplementary characters written as surrogate pairs.

use crate::error::{DecodeError, EncodeError};
use crate::limits::MAX_UTF_LEN;

// =============================================================================
// DECODING
// =============================================================================

/// Reader for decoding binary data.
///
/// Wraps a byte slice and provides methods for reading primitives
/// with bounds checking and error handling.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of remaining bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        if self.pos >= self.data.len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining_len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads exactly N bytes into an array.
    #[inline]
    fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, context)?);
        Ok(out)
    }

    /// Reads a big-endian u16.
    pub fn read_u16(&mut self, context: &'static str) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.read_array(context)?))
    }

    /// Reads a big-endian i32.
    pub fn read_i32(&mut self, context: &'static str) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.read_array(context)?))
    }

    /// Reads a big-endian i64.
    pub fn read_i64(&mut self, context: &'static str) -> Result<i64, DecodeError> {
        Ok(i64::from_be_bytes(self.read_array(context)?))
    }

    /// Reads a big-endian IEEE-754 f64. NaN payloads are preserved.
    pub fn read_f64(&mut self, context: &'static str) -> Result<f64, DecodeError> {
        Ok(f64::from_bits(u64::from_be_bytes(self.read_array(context)?)))
    }

    /// Reads an i32 length prefix, rejecting negative and over-limit values.
    pub fn read_length(&mut self, max: usize, field: &'static str) -> Result<usize, DecodeError> {
        let len = self.read_i32(field)?;
        if len < 0 {
            return Err(DecodeError::NegativeLength { field, len });
        }
        let len = len as usize;
        if len > max {
            return Err(DecodeError::LengthExceedsLimit { field, len, max });
        }
        Ok(len)
    }

    /// Reads an i32-length-prefixed byte array.
    pub fn read_bytes_prefixed(
        &mut self,
        max_len: usize,
        field: &'static str,
    ) -> Result<Vec<u8>, DecodeError> {
        let len = self.read_length(max_len, field)?;
        Ok(self.read_bytes(len, field)?.to_vec())
    }

    /// Reads a u16-length-prefixed modified UTF-8 string.
    pub fn read_utf(&mut self, field: &'static str) -> Result<String, DecodeError> {
        let len = self.read_u16(field)? as usize;
        let bytes = self.read_bytes(len, field)?;
        decode_modified_utf8(bytes, field)
    }

    /// Reads an i32-length-prefixed UTF-8 string (the long string payload).
    pub fn read_utf_long(&mut self, max_len: usize, field: &'static str) -> Result<String, DecodeError> {
        let len = self.read_length(max_len, field)?;
        let bytes = self.read_bytes(len, field)?;
        decode_modified_utf8(bytes, field)
    }
}

/// Decodes modified UTF-8, also accepting standard 4-byte sequences.
fn decode_modified_utf8(bytes: &[u8], field: &'static str) -> Result<String, DecodeError> {
    // Well-formed standard UTF-8 decodes identically under both encodings.
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Ok(s.to_string());
    }

    let invalid = || DecodeError::InvalidUtf8 { field };
    let continuation = |i: usize| -> Result<u16, DecodeError> {
        match bytes.get(i) {
            Some(b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u16),
            _ => Err(invalid()),
        }
    };

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < 0x80 {
            units.push(b as u16);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            units.push(((b & 0x1F) as u16) << 6 | continuation(i + 1)?);
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            units.push(((b & 0x0F) as u16) << 12 | continuation(i + 1)? << 6 | continuation(i + 2)?);
            i += 3;
        } else if b & 0xF8 == 0xF0 {
            let cp = ((b & 0x07) as u32) << 18
                | (continuation(i + 1)? as u32) << 12
                | (continuation(i + 2)? as u32) << 6
                | continuation(i + 3)? as u32;
            let ch = char::from_u32(cp).ok_or_else(invalid)?;
            let mut buf = [0u16; 2];
            units.extend_from_slice(ch.encode_utf16(&mut buf));
            i += 4;
        } else {
            return Err(invalid());
        }
    }
    String::from_utf16(&units).map_err(|_| invalid())
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for encoding binary data.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a big-endian i32.
    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a big-endian i64.
    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a big-endian IEEE-754 f64.
    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_bits().to_be_bytes());
    }

    /// Writes an i32 length prefix.
    pub fn write_length(&mut self, len: usize, field: &'static str) -> Result<(), EncodeError> {
        let len = i32::try_from(len).map_err(|_| EncodeError::LengthExceedsLimit {
            field,
            len,
            max: i32::MAX as usize,
        })?;
        self.write_i32(len);
        Ok(())
    }

    /// Writes an i32-length-prefixed byte array.
    pub fn write_bytes_prefixed(&mut self, bytes: &[u8], field: &'static str) -> Result<(), EncodeError> {
        self.write_length(bytes.len(), field)?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Writes a u16-length-prefixed modified UTF-8 string.
    pub fn write_utf(&mut self, s: &str, field: &'static str) -> Result<(), EncodeError> {
        let len = modified_utf8_len(s);
        if len > MAX_UTF_LEN {
            return Err(EncodeError::LengthExceedsLimit {
                field,
                len,
                max: MAX_UTF_LEN,
            });
        }
        self.buf.reserve(2 + len);
        self.buf.extend_from_slice(&(len as u16).to_be_bytes());
        for unit in s.encode_utf16() {
            match unit {
                0x0001..=0x007F => self.buf.push(unit as u8),
                0x0000 | 0x0080..=0x07FF => {
                    self.buf.push(0xC0 | (unit >> 6) as u8);
                    self.buf.push(0x80 | (unit & 0x3F) as u8);
                }
                _ => {
                    self.buf.push(0xE0 | (unit >> 12) as u8);
                    self.buf.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                    self.buf.push(0x80 | (unit & 0x3F) as u8);
                }
            }
        }
        Ok(())
    }

    /// Writes an i32-length-prefixed UTF-8 string, for text too long for
    /// [`write_utf`](Self::write_utf).
    pub fn write_utf_long(&mut self, s: &str, field: &'static str) -> Result<(), EncodeError> {
        self.write_bytes_prefixed(s.as_bytes(), field)
    }
}

/// Returns the modified UTF-8 byte length of a string.
pub fn modified_utf8_len(s: &str) -> usize {
    s.encode_utf16()
        .map(|unit| match unit {
            0x0001..=0x007F => 1,
            0x0000 | 0x0080..=0x07FF => 2,
            _ => 3,
        })
        .sum()
}
