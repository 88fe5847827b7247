//! # Alert Wire Codec
//!
//! Deterministic byte encoding of alerts. This layout is the
//! interoperability contract: two independent implementations must produce
//! and accept byte-identical encodings for the same logical alert.
//!
//! ## Unsigned Portion Wire Format
//!
//! ```text
//! [version:         u32 LE]
//! [relay_until:     i64 LE]
//! [expiration:      i64 LE]
//! [id:              u32 LE]
//! [cancel:          u32 LE]
//! [cancel_set:      compact-size count, then each id as u32 LE, ascending]
//! [min_version:     u32 LE]
//! [max_version:     u32 LE]
//! [sub_version_set: compact-size count, then each string, ascending]
//! [priority:        u32 LE]
//! [comment:         compact-size byte length, then UTF-8 bytes]
//! [status_text:     compact-size byte length, then UTF-8 bytes]
//! [reserved_text:   compact-size byte length, then UTF-8 bytes]
//! ```
//!
//! A signed alert appends `[signature: compact-size length, then bytes]`.
//!
//! ## Compact Size
//!
//! Variable-length unsigned integer prefix used for all counts and lengths:
//!
//! ```text
//! value < 0xFD          [value: u8]
//! value <= 0xFFFF       [0xFD][value: u16 LE]
//! value <= 0xFFFFFFFF   [0xFE][value: u32 LE]
//! otherwise             [0xFF][value: u64 LE]
//! ```
//!
//! Decoding enforces the minimal form; an oversized prefix is rejected with
//! [`DecodeError::NonCanonicalLength`].

use crate::alert::{SignedAlert, UnsignedAlert};
use crate::errors::DecodeError;

/// Encodes the unsigned portion of an alert.
///
/// Deterministic: two calls with equal field values produce byte-identical
/// output. These are the bytes the signature covers.
pub fn encode_unsigned(alert: &UnsignedAlert) -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    out.extend_from_slice(&alert.version.to_le_bytes());
    out.extend_from_slice(&alert.relay_until.to_le_bytes());
    out.extend_from_slice(&alert.expiration.to_le_bytes());
    out.extend_from_slice(&alert.id.to_le_bytes());
    out.extend_from_slice(&alert.cancel.to_le_bytes());

    write_compact_size(&mut out, alert.cancel_set.len() as u64);
    for id in &alert.cancel_set {
        out.extend_from_slice(&id.to_le_bytes());
    }

    out.extend_from_slice(&alert.min_version.to_le_bytes());
    out.extend_from_slice(&alert.max_version.to_le_bytes());

    write_compact_size(&mut out, alert.sub_version_set.len() as u64);
    for sub_version in &alert.sub_version_set {
        write_str(&mut out, sub_version);
    }

    out.extend_from_slice(&alert.priority.to_le_bytes());
    write_str(&mut out, &alert.comment);
    write_str(&mut out, &alert.status_text);
    write_str(&mut out, &alert.reserved_text);
    out
}

/// Encodes a signed alert to its full wire form.
///
/// The unsigned portion is emitted verbatim from the retained bytes, not
/// re-encoded from the fields, so the output always matches what the
/// signature covers.
pub fn encode_signed(alert: &SignedAlert) -> Vec<u8> {
    let mut out = Vec::with_capacity(alert.encoded_unsigned.len() + alert.signature.len() + 1);
    out.extend_from_slice(&alert.encoded_unsigned);
    write_compact_size(&mut out, alert.signature.len() as u64);
    out.extend_from_slice(&alert.signature);
    out
}

/// Decodes a signed alert from wire bytes.
///
/// The returned `encoded_unsigned` is the exact byte span parsed from the
/// input, preserving signature coverage even if the encoding is not the one
/// this crate would produce. Rejects truncated input, non-minimal length
/// prefixes, invalid UTF-8, and trailing bytes. Signature bytes are carried
/// opaquely; their cryptographic validity is the key ring's concern.
pub fn decode_signed(bytes: &[u8]) -> Result<SignedAlert, DecodeError> {
    let mut reader = Reader::new(bytes);
    let unsigned = read_unsigned(&mut reader)?;
    let encoded_unsigned = bytes[..reader.pos].to_vec();

    let signature_len = reader.read_compact_size()?;
    let signature = reader.read_bytes(signature_len)?.to_vec();

    if reader.remaining() > 0 {
        return Err(DecodeError::TrailingBytes {
            count: reader.remaining(),
        });
    }

    Ok(SignedAlert {
        unsigned,
        signature,
        encoded_unsigned,
    })
}

fn write_compact_size(out: &mut Vec<u8>, value: u64) {
    if value < 0xFD {
        out.push(value as u8);
    } else if value <= 0xFFFF {
        out.push(0xFD);
        out.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xFFFF_FFFF {
        out.push(0xFE);
        out.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        out.push(0xFF);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    write_compact_size(out, s.len() as u64);
    out.extend_from_slice(s.as_bytes());
}

fn read_unsigned(reader: &mut Reader<'_>) -> Result<UnsignedAlert, DecodeError> {
    let version = reader.read_u32_le()?;
    let relay_until = reader.read_i64_le()?;
    let expiration = reader.read_i64_le()?;
    let id = reader.read_u32_le()?;
    let cancel = reader.read_u32_le()?;

    let cancel_count = reader.read_compact_size()?;
    let mut cancel_set = std::collections::BTreeSet::new();
    for _ in 0..cancel_count {
        cancel_set.insert(reader.read_u32_le()?);
    }

    let min_version = reader.read_u32_le()?;
    let max_version = reader.read_u32_le()?;

    let sub_version_count = reader.read_compact_size()?;
    let mut sub_version_set = std::collections::BTreeSet::new();
    for _ in 0..sub_version_count {
        sub_version_set.insert(reader.read_string()?);
    }

    let priority = reader.read_u32_le()?;
    let comment = reader.read_string()?;
    let status_text = reader.read_string()?;
    let reserved_text = reader.read_string()?;

    Ok(UnsignedAlert {
        version,
        relay_until,
        expiration,
        id,
        cancel,
        cancel_set,
        min_version,
        max_version,
        sub_version_set,
        priority,
        comment,
        status_text,
        reserved_text,
    })
}

/// Cursor over an input buffer that tracks how far decoding has consumed.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Take `len` bytes, failing without allocating if the input is short.
    fn read_bytes(&mut self, len: u64) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() as u64 {
            return Err(DecodeError::UnexpectedEof {
                wanted: len,
                remaining: self.remaining() as u64,
            });
        }
        let start = self.pos;
        self.pos += len as usize;
        Ok(&self.buf[start..self.pos])
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u16_le(&mut self) -> Result<u16, DecodeError> {
        let mut bytes = [0u8; 2];
        bytes.copy_from_slice(self.read_bytes(2)?);
        Ok(u16::from_le_bytes(bytes))
    }

    fn read_u32_le(&mut self) -> Result<u32, DecodeError> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.read_bytes(4)?);
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_u64_le(&mut self) -> Result<u64, DecodeError> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.read_bytes(8)?);
        Ok(u64::from_le_bytes(bytes))
    }

    fn read_i64_le(&mut self) -> Result<i64, DecodeError> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.read_bytes(8)?);
        Ok(i64::from_le_bytes(bytes))
    }

    /// Read a compact-size value, rejecting non-minimal encodings.
    fn read_compact_size(&mut self) -> Result<u64, DecodeError> {
        let tag = self.read_u8()?;
        match tag {
            0xFD => {
                let value = self.read_u16_le()? as u64;
                if value < 0xFD {
                    return Err(DecodeError::NonCanonicalLength { value });
                }
                Ok(value)
            }
            0xFE => {
                let value = self.read_u32_le()? as u64;
                if value <= 0xFFFF {
                    return Err(DecodeError::NonCanonicalLength { value });
                }
                Ok(value)
            }
            0xFF => {
                let value = self.read_u64_le()?;
                if value <= 0xFFFF_FFFF {
                    return Err(DecodeError::NonCanonicalLength { value });
                }
                Ok(value)
            }
            direct => Ok(direct as u64),
        }
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        let len = self.read_compact_size()?;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
    }
}
