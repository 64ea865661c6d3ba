//! Big-endian fixed-layout record codec.
//!
//! Every on-disk structure of the format has a fixed size and big-endian
//! fields. Records implement [`FixedRecord`]; decoding goes through a
//! bounds-checked [`Reader`] so a short slice becomes a
//! [`QuartetError::Format`] for the record's structure instead of a panic.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use crate::error::{QuartetError, QuartetResult, Structure};

/// A record with a fixed byte layout.
pub trait FixedRecord: Sized {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Structure reported on decode failures.
    const STRUCTURE: Structure;

    /// Decode from the first [`Self::SIZE`] bytes of `data`.
    fn decode(data: &[u8]) -> QuartetResult<Self>;

    /// Append the encoded record to `out`.
    fn encode(&self, out: &mut Vec<u8>);

    /// Decode the record located at `offset` in `data`.
    fn decode_at(data: &[u8], offset: usize) -> QuartetResult<Self> {
        let end = offset.checked_add(Self::SIZE).unwrap_or(usize::MAX);
        if end > data.len() {
            return Err(QuartetError::format_at(
                Self::STRUCTURE,
                format!(
                    "not enough data for record -- {} bytes needed at offset {}, buffer has {}",
                    Self::SIZE,
                    offset,
                    data.len()
                ),
                offset,
            ));
        }
        Self::decode(&data[offset..end])
    }

    /// Encode into a fresh buffer.
    fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        self.encode(&mut out);
        out
    }
}

/// Cursor over a byte slice reading big-endian fields.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    structure: Structure,
}

impl<'a> Reader<'a> {
    /// Create a reader for a record of `structure`.
    pub fn new(data: &'a [u8], structure: Structure) -> Self {
        Self {
            data,
            pos: 0,
            structure,
        }
    }

    /// Current position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Take the next `n` bytes.
    pub fn bytes(&mut self, n: usize) -> QuartetResult<&'a [u8]> {
        let end = self.pos + n;
        if end > self.data.len() {
            return Err(QuartetError::format_at(
                self.structure,
                format!(
                    "unexpected end of data -- {} bytes needed, {} left",
                    n,
                    self.data.len() - self.pos
                ),
                self.pos,
            ));
        }
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    /// Take the next `N` bytes as an array.
    pub fn array<const N: usize>(&mut self) -> QuartetResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    /// Read an 8-bit value.
    pub fn u8(&mut self) -> QuartetResult<u8> {
        Ok(self.bytes(1)?[0])
    }

    /// Read a 16-bit big-endian value.
    pub fn u16(&mut self) -> QuartetResult<u16> {
        Ok(BigEndian::read_u16(self.bytes(2)?))
    }

    /// Read a 24-bit big-endian value.
    pub fn u24(&mut self) -> QuartetResult<u32> {
        Ok(BigEndian::read_u24(self.bytes(3)?))
    }

    /// Read a 32-bit big-endian value.
    pub fn u32(&mut self) -> QuartetResult<u32> {
        Ok(BigEndian::read_u32(self.bytes(4)?))
    }
}

/// Append a 16-bit big-endian value.
pub fn put_u16(out: &mut Vec<u8>, value: u16) {
    // Writing into a Vec cannot fail.
    let _ = out.write_u16::<BigEndian>(value);
}

/// Append a 24-bit big-endian value.
pub fn put_u24(out: &mut Vec<u8>, value: u32) {
    let _ = out.write_u24::<BigEndian>(value);
}

/// Append a 32-bit big-endian value.
pub fn put_u32(out: &mut Vec<u8>, value: u32) {
    let _ = out.write_u32::<BigEndian>(value);
}

/// Read a 32-bit big-endian value at `offset` if it fits.
pub fn peek_u32(data: &[u8], offset: usize) -> Option<u32> {
    data.get(offset..offset.checked_add(4)?)
        .map(BigEndian::read_u32)
}

/// Decode a 16.16 fixed-point field whose value lives in the high word.
///
/// Returns `None` when the low word is nonzero (misaligned data).
pub fn fp16_to_int(raw: u32) -> Option<u16> {
    if raw & 0xFFFF != 0 {
        None
    } else {
        Some((raw >> 16) as u16)
    }
}

/// Encode an integer as a 16.16 fixed-point field.
pub fn int_to_fp16(value: u16) -> u32 {
    (value as u32) << 16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_reads_big_endian() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x01, 0x02];
        let mut r = Reader::new(&data, Structure::Song);
        assert_eq!(r.u16().unwrap(), 0x1234);
        assert_eq!(r.u32().unwrap(), 0x5678_9ABC);
        assert_eq!(r.u8().unwrap(), 0xDE);
        assert_eq!(r.u24().unwrap(), 0xF0_0102);
        assert_eq!(r.position(), 10);
    }

    #[test]
    fn test_reader_short_data_is_format_error() {
        let data = [0u8; 3];
        let mut r = Reader::new(&data, Structure::Sequence);
        r.u16().unwrap();
        let err = r.u32().unwrap_err();
        assert_eq!(err.structure(), Structure::Sequence);
        assert_eq!(err.offset(), Some(2));
    }

    #[test]
    fn test_put_helpers() {
        let mut out = Vec::new();
        put_u16(&mut out, 0x4C00);
        put_u24(&mut out, 0x00_5622);
        put_u32(&mut out, 0xFFFF_0000);
        assert_eq!(out, [0x4C, 0x00, 0x00, 0x56, 0x22, 0xFF, 0xFF, 0x00, 0x00]);
    }

    #[test]
    fn test_fp16() {
        assert_eq!(fp16_to_int(0x0010_0000), Some(16));
        assert_eq!(fp16_to_int(0x0010_0001), None);
        assert_eq!(fp16_to_int(0), Some(0));
        assert_eq!(int_to_fp16(16), 0x0010_0000);
    }

    #[test]
    fn test_peek_u32_bounds() {
        let data = [0, 0, 0, 1, 2];
        assert_eq!(peek_u32(&data, 0), Some(1));
        assert_eq!(peek_u32(&data, 1), Some(0x0000_0102));
        assert_eq!(peek_u32(&data, 2), None);
        assert_eq!(peek_u32(&data, usize::MAX), None);
    }
}
