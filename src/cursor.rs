//! Bounds-checked little-endian reads over a database image.
//!
//! Every address stored in a BIN file (header bases, index entries, row
//! offsets) is a **1-based** file position, so all accessors here take
//! 1-based positions and translate to slice indices in one place. String
//! pointers stored inside rows are 0-based; callers add one before reading.
//!
//! Reads never panic on malformed input: anything that would run past the
//! end of the mapped region returns [`GeoError::CorruptRecord`].
//!
//! # Example
//!
//! ```rust
//! use ip2geo::cursor::ByteCursor;
//!
//! let image = [0x02, b'U', b'S', 0x78, 0x56, 0x34, 0x12];
//! let cursor = ByteCursor::new(&image);
//!
//! assert_eq!(cursor.str_at(1)?, "US");
//! assert_eq!(cursor.u32_at(4)?, 0x12345678);
//! # Ok::<(), ip2geo::GeoError>(())
//! ```

use crate::error::{GeoError, Result};

/// Read-only view over a database image with 1-based positional reads
#[derive(Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
}

impl<'a> ByteCursor<'a> {
    /// Wrap a byte slice (usually the whole mapped file)
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Size of the underlying image in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the image is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get `length` bytes starting at 1-based `position`
    pub fn slice_at(&self, position: u64, length: usize) -> Result<&'a [u8]> {
        let start = position
            .checked_sub(1)
            .and_then(|p| usize::try_from(p).ok())
            .ok_or_else(|| GeoError::CorruptRecord(format!("invalid file position {}", position)))?;

        match start.checked_add(length) {
            Some(end) if end <= self.data.len() => Ok(&self.data[start..end]),
            _ => Err(GeoError::CorruptRecord(format!(
                "read of {} bytes at position {} exceeds file size {}",
                length,
                position,
                self.data.len()
            ))),
        }
    }

    /// Read a single byte
    #[inline]
    pub fn u8_at(&self, position: u64) -> Result<u8> {
        Ok(self.slice_at(position, 1)?[0])
    }

    /// Read a little-endian u32
    #[inline]
    pub fn u32_at(&self, position: u64) -> Result<u32> {
        Ok(le_u32(self.slice_at(position, 4)?, 0))
    }

    /// Read two consecutive little-endian u32 values
    #[inline]
    pub fn u32_pair_at(&self, position: u64) -> Result<(u32, u32)> {
        let bytes = self.slice_at(position, 8)?;
        Ok((le_u32(bytes, 0), le_u32(bytes, 4)))
    }

    /// Read a little-endian IEEE-754 f32
    #[inline]
    pub fn f32_at(&self, position: u64) -> Result<f32> {
        Ok(f32::from_bits(self.u32_at(position)?))
    }

    /// Read a length-prefixed single-byte-charset string
    ///
    /// The first byte is the character count; each following byte is one
    /// Latin-1 code point, so the result is at most 255 characters.
    pub fn str_at(&self, position: u64) -> Result<String> {
        let len = self.u8_at(position)? as usize;
        let bytes = self.slice_at(position + 1, len)?;
        Ok(latin1_to_string(bytes))
    }
}

impl std::fmt::Debug for ByteCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteCursor")
            .field("len", &self.data.len())
            .finish()
    }
}

/// Little-endian u32 at byte index `at` of an already bounds-checked window
#[inline(always)]
pub(crate) fn le_u32(window: &[u8], at: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&window[at..at + 4]);
    u32::from_le_bytes(bytes)
}

/// 128-bit value from four little-endian u32 limbs, least significant first
#[inline(always)]
pub(crate) fn le_u128_limbs(window: &[u8], at: usize) -> u128 {
    ((le_u32(window, at + 12) as u128) << 96)
        | ((le_u32(window, at + 8) as u128) << 64)
        | ((le_u32(window, at + 4) as u128) << 32)
        | (le_u32(window, at) as u128)
}

/// Latin-1 decode: every byte maps to the code point of the same value
fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_are_one_based() {
        let data = [0xAA, 0xBB, 0xCC];
        let cursor = ByteCursor::new(&data);
        assert_eq!(cursor.u8_at(1).unwrap(), 0xAA);
        assert_eq!(cursor.u8_at(3).unwrap(), 0xCC);
        assert!(cursor.u8_at(0).is_err());
        assert!(cursor.u8_at(4).is_err());
    }

    #[test]
    fn test_read_u32_and_pair() {
        let data = [0x78, 0x56, 0x34, 0x12, 0xEF, 0xBE, 0xAD, 0xDE];
        let cursor = ByteCursor::new(&data);
        assert_eq!(cursor.u32_at(1).unwrap(), 0x12345678);
        assert_eq!(cursor.u32_pair_at(1).unwrap(), (0x12345678, 0xDEADBEEF));
        assert!(cursor.u32_at(6).is_err());
    }

    #[test]
    fn test_read_f32() {
        let data = 39.90625f32.to_le_bytes();
        let cursor = ByteCursor::new(&data);
        assert_eq!(cursor.f32_at(1).unwrap(), 39.90625);
    }

    #[test]
    fn test_latin1_string() {
        // "Zürich" in ISO-8859-1
        let data = [6, b'Z', 0xFC, b'r', b'i', b'c', b'h'];
        let cursor = ByteCursor::new(&data);
        assert_eq!(cursor.str_at(1).unwrap(), "Zürich");
    }

    #[test]
    fn test_empty_and_truncated_strings() {
        let cursor = ByteCursor::new(&[0]);
        assert_eq!(cursor.str_at(1).unwrap(), "");

        let cursor = ByteCursor::new(&[5, b'a', b'b']);
        assert!(matches!(cursor.str_at(1), Err(GeoError::CorruptRecord(_))));
    }

    #[test]
    fn test_u128_limb_order() {
        let mut window = Vec::new();
        for limb in [0x4444_4444u32, 0x3333_3333, 0x2222_2222, 0x1111_1111] {
            window.extend_from_slice(&limb.to_le_bytes());
        }
        assert_eq!(
            le_u128_limbs(&window, 0),
            0x1111_1111_2222_2222_3333_3333_4444_4444
        );
        assert_eq!(le_u128_limbs(&window, 0), u128::from_le_bytes(window[..].try_into().unwrap()));
    }

    #[test]
    fn test_overflowing_position() {
        let cursor = ByteCursor::new(&[1, 2, 3, 4]);
        assert!(cursor.slice_at(u64::MAX, 4).is_err());
    }
}
