//! Binary data parsing utilities shared by the container and document layers.
//!
//! Every multi-byte read in the crate goes through a [`ByteOrder`] so that a
//! document written on a foreign-endian host is byte-swapped transparently.
//! The order is detected once from the compound container header and never
//! changes for the lifetime of a session.

use zerocopy::{BE, FromBytes, I16, I32, LE, U16, U32};

/// Binary parsing error type
#[derive(Debug, Clone, thiserror::Error)]
pub enum BinaryError {
    /// Not enough data to read the requested type
    #[error("insufficient data: expected {expected} bytes, got {available}")]
    InsufficientData { expected: usize, available: usize },
}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

/// Byte order of the multi-byte integers in a compound file.
///
/// On-disk data is little-endian; a byte-swapped container (written on a
/// big-endian host without conversion) is detected from the header BOM and
/// read through the `Big` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    /// Read a `u16` at `offset`.
    #[inline]
    pub fn u16(self, data: &[u8], offset: usize) -> BinaryResult<u16> {
        let bytes = take(data, offset, 2)?;
        Ok(match self {
            ByteOrder::Little => U16::<LE>::read_from_bytes(bytes).ok().map(|v| v.get()),
            ByteOrder::Big => U16::<BE>::read_from_bytes(bytes).ok().map(|v| v.get()),
        }
        .unwrap_or(0))
    }

    /// Read an `i16` at `offset`.
    #[inline]
    pub fn i16(self, data: &[u8], offset: usize) -> BinaryResult<i16> {
        let bytes = take(data, offset, 2)?;
        Ok(match self {
            ByteOrder::Little => I16::<LE>::read_from_bytes(bytes).ok().map(|v| v.get()),
            ByteOrder::Big => I16::<BE>::read_from_bytes(bytes).ok().map(|v| v.get()),
        }
        .unwrap_or(0))
    }

    /// Read a `u32` at `offset`.
    #[inline]
    pub fn u32(self, data: &[u8], offset: usize) -> BinaryResult<u32> {
        let bytes = take(data, offset, 4)?;
        Ok(match self {
            ByteOrder::Little => U32::<LE>::read_from_bytes(bytes).ok().map(|v| v.get()),
            ByteOrder::Big => U32::<BE>::read_from_bytes(bytes).ok().map(|v| v.get()),
        }
        .unwrap_or(0))
    }

    /// Read an `i32` at `offset`.
    #[inline]
    pub fn i32(self, data: &[u8], offset: usize) -> BinaryResult<i32> {
        let bytes = take(data, offset, 4)?;
        Ok(match self {
            ByteOrder::Little => I32::<LE>::read_from_bytes(bytes).ok().map(|v| v.get()),
            ByteOrder::Big => I32::<BE>::read_from_bytes(bytes).ok().map(|v| v.get()),
        }
        .unwrap_or(0))
    }

    /// Read a `u64` at `offset`.
    #[inline]
    pub fn u64(self, data: &[u8], offset: usize) -> BinaryResult<u64> {
        let lo = self.u32(data, offset)?;
        let hi = self.u32(data, offset + 4)?;
        Ok(match self {
            ByteOrder::Little => ((hi as u64) << 32) | lo as u64,
            ByteOrder::Big => ((lo as u64) << 32) | hi as u64,
        })
    }
}

#[inline]
fn take(data: &[u8], offset: usize, len: usize) -> BinaryResult<&[u8]> {
    if offset + len > data.len() {
        return Err(BinaryError::InsufficientData {
            expected: offset + len,
            available: data.len(),
        });
    }
    Ok(&data[offset..offset + len])
}

/// Read a little-endian u16 from a byte slice at the given offset.
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> BinaryResult<u16> {
    ByteOrder::Little.u16(data, offset)
}

/// Read a little-endian u32 from a byte slice at the given offset.
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    ByteOrder::Little.u32(data, offset)
}

/// Decode a length-bounded UTF-16 string (`char_count` code units at
/// `offset`), replacing unpaired surrogates.
pub fn utf16_string(data: &[u8], offset: usize, char_count: usize, order: ByteOrder) -> String {
    let mut units = Vec::with_capacity(char_count);
    for i in 0..char_count {
        match order.u16(data, offset + i * 2) {
            Ok(u) => units.push(u),
            Err(_) => break,
        }
    }
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_reads() {
        let data = [0x34, 0x12, 0x78, 0x56];
        assert_eq!(ByteOrder::Little.u16(&data, 0).unwrap(), 0x1234);
        assert_eq!(ByteOrder::Little.u16(&data, 2).unwrap(), 0x5678);
        assert_eq!(ByteOrder::Little.u32(&data, 0).unwrap(), 0x56781234);
        assert!(ByteOrder::Little.u16(&data, 3).is_err());
    }

    #[test]
    fn test_big_endian_reads() {
        let data = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(ByteOrder::Big.u16(&data, 0).unwrap(), 0x1234);
        assert_eq!(ByteOrder::Big.u32(&data, 0).unwrap(), 0x12345678);
    }

    #[test]
    fn test_signed_reads() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(ByteOrder::Little.i16(&data, 0).unwrap(), -1);
        assert_eq!(ByteOrder::Little.i32(&data, 0).unwrap(), -1);
    }

    #[test]
    fn test_u64_read() {
        let data = [0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00];
        assert_eq!(
            ByteOrder::Little.u64(&data, 0).unwrap(),
            0x0000_0002_0000_0001
        );
    }

    #[test]
    fn test_utf16_string() {
        let data = [0x48, 0x00, 0x69, 0x00];
        assert_eq!(utf16_string(&data, 0, 2, ByteOrder::Little), "Hi");
        let swapped = [0x00, 0x48, 0x00, 0x69];
        assert_eq!(utf16_string(&swapped, 0, 2, ByteOrder::Big), "Hi");
    }
}
