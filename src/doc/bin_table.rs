//! Property bin tables (PlcBtePapx / PlcBteChpx).
//!
//! Where most Plc structures map character positions to data, the bin
//! tables map `WordDocument` stream offsets to the 512-byte FKP pages
//! holding the property records for the text at those offsets.

use super::session::{DocError, Result};
use crate::common::binary::ByteOrder;

/// A decoded bin table: `a_fc[0..=n]` ascending stream offsets and
/// `a_pn[0..n]` page numbers.
#[derive(Debug, Clone)]
pub struct BinTable {
    a_fc: Vec<u32>,
    a_pn: Vec<u32>,
}

impl BinTable {
    /// Parse a PlcBte region read from the table stream.
    pub fn parse(data: &[u8], order: ByteOrder) -> Result<Self> {
        // n offsets (4 bytes each) plus n-1 page numbers: size mod 8 is 4
        if data.len() < 12 || data.len() % 8 != 4 {
            return Err(DocError::Corrupted(format!(
                "bin table size {} is not a valid Plc",
                data.len()
            )));
        }
        let n_fc = (data.len() / 4 - 1) / 2 + 1;
        let n_pn = n_fc - 1;

        let mut a_fc = Vec::with_capacity(n_fc);
        for i in 0..n_fc {
            a_fc.push(order.u32(data, i * 4)?);
        }
        for window in a_fc.windows(2) {
            if window[0] >= window[1] {
                return Err(DocError::Corrupted(
                    "bin table offsets are not strictly ascending".to_string(),
                ));
            }
        }

        let mut a_pn = Vec::with_capacity(n_pn);
        for i in 0..n_pn {
            // Only the low 22 bits carry the page number.
            a_pn.push(order.u32(data, (n_fc + i) * 4)? & 0x003F_FFFF);
        }

        Ok(BinTable { a_fc, a_pn })
    }

    /// Number of pages referenced.
    #[inline]
    pub fn count(&self) -> usize {
        self.a_pn.len()
    }

    /// One past the last stream offset covered by the table.
    #[inline]
    pub fn fc_last(&self) -> u32 {
        *self.a_fc.last().unwrap_or(&0)
    }

    /// Stream offset at index `j`.
    #[inline]
    pub fn fc(&self, j: usize) -> u32 {
        self.a_fc[j]
    }

    /// The largest `j` with `a_fc[j] <= fc` and its page number, or `None`
    /// when `fc` precedes the table or lies at/beyond its end.
    pub fn lookup(&self, fc: u32) -> Option<(usize, u32)> {
        if fc >= self.fc_last() {
            return None;
        }
        let j = match self.a_fc.binary_search(&fc) {
            Ok(j) => j,
            Err(0) => return None,
            Err(j) => j - 1,
        };
        Some((j, self.a_pn[j]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_bytes(fcs: &[u32], pns: &[u32]) -> Vec<u8> {
        let mut data = Vec::new();
        for fc in fcs {
            data.extend_from_slice(&fc.to_le_bytes());
        }
        for pn in pns {
            data.extend_from_slice(&pn.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_parse_and_lookup() {
        let data = table_bytes(&[0x400, 0x800, 0xC00], &[4, 5]);
        let table = BinTable::parse(&data, ByteOrder::Little).unwrap();
        assert_eq!(table.count(), 2);
        assert_eq!(table.fc_last(), 0xC00);
        assert_eq!(table.lookup(0x400), Some((0, 4)));
        assert_eq!(table.lookup(0x7FF), Some((0, 4)));
        assert_eq!(table.lookup(0x800), Some((1, 5)));
        assert_eq!(table.lookup(0xBFF), Some((1, 5)));
        assert_eq!(table.lookup(0xC00), None);
        assert_eq!(table.lookup(0x3FF), None);
    }

    #[test]
    fn test_pn_masks_high_bits() {
        let data = table_bytes(&[0, 100], &[0xFFC0_0007]);
        let table = BinTable::parse(&data, ByteOrder::Little).unwrap();
        assert_eq!(table.lookup(0), Some((0, 7)));
    }

    #[test]
    fn test_non_ascending_rejected() {
        let data = table_bytes(&[100, 100, 200], &[1, 2]);
        assert!(BinTable::parse(&data, ByteOrder::Little).is_err());
    }

    #[test]
    fn test_bad_size_rejected() {
        assert!(BinTable::parse(&[0u8; 7], ByteOrder::Little).is_err());
        assert!(BinTable::parse(&[0u8; 8], ByteOrder::Little).is_err());
    }
}
