//! Piece table (CLX / PlcPcd) decoding.
//!
//! The document text is not a linear buffer: a piece table maps ranges of
//! character positions to byte ranges of the `WordDocument` stream, each
//! range independently stored as 8-bit compressed text or UTF-16LE. The
//! CLX structure wraps the piece table behind an optional prefix of
//! ignored property groups (Prc).

use super::session::{DocError, Result};
use crate::common::binary::ByteOrder;

/// Largest valid Prc grpprl size
const PRC_MAX_SIZE: i16 = 0x3FA2;

/// A piece descriptor.
#[derive(Debug, Clone, Copy)]
pub struct Pcd {
    /// The piece must not contain a paragraph mark
    pub no_para_last: bool,
    /// Dirty flag; must be zero in well-formed files
    pub dirty: bool,
    /// Packed stream offset and compression flag
    pub fc_raw: u32,
    /// Property modifier applied on top of direct formatting
    pub prm: u16,
}

impl Pcd {
    /// Whether the piece stores 8-bit compressed text.
    #[inline]
    pub fn is_compressed(self) -> bool {
        self.fc_raw & 0x4000_0000 != 0
    }

    /// Raw 30-bit offset field.
    ///
    /// For compressed pieces the effective byte offset is half this value.
    #[inline]
    pub fn fc(self) -> u32 {
        self.fc_raw & 0x3FFF_FFFF
    }

    /// Effective byte offset of the piece's first character.
    #[inline]
    pub fn start_offset(self) -> u32 {
        if self.is_compressed() {
            self.fc() / 2
        } else {
            self.fc()
        }
    }

    /// Bytes each character of this piece occupies.
    #[inline]
    pub fn bytes_per_char(self) -> u32 {
        if self.is_compressed() { 1 } else { 2 }
    }
}

/// The decoded piece table: parallel arrays `cps[0..=n]` and `pcds[0..n]`.
#[derive(Debug, Clone)]
pub struct PieceTable {
    cps: Vec<u32>,
    pcds: Vec<Pcd>,
}

impl PieceTable {
    /// Parse the CLX read from the table stream.
    ///
    /// `expected_last_cp` is the terminal character position derived from
    /// the FIB sub-document counts; reading CPs stops when it is matched.
    pub fn parse(clx: &[u8], expected_last_cp: u32, order: ByteOrder) -> Result<Self> {
        let mut offset = 0usize;

        // Zero or more Prc entries (ignored formatting) precede the Pcdt.
        while offset < clx.len() && clx[offset] == 0x01 {
            offset += 1;
            let cb = order.i16(clx, offset)?;
            offset += 2;
            if !(0..=PRC_MAX_SIZE).contains(&cb) {
                return Err(DocError::Corrupted(format!(
                    "Prc grpprl size {cb} out of range"
                )));
            }
            offset += cb as usize;
        }

        if offset >= clx.len() || clx[offset] != 0x02 {
            return Err(DocError::Corrupted(
                "CLX does not contain a Pcdt".to_string(),
            ));
        }
        offset += 1;

        let lcb = order.u32(clx, offset)? as usize;
        offset += 4;
        if offset + lcb > clx.len() {
            return Err(DocError::Corrupted(format!(
                "PlcPcd size {lcb} overruns the CLX"
            )));
        }
        let plc = &clx[offset..offset + lcb];

        // CPs are read until the terminal CP is matched; the Pcd count
        // follows from the remaining bytes.
        let mut cps = Vec::new();
        let mut at = 0usize;
        loop {
            let cp = order.u32(plc, at)?;
            at += 4;
            cps.push(cp);
            if cp == expected_last_cp {
                break;
            }
            if at >= lcb {
                return Err(DocError::Corrupted(format!(
                    "piece table CPs do not terminate at {expected_last_cp}"
                )));
            }
        }
        let n = cps.len() - 1;
        if lcb != cps.len() * 4 + n * 8 {
            return Err(DocError::Corrupted(format!(
                "PlcPcd size {lcb} does not hold {n} pieces"
            )));
        }
        for window in cps.windows(2) {
            if window[0] >= window[1] {
                return Err(DocError::Corrupted(
                    "piece table CPs are not strictly ascending".to_string(),
                ));
            }
        }

        let mut pcds = Vec::with_capacity(n);
        for i in 0..n {
            let base = at + i * 8;
            let flags = order.u16(plc, base)?;
            let fc_raw = order.u32(plc, base + 2)?;
            let prm = order.u16(plc, base + 6)?;
            pcds.push(Pcd {
                no_para_last: flags & 0x0001 != 0,
                dirty: flags & 0x0004 != 0,
                fc_raw,
                prm,
            });
        }

        Ok(PieceTable { cps, pcds })
    }

    /// Number of pieces.
    #[inline]
    pub fn count(&self) -> usize {
        self.pcds.len()
    }

    /// Terminal character position.
    #[inline]
    pub fn last_cp(&self) -> u32 {
        *self.cps.last().unwrap_or(&0)
    }

    /// Starting CP of piece `i`; index `count()` is the terminal CP.
    #[inline]
    pub fn cp(&self, i: usize) -> u32 {
        self.cps[i]
    }

    /// Piece descriptor `i`.
    #[inline]
    pub fn pcd(&self, i: usize) -> &Pcd {
        &self.pcds[i]
    }

    /// The largest `i` with `cps[i] <= cp`, or `None` when `cp` lies at or
    /// beyond the terminal position.
    pub fn piece_index(&self, cp: u32) -> Option<usize> {
        if cp >= self.last_cp() {
            return None;
        }
        match self.cps.binary_search(&cp) {
            Ok(i) => Some(i),
            Err(0) => None,
            Err(i) => Some(i - 1),
        }
    }

    /// Effective byte offset of `cp` inside piece `i`.
    pub fn offset_of(&self, i: usize, cp: u32) -> u32 {
        let pcd = &self.pcds[i];
        pcd.start_offset() + (cp - self.cps[i]) * pcd.bytes_per_char()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plc_bytes(cps: &[u32], pcds: &[(u16, u32, u16)]) -> Vec<u8> {
        let mut plc = Vec::new();
        for cp in cps {
            plc.extend_from_slice(&cp.to_le_bytes());
        }
        for (flags, fc, prm) in pcds {
            plc.extend_from_slice(&flags.to_le_bytes());
            plc.extend_from_slice(&fc.to_le_bytes());
            plc.extend_from_slice(&prm.to_le_bytes());
        }
        plc
    }

    fn clx_bytes(plc: &[u8]) -> Vec<u8> {
        let mut clx = vec![0x02];
        clx.extend_from_slice(&(plc.len() as u32).to_le_bytes());
        clx.extend_from_slice(plc);
        clx
    }

    #[test]
    fn test_single_piece() {
        let plc = plc_bytes(&[0, 5], &[(0, 0x4000_0200, 0)]);
        let table = PieceTable::parse(&clx_bytes(&plc), 5, ByteOrder::Little).unwrap();
        assert_eq!(table.count(), 1);
        assert_eq!(table.last_cp(), 5);
        let pcd = table.pcd(0);
        assert!(pcd.is_compressed());
        assert_eq!(pcd.fc(), 0x200);
        assert_eq!(pcd.start_offset(), 0x100);
        assert_eq!(table.offset_of(0, 3), 0x103);
    }

    #[test]
    fn test_uncompressed_offsets() {
        let plc = plc_bytes(&[0, 2], &[(0, 0x0000_0200, 0)]);
        let table = PieceTable::parse(&clx_bytes(&plc), 2, ByteOrder::Little).unwrap();
        let pcd = table.pcd(0);
        assert!(!pcd.is_compressed());
        assert_eq!(pcd.start_offset(), 0x200);
        assert_eq!(table.offset_of(0, 1), 0x202);
    }

    #[test]
    fn test_piece_lookup() {
        let plc = plc_bytes(
            &[0, 10, 25],
            &[(0, 0x4000_0000, 0), (0, 0x4000_0100, 0)],
        );
        let table = PieceTable::parse(&clx_bytes(&plc), 25, ByteOrder::Little).unwrap();
        assert_eq!(table.piece_index(0), Some(0));
        assert_eq!(table.piece_index(9), Some(0));
        assert_eq!(table.piece_index(10), Some(1));
        assert_eq!(table.piece_index(24), Some(1));
        assert_eq!(table.piece_index(25), None);
        assert_eq!(table.piece_index(100), None);
    }

    #[test]
    fn test_prc_prefix_is_skipped() {
        let plc = plc_bytes(&[0, 5], &[(0, 0x4000_0200, 0)]);
        let mut clx = vec![0x01];
        clx.extend_from_slice(&3i16.to_le_bytes());
        clx.extend_from_slice(&[0xAA, 0xBB, 0xCC]);
        clx.extend_from_slice(&clx_bytes(&plc));
        let table = PieceTable::parse(&clx, 5, ByteOrder::Little).unwrap();
        assert_eq!(table.count(), 1);
    }

    #[test]
    fn test_oversized_prc_rejected() {
        let mut clx = vec![0x01];
        clx.extend_from_slice(&0x4000i16.to_le_bytes());
        clx.extend_from_slice(&[0u8; 8]);
        assert!(PieceTable::parse(&clx, 5, ByteOrder::Little).is_err());
    }

    #[test]
    fn test_missing_pcdt() {
        assert!(PieceTable::parse(&[0x07, 0, 0], 5, ByteOrder::Little).is_err());
    }

    #[test]
    fn test_nonterminating_cps() {
        let plc = plc_bytes(&[0, 5], &[(0, 0, 0)]);
        // terminal CP 9 is never reached
        assert!(PieceTable::parse(&clx_bytes(&plc), 9, ByteOrder::Little).is_err());
    }

    #[test]
    fn test_flags_decoded() {
        let plc = plc_bytes(&[0, 1], &[(0x0005, 0x4000_0000, 0xBEEF)]);
        let table = PieceTable::parse(&clx_bytes(&plc), 1, ByteOrder::Little).unwrap();
        let pcd = table.pcd(0);
        assert!(pcd.no_para_last);
        assert!(pcd.dirty);
        assert_eq!(pcd.prm, 0xBEEF);
    }
}
