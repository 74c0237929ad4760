//! File Information Block (FIB) parser.
//!
//! The FIB sits at offset zero of the `WordDocument` stream and locates
//! every other structure. It has a fixed 32-byte base followed by
//! variable-sized regions, each preceded by a count word: `rgW97` (counted
//! in 16-bit values), `rgLw97` (32-bit values), `rgFcLcb` (64-bit
//! offset/size pairs into the table stream) and `rgCswNew`.

use super::session::{DocError, Result};
use crate::common::binary::ByteOrder;
use bitflags::bitflags;
use tracing::warn;

/// Size of the fixed FIB base in bytes
const FIB_BASE_SIZE: usize = 32;
/// Required count of 16-bit values in rgW97
const CSW_EXPECTED: u16 = 14;
/// Required count of 32-bit values in rgLw97
const CSLW_EXPECTED: u16 = 22;

bitflags! {
    /// Flag word at offset 0x0A of the FIB base.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FibFlags: u16 {
        const DOT = 0x0001;
        const GLSY = 0x0002;
        const COMPLEX = 0x0004;
        const HAS_PIC = 0x0008;
        const ENCRYPTED = 0x0100;
        const WHICH_TBL_STM = 0x0200;
        const READ_ONLY_RECOMMENDED = 0x0400;
        const WRITE_RESERVATION = 0x0800;
        const EXT_CHAR = 0x1000;
        const LOAD_OVERRIDE = 0x2000;
        const FAR_EAST = 0x4000;
        const OBFUSCATED = 0x8000;
    }
}

/// Known file versions with their expected region sizes.
///
/// `nFib` values met in the wild fall outside this table; any document
/// passing the signature check is accepted and the on-disk counts are used.
const VERSION_TABLE: [(u16, u16, u16); 5] = [
    (0x00C1, 0x005D, 0x0000),
    (0x00D9, 0x006C, 0x0002),
    (0x0101, 0x0088, 0x0002),
    (0x010C, 0x00A4, 0x0002),
    (0x0112, 0x00B7, 0x0005),
];

/// An (offset, size) pair locating a structure in the table stream.
///
/// A zero `lcb` means the structure is absent and `fc` is undefined.
#[derive(Debug, Clone, Copy, Default)]
pub struct FcLcb {
    pub fc: u32,
    pub lcb: u32,
}

impl FcLcb {
    #[inline]
    pub fn is_present(self) -> bool {
        self.lcb != 0
    }
}

/// Character counts of the sub-documents (from rgLw97).
#[derive(Debug, Clone, Copy, Default)]
pub struct SubDocCounts {
    pub text: u32,
    pub footnotes: u32,
    pub headers: u32,
    pub macros: u32,
    pub annotations: u32,
    pub endnotes: u32,
    pub textboxes: u32,
    pub header_textboxes: u32,
}

// Indices of the FcLcb pairs the decoder consumes.
const IDX_STSHF: usize = 1;
const IDX_PLCF_SED: usize = 6;
const IDX_PLCF_BTE_CHPX: usize = 12;
const IDX_PLCF_BTE_PAPX: usize = 13;
const IDX_CLX: usize = 33;

/// Parsed File Information Block.
#[derive(Debug, Clone)]
pub struct Fib {
    /// File format version
    pub n_fib: u16,
    /// Install language of the producing application
    pub lid: u16,
    pub flags: FibFlags,
    /// Byte count of the main stream text area (cbMac)
    pub cb_mac: u32,
    pub ccp: SubDocCounts,
    fc_lcb: Vec<FcLcb>,
    /// Contents of rgCswNew, when present
    pub csw_new: Vec<u16>,
}

impl Fib {
    /// Parse the FIB from the start of the `WordDocument` stream.
    pub fn parse(stream: &[u8], order: ByteOrder) -> Result<Self> {
        if stream.len() < FIB_BASE_SIZE {
            return Err(DocError::Corrupted(
                "WordDocument stream too short for FIB".to_string(),
            ));
        }

        let w_ident = order.u16(stream, 0)?;
        if w_ident != 0xA5EC {
            return Err(DocError::NotAWordDocument(w_ident));
        }
        let n_fib = order.u16(stream, 2)?;
        let lid = order.u16(stream, 6)?;
        let flags = FibFlags::from_bits_retain(order.u16(stream, 10)?);

        let mut offset = FIB_BASE_SIZE;

        // rgW97, counted in 16-bit values
        let csw = order.u16(stream, offset)?;
        offset += 2;
        if csw != CSW_EXPECTED {
            return Err(DocError::InvalidFormat(format!(
                "FIB csw is {csw}, expected {CSW_EXPECTED}"
            )));
        }
        offset += csw as usize * 2;

        // rgLw97, counted in 32-bit values
        let cslw = order.u16(stream, offset)?;
        offset += 2;
        if cslw != CSLW_EXPECTED {
            return Err(DocError::InvalidFormat(format!(
                "FIB cslw is {cslw}, expected {CSLW_EXPECTED}"
            )));
        }
        let lw_base = offset;
        let rd_lw = |i: usize| order.u32(stream, lw_base + i * 4);
        let cb_mac = rd_lw(0)?;
        let ccp = SubDocCounts {
            text: rd_lw(3)?,
            footnotes: rd_lw(4)?,
            headers: rd_lw(5)?,
            macros: rd_lw(6)?,
            annotations: rd_lw(7)?,
            endnotes: rd_lw(8)?,
            textboxes: rd_lw(9)?,
            header_textboxes: rd_lw(10)?,
        };
        offset += cslw as usize * 4;

        // rgFcLcb, counted in 64-bit pairs
        let cb_rg_fc_lcb = order.u16(stream, offset)?;
        offset += 2;
        match VERSION_TABLE.iter().find(|(v, _, _)| *v == n_fib) {
            Some((_, expected, _)) if *expected != cb_rg_fc_lcb => warn!(
                n_fib = format_args!("0x{n_fib:04X}"),
                cb_rg_fc_lcb, expected, "rgFcLcb count differs from the documented layout"
            ),
            None => warn!(
                n_fib = format_args!("0x{n_fib:04X}"),
                "undocumented nFib; using on-disk region sizes"
            ),
            _ => {}
        }
        let mut fc_lcb = Vec::with_capacity(cb_rg_fc_lcb as usize);
        for _ in 0..cb_rg_fc_lcb {
            let fc = order.u32(stream, offset)?;
            let lcb = order.u32(stream, offset + 4)?;
            fc_lcb.push(FcLcb { fc, lcb });
            offset += 8;
        }

        // rgCswNew, counted in 16-bit values; absent in the oldest layout
        let mut csw_new = Vec::new();
        if let Ok(count) = order.u16(stream, offset) {
            let mut at = offset + 2;
            for _ in 0..count {
                match order.u16(stream, at) {
                    Ok(v) => csw_new.push(v),
                    Err(_) => break,
                }
                at += 2;
            }
        }

        Ok(Fib {
            n_fib,
            lid,
            flags,
            cb_mac,
            ccp,
            fc_lcb,
            csw_new,
        })
    }

    /// Whether the document uses `1Table` (true) or `0Table` (false).
    #[inline]
    pub fn which_table_stream(&self) -> bool {
        self.flags.contains(FibFlags::WHICH_TBL_STM)
    }

    /// Whether the document is encrypted or obfuscated.
    #[inline]
    pub fn is_encrypted(&self) -> bool {
        self.flags.contains(FibFlags::ENCRYPTED)
    }

    fn pair(&self, index: usize) -> FcLcb {
        self.fc_lcb.get(index).copied().unwrap_or_default()
    }

    /// Style sheet location in the table stream.
    #[inline]
    pub fn stshf(&self) -> FcLcb {
        self.pair(IDX_STSHF)
    }

    /// Section table location in the table stream.
    #[inline]
    pub fn plcf_sed(&self) -> FcLcb {
        self.pair(IDX_PLCF_SED)
    }

    /// Character bin table location in the table stream.
    #[inline]
    pub fn plcf_bte_chpx(&self) -> FcLcb {
        self.pair(IDX_PLCF_BTE_CHPX)
    }

    /// Paragraph bin table location in the table stream.
    #[inline]
    pub fn plcf_bte_papx(&self) -> FcLcb {
        self.pair(IDX_PLCF_BTE_PAPX)
    }

    /// Piece table (CLX) location in the table stream.
    #[inline]
    pub fn clx(&self) -> FcLcb {
        self.pair(IDX_CLX)
    }

    /// Terminal character position of the piece table.
    ///
    /// The sum of the sub-document lengths, plus one guard position when
    /// any non-text sub-document is present.
    pub fn last_cp(&self) -> u32 {
        let extra = self.ccp.footnotes
            + self.ccp.headers
            + self.ccp.macros
            + self.ccp.annotations
            + self.ccp.endnotes
            + self.ccp.textboxes
            + self.ccp.header_textboxes;
        if extra != 0 {
            extra + self.ccp.text + 1
        } else {
            self.ccp.text
        }
    }
}
