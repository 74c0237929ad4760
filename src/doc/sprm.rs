//! Sprm (Single Property Modifier) and Prl parsing.
//!
//! Formatting in the binary document format is expressed as runs of Prl
//! records: a packed 16-bit Sprm control word followed by an operand whose
//! width is a function of the Sprm's size code. A contiguous run of Prls
//! is called a grpprl.

use crate::common::binary::ByteOrder;
use smallvec::SmallVec;
use tracing::warn;

use super::sprm_ids::{SGC_PARAGRAPH, SGC_TABLE, SPRM_P_CHG_TABS, SPRM_T_DEF_TABLE};

/// Packed Sprm control word.
///
/// Layout, least significant bit first:
/// `ispmd` (9 bits) | `fSpec` (1 bit) | `sgc` (3 bits) | `spra` (3 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprm(pub u16);

impl Sprm {
    /// Operation identifier within the property class.
    #[inline]
    pub fn ispmd(self) -> u16 {
        self.0 & 0x01FF
    }

    /// Special-semantics flag.
    #[inline]
    pub fn f_spec(self) -> bool {
        self.0 & 0x0200 != 0
    }

    /// Property class (paragraph, character, picture, section, table).
    #[inline]
    pub fn sgc(self) -> u8 {
        ((self.0 >> 10) & 0x7) as u8
    }

    /// Operand size code.
    #[inline]
    pub fn spra(self) -> u8 {
        (self.0 >> 13) as u8
    }
}

/// A Sprm with its operand bytes.
///
/// For the variable-width size code the operand includes its leading length
/// field, so re-serialising `sprm` and `operand` always reproduces the
/// original byte run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prl {
    pub sprm: Sprm,
    pub operand: SmallVec<[u8; 8]>,
}

impl Prl {
    /// Operand as a single byte (toggle and 1-byte operands).
    #[inline]
    pub fn operand_byte(&self) -> Option<u8> {
        self.operand.first().copied()
    }

    /// Operand as an unsigned 16-bit value.
    #[inline]
    pub fn operand_u16(&self, order: ByteOrder) -> Option<u16> {
        order.u16(&self.operand, 0).ok()
    }

    /// Operand as a signed 16-bit value.
    #[inline]
    pub fn operand_i16(&self, order: ByteOrder) -> Option<i16> {
        order.i16(&self.operand, 0).ok()
    }

    /// Operand as an unsigned 32-bit value.
    #[inline]
    pub fn operand_u32(&self, order: ByteOrder) -> Option<u32> {
        order.u32(&self.operand, 0).ok()
    }

    /// Serialised size in bytes, control word included.
    #[inline]
    pub fn byte_len(&self) -> usize {
        2 + self.operand.len()
    }

    /// Re-serialise this record to its on-disk form.
    pub fn to_bytes(&self, order: ByteOrder) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        match order {
            ByteOrder::Little => out.extend_from_slice(&self.sprm.0.to_le_bytes()),
            ByteOrder::Big => out.extend_from_slice(&self.sprm.0.to_be_bytes()),
        }
        out.extend_from_slice(&self.operand);
        out
    }
}

/// Operand width for a Sprm, or `None` when the width cannot be determined
/// and the enclosing grpprl must be abandoned.
///
/// `rest` is the byte run immediately after the control word. The returned
/// width counts every operand byte including any embedded length field.
fn operand_width(sprm: Sprm, rest: &[u8], order: ByteOrder) -> Option<usize> {
    match sprm.spra() {
        0 | 1 => Some(1),
        2 | 4 | 5 => Some(2),
        7 => Some(3),
        3 => Some(4),
        6 => {
            if sprm.sgc() == SGC_TABLE && sprm.ispmd() == SPRM_T_DEF_TABLE {
                // The length field is 16 bits and does not count itself.
                let cb = order.u16(rest, 0).ok()?;
                return Some(cb as usize + 1);
            }
            if sprm.sgc() == SGC_PARAGRAPH && sprm.ispmd() == SPRM_P_CHG_TABS {
                let cb = *rest.first()? as usize;
                return match cb {
                    0 | 1 => None,
                    255 => {
                        // PChgTabsOperand carries its own internal layout;
                        // its total width is not recoverable here.
                        warn!("sprmPChgTabs with cb=255; abandoning grpprl");
                        None
                    }
                    n => Some(n),
                };
            }
            let cb = *rest.first()? as usize;
            if cb == 0 { None } else { Some(cb) }
        }
        _ => None,
    }
}

/// Lazy Prl iterator over a grpprl byte run.
///
/// Iteration stops at the end of the buffer, or early when an operand width
/// cannot be determined; the records yielded so far remain valid.
pub struct GrpprlIter<'a> {
    data: &'a [u8],
    offset: usize,
    order: ByteOrder,
    poisoned: bool,
}

impl<'a> GrpprlIter<'a> {
    pub fn new(data: &'a [u8], order: ByteOrder) -> Self {
        Self {
            data,
            offset: 0,
            order,
            poisoned: false,
        }
    }
}

impl Iterator for GrpprlIter<'_> {
    type Item = Prl;

    fn next(&mut self) -> Option<Prl> {
        if self.poisoned || self.offset + 2 > self.data.len() {
            return None;
        }
        let sprm = Sprm(self.order.u16(self.data, self.offset).ok()?);
        let rest = &self.data[self.offset + 2..];
        let Some(width) = operand_width(sprm, rest, self.order) else {
            warn!(
                sprm = format_args!("0x{:04X}", sprm.0),
                "undeterminable Sprm operand width; abandoning grpprl"
            );
            self.poisoned = true;
            return None;
        };
        if width > rest.len() {
            warn!(
                sprm = format_args!("0x{:04X}", sprm.0),
                "Sprm operand overruns grpprl; abandoning"
            );
            self.poisoned = true;
            return None;
        }
        self.offset += 2 + width;
        Some(Prl {
            sprm,
            operand: SmallVec::from_slice(&rest[..width]),
        })
    }
}

/// Parse an entire grpprl into a vector of Prl records.
pub fn parse_grpprl(data: &[u8], order: ByteOrder) -> Vec<Prl> {
    GrpprlIter::new(data, order).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprm_fields() {
        // sprmCFBold = 0x0835: ispmd 0x35, sgc 2 (character), spra 0
        let sprm = Sprm(0x0835);
        assert_eq!(sprm.ispmd(), 0x35);
        assert!(!sprm.f_spec());
        assert_eq!(sprm.sgc(), 2);
        assert_eq!(sprm.spra(), 0);

        // sprmPDyaBefore = 0xA413: spra 5 (two-byte operand)
        let sprm = Sprm(0xA413);
        assert_eq!(sprm.sgc(), 1);
        assert_eq!(sprm.spra(), 5);
    }

    #[test]
    fn test_fixed_width_operands() {
        // bold toggle (1 byte) followed by font size (2 bytes)
        let grpprl = [0x35, 0x08, 0x01, 0x43, 0x4A, 0x18, 0x00];
        let prls = parse_grpprl(&grpprl, ByteOrder::Little);
        assert_eq!(prls.len(), 2);
        assert_eq!(prls[0].sprm.0, 0x0835);
        assert_eq!(prls[0].operand_byte(), Some(1));
        assert_eq!(prls[1].sprm.0, 0x4A43);
        assert_eq!(prls[1].operand_u16(ByteOrder::Little), Some(24));
    }

    #[test]
    fn test_variable_operand_counts_itself() {
        // spra 6, cb = 3: the length byte plus two payload bytes
        let grpprl = [0x08, 0xC6, 0x03, 0xAA, 0xBB];
        let prls = parse_grpprl(&grpprl, ByteOrder::Little);
        assert_eq!(prls.len(), 1);
        assert_eq!(prls[0].operand.as_slice(), &[0x03, 0xAA, 0xBB]);
    }

    #[test]
    fn test_tdeftable_width() {
        // sprmTDefTable = 0xD608: u16 length that excludes itself by one
        let grpprl = [0x08, 0xD6, 0x04, 0x00, 0x01, 0x02, 0x03];
        let prls = parse_grpprl(&grpprl, ByteOrder::Little);
        assert_eq!(prls.len(), 1);
        assert_eq!(prls[0].operand.len(), 5);
    }

    #[test]
    fn test_pchgtabs_invalid_cb_terminates() {
        // sprmPChgTabs = 0xC615 with cb = 1 is invalid
        let grpprl = [0x15, 0xC6, 0x01, 0x00, 0x35, 0x08, 0x01];
        let prls = parse_grpprl(&grpprl, ByteOrder::Little);
        assert!(prls.is_empty());
    }

    #[test]
    fn test_pchgtabs_255_terminates() {
        let grpprl = [0x15, 0xC6, 0xFF, 0x00, 0x00];
        let prls = parse_grpprl(&grpprl, ByteOrder::Little);
        assert!(prls.is_empty());
    }

    #[test]
    fn test_truncated_operand_terminates() {
        let grpprl = [0x43, 0x4A, 0x18]; // two-byte operand, one byte present
        let prls = parse_grpprl(&grpprl, ByteOrder::Little);
        assert!(prls.is_empty());
    }

    #[test]
    fn test_roundtrip() {
        let grpprl = [
            0x35, 0x08, 0x81, // toggle
            0x43, 0x4A, 0x18, 0x00, // u16
            0x03, 0x6A, 0x40, 0x00, 0x00, 0x00, // u32 (pic location)
        ];
        let prls = parse_grpprl(&grpprl, ByteOrder::Little);
        let bytes: Vec<u8> = prls
            .iter()
            .flat_map(|p| p.to_bytes(ByteOrder::Little))
            .collect();
        assert_eq!(bytes, grpprl);
    }
}
