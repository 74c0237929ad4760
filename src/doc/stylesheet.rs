//! Style sheet (STSH) decoding.
//!
//! The STSH holds indexed style definitions (STDs). A style names a parent
//! through `istdBase` (0x0FFF = no parent) and carries per-class grpprl
//! groups (`grLPUpxSw`) whose shape depends on the style kind. Resolution
//! walks the inheritance chain ancestor-first; cycle protection is the
//! composer's concern ([`super::apply`]).

use super::session::{DocError, Result};
use crate::common::binary::{ByteOrder, utf16_string};
use bytes::Bytes;
use tracing::warn;

/// `istdBase` value meaning "no parent style"
pub const ISTD_NIL: u16 = 0x0FFF;

/// Style kinds (`stk`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    Paragraph,
    Character,
    Table,
    List,
}

impl StyleKind {
    fn from_nibble(value: u8) -> Option<Self> {
        match value {
            1 => Some(StyleKind::Paragraph),
            2 => Some(StyleKind::Character),
            3 => Some(StyleKind::Table),
            4 => Some(StyleKind::List),
            _ => None,
        }
    }
}

/// General stylesheet header (STSHI).
#[derive(Debug, Clone, Default)]
pub struct Stshi {
    /// Count of styles in the sheet
    pub cstd: u16,
    /// Size of the fixed STD header: 0x000A, or 0x0012 with the post-2000
    /// block
    pub cb_std_base: u16,
    /// Default font indices for document-wide formatting
    pub ftc_ascii: u16,
    pub ftc_fe: u16,
    pub ftc_other: u16,
}

/// One parsed style definition.
#[derive(Debug, Clone)]
pub struct StyleDefinition {
    /// Invariant style identifier (0x0FFE for user styles)
    pub sti: u16,
    pub kind: StyleKind,
    /// Parent style, or [`ISTD_NIL`]
    pub istd_base: u16,
    /// Count of formatting groups in grLPUpxSw
    pub cupx: u8,
    /// Style applied to a following new paragraph
    pub istd_next: u16,
    pub name: String,
    /// Paragraph grpprl (istd prefix already stripped)
    pub upx_papx: Option<Bytes>,
    /// Character grpprl
    pub upx_chpx: Option<Bytes>,
    /// Table grpprl
    pub upx_tapx: Option<Bytes>,
    /// List reference payload, kept raw
    pub upx_list: Option<Bytes>,
}

/// The decoded style sheet.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    pub stshi: Stshi,
    styles: Vec<Option<StyleDefinition>>,
}

impl StyleSheet {
    /// Parse the STSH region read from the table stream.
    pub fn parse(data: &[u8], order: ByteOrder) -> Result<Self> {
        let cb_stshi = order.u16(data, 0)? as usize;
        if cb_stshi == 0 || 2 + cb_stshi > data.len() {
            return Err(DocError::Corrupted("STSH header overruns region".into()));
        }
        let stshi_bytes = &data[2..2 + cb_stshi];
        if stshi_bytes.len() < 18 {
            return Err(DocError::Corrupted("STSHI too short".into()));
        }
        let stshi = Stshi {
            cstd: order.u16(stshi_bytes, 0)?,
            cb_std_base: order.u16(stshi_bytes, 2)?,
            ftc_ascii: order.u16(stshi_bytes, 12)?,
            ftc_fe: order.u16(stshi_bytes, 14)?,
            ftc_other: order.u16(stshi_bytes, 16)?,
        };
        if stshi.cb_std_base != 0x000A && stshi.cb_std_base != 0x0012 {
            return Err(DocError::Corrupted(format!(
                "unsupported cbSTDBaseInFile 0x{:04X}",
                stshi.cb_std_base
            )));
        }

        // Walk rglpstd by length prefixes; a zero size is an empty slot.
        let mut styles = Vec::with_capacity(stshi.cstd as usize);
        let mut at = 2 + cb_stshi;
        for istd in 0..stshi.cstd {
            if at + 2 > data.len() {
                break;
            }
            let cb_std = order.u16(data, at)? as usize;
            at += 2;
            if cb_std == 0 {
                styles.push(None);
                continue;
            }
            if at + cb_std > data.len() {
                return Err(DocError::Corrupted(format!(
                    "style {istd} overruns the STSH"
                )));
            }
            let slot = &data[at..at + cb_std];
            // Definitions are stored on even boundaries; the padding byte
            // is not counted by cb_std.
            at += cb_std + (cb_std & 1);

            match parse_std(slot, stshi.cb_std_base as usize, order) {
                Ok(std) => styles.push(Some(std)),
                Err(err) => {
                    warn!(istd, %err, "unparsable style definition; slot ignored");
                    styles.push(None);
                }
            }
        }

        Ok(StyleSheet { stshi, styles })
    }

    /// Number of style slots.
    #[inline]
    pub fn count(&self) -> usize {
        self.styles.len()
    }

    /// Style definition at `istd`, if the slot is occupied.
    pub fn style(&self, istd: u16) -> Option<&StyleDefinition> {
        self.styles.get(istd as usize).and_then(|s| s.as_ref())
    }
}

/// Parse one STD out of its slot bytes.
fn parse_std(slot: &[u8], cb_std_base: usize, order: ByteOrder) -> Result<StyleDefinition> {
    if slot.len() < cb_std_base + 2 {
        return Err(DocError::Corrupted("STD shorter than its header".into()));
    }
    let w0 = order.u16(slot, 0)?;
    let w1 = order.u16(slot, 2)?;
    let w2 = order.u16(slot, 4)?;

    let sti = w0 & 0x0FFF;
    let stk_nibble = (w1 & 0x000F) as u8;
    let istd_base = (w1 & 0xFFF0) >> 4;
    let cupx = (w2 & 0x000F) as u8;
    let istd_next = (w2 & 0xFFF0) >> 4;

    let kind = StyleKind::from_nibble(stk_nibble)
        .ok_or_else(|| DocError::Corrupted(format!("unknown style kind {stk_nibble}")))?;

    // Length-prefixed, null-terminated UTF-16 name directly after the
    // fixed header.
    let name_at = cb_std_base;
    let cch = order.u16(slot, name_at)? as usize;
    let name = utf16_string(slot, name_at + 2, cch, order);
    let mut at = name_at + 2 + cch * 2 + 2;

    let mut upx_papx = None;
    let mut upx_chpx = None;
    let mut upx_tapx = None;
    let mut upx_list = None;

    let mut read_upx = |at: &mut usize| -> Option<Bytes> {
        if *at + 2 > slot.len() {
            return None;
        }
        let cb_upx = order.u16(slot, *at).ok()? as usize;
        *at += 2;
        if *at + cb_upx > slot.len() {
            return None;
        }
        let upx = Bytes::copy_from_slice(&slot[*at..*at + cb_upx]);
        // Padding to even length is not counted by cb_upx.
        *at += cb_upx + (cb_upx & 1);
        Some(upx)
    };

    match kind {
        StyleKind::Paragraph => {
            // UpxPapx: istd of this style, then the paragraph grpprl.
            if let Some(upx) = read_upx(&mut at) {
                upx_papx = Some(if upx.len() >= 2 {
                    upx.slice(2..)
                } else {
                    Bytes::new()
                });
            }
            upx_chpx = read_upx(&mut at);
            // cupx == 3 appends a revision-marking group; preserved but
            // not composed.
            if cupx == 3 {
                let _ = read_upx(&mut at);
            }
        }
        StyleKind::Character => {
            upx_chpx = read_upx(&mut at);
            if cupx == 2 {
                let _ = read_upx(&mut at);
            }
        }
        StyleKind::Table => {
            upx_tapx = read_upx(&mut at);
            if let Some(upx) = read_upx(&mut at) {
                upx_papx = Some(if upx.len() >= 2 {
                    upx.slice(2..)
                } else {
                    Bytes::new()
                });
            }
            upx_chpx = read_upx(&mut at);
        }
        StyleKind::List => {
            upx_list = read_upx(&mut at);
        }
    }

    Ok(StyleDefinition {
        sti,
        kind,
        istd_base,
        cupx,
        istd_next,
        name,
        upx_papx,
        upx_chpx,
        upx_tapx,
        upx_list,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Serialise one STD slot (header size 0x000A).
    pub(crate) fn std_bytes(
        sti: u16,
        stk: u8,
        istd_base: u16,
        name: &str,
        papx: &[u8],
        chpx: &[u8],
    ) -> Vec<u8> {
        let cupx: u16 = if stk == 1 { 2 } else { 1 };
        let mut slot = Vec::new();
        slot.extend_from_slice(&(sti & 0x0FFF).to_le_bytes());
        slot.extend_from_slice(&(((istd_base) << 4) | stk as u16).to_le_bytes());
        slot.extend_from_slice(&((0u16 << 4) | cupx).to_le_bytes());
        slot.extend_from_slice(&0u16.to_le_bytes()); // bchUpe
        slot.extend_from_slice(&0u16.to_le_bytes()); // grfstd
        // Xstz name
        let units: Vec<u16> = name.encode_utf16().collect();
        slot.extend_from_slice(&(units.len() as u16).to_le_bytes());
        for u in &units {
            slot.extend_from_slice(&u.to_le_bytes());
        }
        slot.extend_from_slice(&0u16.to_le_bytes());
        if stk == 1 {
            // UpxPapx: istd prefix + grpprl
            let cb = (2 + papx.len()) as u16;
            slot.extend_from_slice(&cb.to_le_bytes());
            slot.extend_from_slice(&sti.to_le_bytes());
            slot.extend_from_slice(papx);
            if cb & 1 == 1 {
                slot.push(0);
            }
        }
        let cb = chpx.len() as u16;
        slot.extend_from_slice(&cb.to_le_bytes());
        slot.extend_from_slice(chpx);
        if cb & 1 == 1 {
            slot.push(0);
        }
        slot
    }

    /// Serialise a whole STSH with the given slots.
    pub(crate) fn stsh_bytes(slots: &[Option<Vec<u8>>]) -> Vec<u8> {
        let mut stshi = vec![0u8; 18];
        stshi[0..2].copy_from_slice(&(slots.len() as u16).to_le_bytes());
        stshi[2..4].copy_from_slice(&0x000Au16.to_le_bytes());

        let mut data = Vec::new();
        data.extend_from_slice(&(stshi.len() as u16).to_le_bytes());
        data.extend_from_slice(&stshi);
        for slot in slots {
            match slot {
                None => data.extend_from_slice(&0u16.to_le_bytes()),
                Some(bytes) => {
                    data.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
                    data.extend_from_slice(bytes);
                    if bytes.len() & 1 == 1 {
                        data.push(0);
                    }
                }
            }
        }
        data
    }

    #[test]
    fn test_empty_slots() {
        let data = stsh_bytes(&[None, None, None]);
        let sheet = StyleSheet::parse(&data, ByteOrder::Little).unwrap();
        assert_eq!(sheet.count(), 3);
        assert!(sheet.style(0).is_none());
        assert!(sheet.style(2).is_none());
        assert!(sheet.style(9).is_none());
    }

    #[test]
    fn test_paragraph_style() {
        // sprmCFBold with operand 1 inside the style's character upx
        let chpx = [0x35, 0x08, 0x01];
        let papx = [0x03, 0x24, 0x01]; // sprmPJc80 = center
        let data = stsh_bytes(&[Some(std_bytes(10, 1, ISTD_NIL, "Normal", &papx, &chpx))]);
        let sheet = StyleSheet::parse(&data, ByteOrder::Little).unwrap();
        let style = sheet.style(0).unwrap();
        assert_eq!(style.kind, StyleKind::Paragraph);
        assert_eq!(style.istd_base, ISTD_NIL);
        assert_eq!(style.name, "Normal");
        assert_eq!(style.upx_papx.as_deref(), Some(&papx[..]));
        assert_eq!(style.upx_chpx.as_deref(), Some(&chpx[..]));
        assert!(style.upx_tapx.is_none());
    }

    #[test]
    fn test_character_style_inheritance_fields() {
        let chpx = [0x36, 0x08, 0x01];
        let data = stsh_bytes(&[
            Some(std_bytes(1, 2, ISTD_NIL, "Base", &[], &chpx)),
            Some(std_bytes(2, 2, 0, "Derived", &[], &chpx)),
        ]);
        let sheet = StyleSheet::parse(&data, ByteOrder::Little).unwrap();
        assert_eq!(sheet.style(1).unwrap().istd_base, 0);
        assert_eq!(sheet.style(0).unwrap().istd_base, ISTD_NIL);
        assert_eq!(sheet.style(1).unwrap().kind, StyleKind::Character);
    }

    #[test]
    fn test_unknown_stk_becomes_empty_slot() {
        let mut bad = std_bytes(1, 2, ISTD_NIL, "X", &[], &[]);
        bad[2] = 0x07; // stk nibble = 7
        let data = stsh_bytes(&[Some(bad)]);
        let sheet = StyleSheet::parse(&data, ByteOrder::Little).unwrap();
        assert!(sheet.style(0).is_none());
    }

    #[test]
    fn test_bad_cb_std_base() {
        let mut data = stsh_bytes(&[None]);
        data[4] = 0x0B; // cbSTDBaseInFile = 0x000B
        assert!(StyleSheet::parse(&data, ByteOrder::Little).is_err());
    }
}
