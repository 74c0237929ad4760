//! Property application pipeline.
//!
//! A Prl is dispatched on its property class into the matching structure
//! of the [`PropertyState`]. Style resolution is a left-fold: ancestors
//! first, then the style's own grpprls, then direct formatting, then the
//! piece's property modifier. Character Prls target either the current
//! run or the paragraph-level character defaults.

use super::properties::{
    Justification, MAX_CELLS, PropertyState, Rgb, SectionBreak, Underline, VerticalPosition,
    ico_color, resolve_toggle,
};
use super::sprm::{Prl, Sprm, parse_grpprl};
use super::sprm_ids::*;
use super::stylesheet::{ISTD_NIL, StyleKind, StyleSheet};
use crate::common::binary::ByteOrder;
use fixedbitset::FixedBitSet;
use tracing::{debug, warn};

/// Which character structure a character-class Prl modifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChpLevel {
    /// The current run
    Run,
    /// The paragraph-level character defaults
    ParagraphDefault,
}

/// Context shared by every application call.
pub struct Composer<'a> {
    pub styles: &'a StyleSheet,
    pub order: ByteOrder,
}

impl Composer<'_> {
    /// Apply a single Prl coming from direct formatting.
    pub fn apply_direct(&self, state: &mut PropertyState, level: ChpLevel, prl: &Prl) {
        self.apply_prl(state, level, prl, true);
    }

    /// Resolve a style and fold its properties into the state.
    ///
    /// Walks `istdBase` ancestor-first. A bounded bit-set over the style
    /// count breaks inheritance cycles; a damaged chain degrades to
    /// whatever was applied before the revisit.
    pub fn apply_style(&self, state: &mut PropertyState, istd: u16) {
        let mut visited = FixedBitSet::with_capacity(self.styles.count());
        self.apply_style_guarded(state, istd, &mut visited);
    }

    fn apply_style_guarded(&self, state: &mut PropertyState, istd: u16, visited: &mut FixedBitSet) {
        if istd == ISTD_NIL {
            return;
        }
        let Some(style) = self.styles.style(istd) else {
            debug!(istd, "style slot empty; contributes no formatting");
            return;
        };
        let idx = istd as usize;
        if idx >= visited.len() || visited.contains(idx) {
            warn!(istd, "style inheritance cycle; chain truncated");
            return;
        }
        visited.insert(idx);

        if style.istd_base != ISTD_NIL {
            if style.istd_base == istd {
                warn!(istd, "style based on itself; parent ignored");
            } else {
                self.apply_style_guarded(state, style.istd_base, visited);
            }
        }

        // Table formatting precedes paragraph and character groups, the
        // order the groups are stored in.
        if style.kind == StyleKind::Table {
            if let Some(tapx) = &style.upx_tapx {
                for prl in parse_grpprl(tapx, self.order) {
                    self.apply_prl(state, ChpLevel::ParagraphDefault, &prl, false);
                }
            }
        }
        if let Some(papx) = &style.upx_papx {
            for prl in parse_grpprl(papx, self.order) {
                self.apply_prl(state, ChpLevel::ParagraphDefault, &prl, false);
            }
        }
        if let Some(chpx) = &style.upx_chpx {
            for prl in parse_grpprl(chpx, self.order) {
                self.apply_prl(state, ChpLevel::ParagraphDefault, &prl, false);
            }
        }
    }

    /// Apply the property modifier carried by a piece descriptor.
    ///
    /// Only Prm0 is decodable; the embedded operation index maps through
    /// a fixed table to a full Sprm. Prm1 is flagged and skipped.
    pub fn apply_prm(&self, state: &mut PropertyState, prm: u16, level: ChpLevel, wanted_sgc: u8) {
        if prm == 0 {
            return;
        }
        if prm & 0x0001 != 0 {
            debug!(prm, "Prm1 piece property modifier is not decoded");
            return;
        }
        let isprm = ((prm >> 1) & 0x7F) as u8;
        let value = (prm >> 8) as u8;
        let Some(sprm) = prm0_sprm(isprm) else {
            debug!(isprm, "unmapped Prm0 operation; skipped");
            return;
        };
        if sprm.sgc() != wanted_sgc {
            return;
        }
        let prl = Prl {
            sprm,
            operand: smallvec::smallvec![value],
        };
        self.apply_prl(state, level, &prl, true);
    }

    fn apply_prl(&self, state: &mut PropertyState, level: ChpLevel, prl: &Prl, direct: bool) {
        match prl.sprm.sgc() {
            SGC_CHARACTER => self.apply_character(state, level, prl),
            SGC_PARAGRAPH => self.apply_paragraph(state, prl, direct),
            SGC_SECTION => self.apply_section(state, prl),
            SGC_TABLE => self.apply_table(state, prl),
            SGC_PICTURE => self.apply_picture(state, prl),
            other => debug!(sgc = other, "Prl with unknown property class skipped"),
        }
    }

    fn apply_character(&self, state: &mut PropertyState, level: ChpLevel, prl: &Prl) {
        // Toggles resolve against the style-applied value, which is what
        // the paragraph-level defaults hold when a run is being formatted.
        let style_chp = state.pap_chp.clone();
        let chp = match level {
            ChpLevel::Run => &mut state.chp,
            ChpLevel::ParagraphDefault => &mut state.pap_chp,
        };
        match prl.sprm.ispmd() {
            SPRM_C_F_BOLD => {
                if let Some(op) = prl.operand_byte() {
                    chp.bold = resolve_toggle(op, style_chp.bold);
                }
            }
            SPRM_C_F_ITALIC => {
                if let Some(op) = prl.operand_byte() {
                    chp.italic = resolve_toggle(op, style_chp.italic);
                }
            }
            SPRM_C_F_STRIKE => {
                if let Some(op) = prl.operand_byte() {
                    chp.strike = resolve_toggle(op, style_chp.strike);
                }
            }
            SPRM_C_F_OUTLINE => {
                if let Some(op) = prl.operand_byte() {
                    chp.underline = resolve_toggle(op, style_chp.underline);
                }
            }
            SPRM_C_F_SMALL_CAPS | SPRM_C_F_CAPS => {
                if let Some(op) = prl.operand_byte() {
                    chp.all_caps = resolve_toggle(op, style_chp.all_caps);
                }
            }
            SPRM_C_KUL => {
                if let Some(op) = prl.operand_byte() {
                    chp.underline_style = Underline::from_operand(op);
                    chp.underline = chp.underline_style.is_underlined();
                }
            }
            SPRM_C_ISS => {
                if let Some(op) = prl.operand_byte() {
                    chp.vertical = VerticalPosition::from_operand(op);
                }
            }
            SPRM_C_HPS_KERN => {
                if let Some(v) = prl.operand_u16(self.order) {
                    chp.kerning = v;
                }
            }
            SPRM_C_CHAR_SCALE => {
                if let Some(v) = prl.operand_u16(self.order) {
                    chp.char_scale = v;
                }
            }
            SPRM_C_DXA_SPACE => {
                if let Some(v) = prl.operand_i16(self.order) {
                    chp.dxa_space = v;
                }
            }
            SPRM_C_ICO => {
                if let Some(op) = prl.operand_byte() {
                    chp.color = if op == 0 { None } else { ico_color(op) };
                }
            }
            SPRM_C_CV => {
                if let Some(cv) = prl.operand_u32(self.order) {
                    // COLORREF layout 0x00BBGGRR
                    chp.color = Some(Rgb::new(
                        (cv & 0xFF) as u8,
                        ((cv >> 8) & 0xFF) as u8,
                        ((cv >> 16) & 0xFF) as u8,
                    ));
                }
            }
            SPRM_C_HIGHLIGHT => {
                if let Some(op) = prl.operand_byte() {
                    chp.back_color = if op == 0 { None } else { ico_color(op) };
                }
            }
            SPRM_C_HPS | SPRM_C_HPS_BI => {
                if let Some(hps) = prl.operand_u16(self.order) {
                    chp.size = hps;
                }
            }
            SPRM_C_RG_FTC0 => {
                if let Some(ftc) = prl.operand_u16(self.order) {
                    chp.font = ftc;
                }
            }
            SPRM_C_ISTD => {
                if let Some(istd) = prl.operand_u16(self.order) {
                    chp.istd = Some(istd);
                }
            }
            SPRM_C_F_SPEC => {
                if let Some(op) = prl.operand_byte() {
                    chp.f_spec = resolve_toggle(op, style_chp.f_spec);
                }
            }
            SPRM_C_F_OBJ => {
                if let Some(op) = prl.operand_byte() {
                    chp.f_obj = op != 0;
                }
            }
            SPRM_C_F_OLE2 => {
                if let Some(op) = prl.operand_byte() {
                    chp.f_ole2 = op != 0;
                }
            }
            SPRM_C_F_DATA => {
                if let Some(op) = prl.operand_byte() {
                    chp.f_data = op != 0;
                }
            }
            SPRM_C_PIC_LOCATION => {
                if let Some(fc) = prl.operand_u32(self.order) {
                    chp.pic_location = Some(fc);
                    chp.f_spec = true;
                }
            }
            other => debug!(
                ispmd = format_args!("0x{other:02X}"),
                "unhandled character Sprm"
            ),
        }
    }

    fn apply_paragraph(&self, state: &mut PropertyState, prl: &Prl, direct: bool) {
        match prl.sprm.ispmd() {
            SPRM_P_ISTD => {
                if let Some(istd) = prl.operand_u16(self.order) {
                    state.pap.istd = istd;
                    // Inside a style grpprl the reference names the style
                    // itself; resolving it again would recurse.
                    if direct {
                        self.apply_style(state, istd);
                    }
                }
            }
            SPRM_P_JC80 | SPRM_P_JC => {
                if let Some(op) = prl.operand_byte() {
                    state.pap.justification = Justification::from_operand(op);
                }
            }
            SPRM_P_DYA_BEFORE => {
                if let Some(v) = prl.operand_u16(self.order) {
                    state.pap.dya_before = v;
                }
            }
            SPRM_P_DYA_AFTER => {
                if let Some(v) = prl.operand_u16(self.order) {
                    state.pap.dya_after = v;
                }
            }
            SPRM_P_DYA_LINE => {
                // LSPD operand: dyaLine followed by the multiple flag
                if let Some(v) = prl.operand_i16(self.order) {
                    state.pap.dya_line = v;
                }
            }
            SPRM_P_F_KEEP => {
                if let Some(op) = prl.operand_byte() {
                    state.pap.keep = op != 0;
                }
            }
            SPRM_P_F_KEEP_FOLLOW => {
                if let Some(op) = prl.operand_byte() {
                    state.pap.keep_follow = op != 0;
                }
            }
            SPRM_P_F_PAGE_BREAK_BEFORE => {
                if let Some(op) = prl.operand_byte() {
                    state.pap.page_break_before = op != 0;
                }
            }
            SPRM_P_OUT_LVL => {
                if let Some(op) = prl.operand_byte() {
                    state.pap.outline_level = op;
                }
            }
            SPRM_P_DXA_LEFT80 | SPRM_P_DXA_LEFT => {
                if let Some(v) = prl.operand_i16(self.order) {
                    state.pap.dxa_left = v as i32;
                }
            }
            SPRM_P_DXA_RIGHT80 | SPRM_P_DXA_RIGHT => {
                if let Some(v) = prl.operand_i16(self.order) {
                    state.pap.dxa_right = v as i32;
                }
            }
            SPRM_P_DXA_LEFT180 | SPRM_P_DXA_LEFT1 => {
                if let Some(v) = prl.operand_i16(self.order) {
                    state.pap.dxa_left1 = v as i32;
                }
            }
            SPRM_P_F_IN_TABLE => {
                if let Some(op) = prl.operand_byte() {
                    state.pap.in_table = op != 0;
                    if state.pap.in_table && state.pap.itap == 0 {
                        state.pap.itap = 1;
                    }
                }
            }
            SPRM_P_F_TTP => {
                if let Some(op) = prl.operand_byte() {
                    state.pap.ttp = op != 0;
                }
            }
            SPRM_P_ITAP => {
                if let Some(itap) = prl.operand_u32(self.order) {
                    state.pap.itap = itap as i32;
                    if state.pap.itap > 0 {
                        state.pap.in_table = true;
                    }
                }
            }
            SPRM_P_F_INNER_TABLE_CELL => {
                if let Some(op) = prl.operand_byte() {
                    state.pap.itc = op != 0;
                }
            }
            SPRM_P_F_INNER_TTP => {
                if let Some(op) = prl.operand_byte() {
                    state.pap.ittp = op != 0;
                }
            }
            other => debug!(
                ispmd = format_args!("0x{other:02X}"),
                "unhandled paragraph Sprm"
            ),
        }
    }

    fn apply_section(&self, state: &mut PropertyState, prl: &Prl) {
        match prl.sprm.ispmd() {
            SPRM_S_BKC => {
                if let Some(op) = prl.operand_byte() {
                    state.sep.break_kind = SectionBreak::from_operand(op);
                }
            }
            SPRM_S_CCOLUMNS => {
                if let Some(v) = prl.operand_u16(self.order) {
                    // stored as the column count minus one
                    state.sep.columns = v + 1;
                }
            }
            SPRM_S_NFC_PGN => {
                if let Some(op) = prl.operand_byte() {
                    use super::properties::PageNumberFormat::*;
                    state.sep.pgn_format = match op {
                        1 => UpperRoman,
                        2 => LowerRoman,
                        3 => UpperLetter,
                        4 => LowerLetter,
                        _ => Decimal,
                    };
                }
            }
            SPRM_S_XA_PAGE => {
                if let Some(v) = prl.operand_u16(self.order) {
                    state.sep.xa_page = v;
                }
            }
            SPRM_S_YA_PAGE => {
                if let Some(v) = prl.operand_u16(self.order) {
                    state.sep.ya_page = v;
                }
            }
            SPRM_S_DXA_LEFT => {
                if let Some(v) = prl.operand_u16(self.order) {
                    state.sep.dxa_left = v;
                }
            }
            SPRM_S_DXA_RIGHT => {
                if let Some(v) = prl.operand_u16(self.order) {
                    state.sep.dxa_right = v;
                }
            }
            SPRM_S_DYA_TOP => {
                if let Some(v) = prl.operand_i16(self.order) {
                    state.sep.dya_top = v;
                }
            }
            SPRM_S_DYA_BOTTOM => {
                if let Some(v) = prl.operand_i16(self.order) {
                    state.sep.dya_bottom = v;
                }
            }
            SPRM_S_DZA_GUTTER => {
                if let Some(v) = prl.operand_u16(self.order) {
                    state.sep.dza_gutter = v;
                }
            }
            SPRM_S_B_ORIENTATION => {
                if let Some(op) = prl.operand_byte() {
                    state.sep.landscape = op == 2;
                }
            }
            other => debug!(
                ispmd = format_args!("0x{other:02X}"),
                "unhandled section Sprm"
            ),
        }
    }

    fn apply_table(&self, state: &mut PropertyState, prl: &Prl) {
        match prl.sprm.ispmd() {
            SPRM_T_JC90 | SPRM_T_JC => {
                if let Some(v) = prl.operand_u16(self.order) {
                    state.trp.justification = match v {
                        1 => Justification::Center,
                        2 => Justification::Right,
                        _ => Justification::Left,
                    };
                }
            }
            SPRM_T_DYA_ROW_HEIGHT => {
                if let Some(v) = prl.operand_i16(self.order) {
                    state.trp.dya_height = v;
                }
            }
            SPRM_T_TABLE_HEADER => {
                if let Some(op) = prl.operand_byte() {
                    state.trp.header = op != 0;
                }
            }
            SPRM_T_F_CANT_SPLIT90 => {
                if let Some(op) = prl.operand_byte() {
                    state.trp.cant_split = op != 0;
                }
            }
            SPRM_T_DEF_TABLE => self.apply_table_definition(state, prl),
            SPRM_T_TABLE_BORDERS80 => {
                // Six Brc80 structures; a border is present when its
                // pattern word is non-zero.
                let operand = &prl.operand;
                for (i, slot) in state.trp.borders.iter_mut().enumerate() {
                    let base = 1 + i * 4;
                    if let Ok(v) = self.order.u32(operand, base) {
                        *slot = v != 0;
                    }
                }
            }
            SPRM_T_DEF_TABLE_SHD80 => {
                if let Some(v) = prl.operand_u16(self.order) {
                    state.tcp.shading = v;
                }
            }
            SPRM_T_VERT_MERGE => {
                if let Some(op) = prl.operand.get(1).copied() {
                    state.tcp.vert_merged = op != 0;
                }
            }
            other => debug!(ispmd = format_args!("0x{other:02X}"), "unhandled table Sprm"),
        }
    }

    /// Decode the cell boundary list of a TDefTableOperand.
    fn apply_table_definition(&self, state: &mut PropertyState, prl: &Prl) {
        // Operand: u16 size, then itcMac (cell count), then itcMac + 1
        // boundary positions of 2 bytes each.
        let operand = &prl.operand;
        let Some(itc_mac) = operand.get(2).map(|&b| b as usize) else {
            return;
        };
        if itc_mac == 0 || itc_mac > MAX_CELLS {
            warn!(itc_mac, "table definition cell count out of range");
            return;
        }
        let mut cellx = Vec::with_capacity(itc_mac);
        for i in 0..=itc_mac {
            match self.order.i16(operand, 3 + i * 2) {
                Ok(x) if i > 0 => cellx.push(x),
                Ok(_) => {}
                Err(_) => {
                    warn!("table definition truncated; keeping parsed boundaries");
                    break;
                }
            }
        }
        state.trp.cellx = cellx;
    }

    fn apply_picture(&self, state: &mut PropertyState, prl: &Prl) {
        let border = |slot: &mut bool, prl: &Prl, order: ByteOrder| {
            if let Some(v) = prl.operand_u32(order) {
                *slot = v != 0;
            }
        };
        match prl.sprm.ispmd() {
            SPRM_PIC_BRC_TOP80 => border(&mut state.pic.borders[0], prl, self.order),
            SPRM_PIC_BRC_LEFT80 => border(&mut state.pic.borders[1], prl, self.order),
            SPRM_PIC_BRC_BOTTOM80 => border(&mut state.pic.borders[2], prl, self.order),
            SPRM_PIC_BRC_RIGHT80 => border(&mut state.pic.borders[3], prl, self.order),
            other => debug!(
                ispmd = format_args!("0x{other:02X}"),
                "unhandled picture Sprm"
            ),
        }
    }
}

/// Map a Prm0 operation index to its full Sprm.
///
/// The table covers the character toggle block and the paragraph marks a
/// fast save most often stashes in a piece modifier; everything else is
/// reported unmapped.
fn prm0_sprm(isprm: u8) -> Option<Sprm> {
    let sprm = match isprm {
        0x05 => 0x2403, // sprmPJc80
        0x18 => 0x2416, // sprmPFInTable
        0x19 => 0x2417, // sprmPFTtp
        0x4E => 0x0835, // sprmCFBold
        0x4F => 0x0836, // sprmCFItalic
        0x50 => 0x0837, // sprmCFStrike
        0x51 => 0x0838, // sprmCFOutline
        0x53 => 0x083A, // sprmCFSmallCaps
        0x54 => 0x083B, // sprmCFCaps
        0x56 => 0x2A3E, // sprmCKul
        _ => return None,
    };
    Some(Sprm(sprm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::stylesheet::tests::{std_bytes, stsh_bytes};

    fn composer(styles: &StyleSheet) -> Composer<'_> {
        Composer {
            styles,
            order: ByteOrder::Little,
        }
    }

    fn prl(sprm: u16, operand: &[u8]) -> Prl {
        Prl {
            sprm: Sprm(sprm),
            operand: smallvec::SmallVec::from_slice(operand),
        }
    }

    #[test]
    fn test_character_toggles() {
        let styles = StyleSheet::default();
        let c = composer(&styles);
        let mut state = PropertyState::default();

        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x0835, &[1]));
        assert!(state.chp.bold);
        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x0835, &[0]));
        assert!(!state.chp.bold);

        // 0x80/0x81 resolve against the paragraph-level defaults
        state.pap_chp.bold = true;
        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x0835, &[0x80]));
        assert!(state.chp.bold);
        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x0835, &[0x81]));
        assert!(!state.chp.bold);
    }

    #[test]
    fn test_colors_and_size() {
        let styles = StyleSheet::default();
        let c = composer(&styles);
        let mut state = PropertyState::default();

        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x2A42, &[0x06]));
        assert_eq!(state.chp.color, Some(Rgb::new(0xFF, 0, 0)));
        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x2A0C, &[0x02]));
        assert_eq!(state.chp.back_color, Some(Rgb::new(0, 0, 0xFF)));
        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x4A43, &[0x18, 0x00]));
        assert_eq!(state.chp.size, 24);
        c.apply_direct(
            &mut state,
            ChpLevel::Run,
            &prl(0x6870, &[0x40, 0x80, 0xC0, 0x00]),
        );
        assert_eq!(state.chp.color, Some(Rgb::new(0x40, 0x80, 0xC0)));
    }

    #[test]
    fn test_paragraph_justification_folds() {
        let styles = StyleSheet::default();
        let c = composer(&styles);
        let mut state = PropertyState::default();

        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x2403, &[1]));
        assert_eq!(state.pap.justification, Justification::Center);
        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x2461, &[7]));
        assert_eq!(state.pap.justification, Justification::Justify);
    }

    #[test]
    fn test_table_depth_flags() {
        let styles = StyleSheet::default();
        let c = composer(&styles);
        let mut state = PropertyState::default();

        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x2416, &[1]));
        assert!(state.pap.in_table);
        assert_eq!(state.pap.itap, 1);
        c.apply_direct(
            &mut state,
            ChpLevel::Run,
            &prl(0x6649, &[0x02, 0x00, 0x00, 0x00]),
        );
        assert_eq!(state.pap.itap, 2);
        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x2417, &[1]));
        assert!(state.pap.ttp);
    }

    #[test]
    fn test_table_definition_cells() {
        let styles = StyleSheet::default();
        let c = composer(&styles);
        let mut state = PropertyState::default();

        // 2 cells: boundaries 0, 1440, 2880
        let mut operand = vec![0u8; 3 + 3 * 2];
        let operand_len = operand.len();
        operand[0..2].copy_from_slice(&((operand_len - 2) as u16).to_le_bytes());
        operand[2] = 2;
        operand[3..5].copy_from_slice(&0i16.to_le_bytes());
        operand[5..7].copy_from_slice(&1440i16.to_le_bytes());
        operand[7..9].copy_from_slice(&2880i16.to_le_bytes());
        c.apply_direct(&mut state, ChpLevel::Run, &prl(0xD608, &operand));
        assert_eq!(state.trp.cellx, vec![1440, 2880]);
    }

    #[test]
    fn test_style_inheritance_chain() {
        // style 0: bold; style 1 based on 0: italic
        let bold = [0x35, 0x08, 0x01];
        let italic = [0x36, 0x08, 0x01];
        let data = stsh_bytes(&[
            Some(std_bytes(0, 1, ISTD_NIL, "A", &[], &bold)),
            Some(std_bytes(1, 1, 0, "B", &[], &italic)),
        ]);
        let styles = StyleSheet::parse(&data, ByteOrder::Little).unwrap();
        let c = composer(&styles);
        let mut state = PropertyState::default();

        c.apply_style(&mut state, 1);
        assert!(state.pap_chp.bold);
        assert!(state.pap_chp.italic);

        // toggling bold on a run negates the style value
        state.chp.reset_from(&state.pap_chp.clone());
        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x0835, &[0x81]));
        assert!(!state.chp.bold);
        assert!(state.chp.italic);
    }

    #[test]
    fn test_root_style_equals_own_grpprl_over_defaults() {
        // a style without a parent contributes exactly its own grpprls
        let chpx = [0x35, 0x08, 0x01, 0x43, 0x4A, 0x18, 0x00]; // bold, 12pt
        let papx = [0x03, 0x24, 0x02]; // right-justified
        let data = stsh_bytes(&[Some(std_bytes(0, 1, ISTD_NIL, "Root", &papx, &chpx))]);
        let styles = StyleSheet::parse(&data, ByteOrder::Little).unwrap();
        let c = composer(&styles);

        let mut via_style = PropertyState::default();
        c.apply_style(&mut via_style, 0);

        let mut via_grpprl = PropertyState::default();
        for prl in crate::doc::sprm::parse_grpprl(&papx, ByteOrder::Little) {
            c.apply_direct(&mut via_grpprl, ChpLevel::ParagraphDefault, &prl);
        }
        for prl in crate::doc::sprm::parse_grpprl(&chpx, ByteOrder::Little) {
            c.apply_direct(&mut via_grpprl, ChpLevel::ParagraphDefault, &prl);
        }

        assert_eq!(via_style.pap_chp.bold, via_grpprl.pap_chp.bold);
        assert_eq!(via_style.pap_chp.size, via_grpprl.pap_chp.size);
        assert_eq!(
            via_style.pap.justification,
            via_grpprl.pap.justification
        );
        assert_eq!(via_style.pap.justification, Justification::Right);
        assert_eq!(via_style.pap_chp.size, 24);
    }

    #[test]
    fn test_style_cycle_is_broken() {
        // two styles based on each other
        let data = stsh_bytes(&[
            Some(std_bytes(0, 1, 1, "A", &[], &[0x35, 0x08, 0x01])),
            Some(std_bytes(1, 1, 0, "B", &[], &[0x36, 0x08, 0x01])),
        ]);
        let styles = StyleSheet::parse(&data, ByteOrder::Little).unwrap();
        let c = composer(&styles);
        let mut state = PropertyState::default();
        // must terminate and still apply both styles once
        c.apply_style(&mut state, 1);
        assert!(state.pap_chp.bold);
        assert!(state.pap_chp.italic);
    }

    #[test]
    fn test_prm0_application() {
        let styles = StyleSheet::default();
        let c = composer(&styles);
        let mut state = PropertyState::default();

        // isprm 0x4E (bold) with value 1: prm = isprm << 1 | value << 8
        let prm = (0x4Eu16 << 1) | (1 << 8);
        c.apply_prm(&mut state, prm, ChpLevel::Run, SGC_CHARACTER);
        assert!(state.chp.bold);

        // a paragraph-class Prm0 is ignored when characters are wanted
        let mut state = PropertyState::default();
        let prm = (0x19u16 << 1) | (1 << 8);
        c.apply_prm(&mut state, prm, ChpLevel::Run, SGC_CHARACTER);
        assert!(!state.pap.ttp);
        c.apply_prm(&mut state, prm, ChpLevel::Run, SGC_PARAGRAPH);
        assert!(state.pap.ttp);
    }

    #[test]
    fn test_run_metrics() {
        let styles = StyleSheet::default();
        let c = composer(&styles);
        let mut state = PropertyState::default();

        // sprmCIss (superscript), sprmCHpsKern, sprmCCharScale
        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x2A48, &[1]));
        assert_eq!(state.chp.vertical, VerticalPosition::Superscript);
        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x484B, &[0x14, 0x00]));
        assert_eq!(state.chp.kerning, 20);
        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x4852, &[0xC8, 0x00]));
        assert_eq!(state.chp.char_scale, 200);
    }

    #[test]
    fn test_paragraph_flow_flags() {
        let styles = StyleSheet::default();
        let c = composer(&styles);
        let mut state = PropertyState::default();

        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x2405, &[1]));
        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x2406, &[1]));
        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x2407, &[1]));
        assert!(state.pap.keep);
        assert!(state.pap.keep_follow);
        assert!(state.pap.page_break_before);
        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x2440, &[2]));
        assert_eq!(state.pap.outline_level, 2);
    }

    #[test]
    fn test_section_properties() {
        let styles = StyleSheet::default();
        let c = composer(&styles);
        let mut state = PropertyState::default();

        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x500B, &[0x01, 0x00]));
        assert_eq!(state.sep.columns, 2);
        c.apply_direct(&mut state, ChpLevel::Run, &prl(0xB01F, &[0xD0, 0x2F]));
        assert_eq!(state.sep.xa_page, 12240);
        c.apply_direct(&mut state, ChpLevel::Run, &prl(0x3009, &[0x00]));
        assert_eq!(state.sep.break_kind, SectionBreak::Continuous);
    }
}
