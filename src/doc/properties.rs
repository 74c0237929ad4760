//! Effective formatting property structures.
//!
//! The composer folds style-sheet defaults and direct grpprls into these
//! structures. Paragraph properties reset at paragraph boundaries,
//! character properties reset per run from the paragraph-level character
//! defaults, section and row properties reset at their own boundaries.

/// An RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// The fixed 17-entry colour palette addressed by Ico operands.
pub const ICO_PALETTE: [Rgb; 17] = [
    Rgb::new(0x00, 0x00, 0x00), // 0x00 automatic (black)
    Rgb::new(0x00, 0x00, 0x00), // 0x01 black
    Rgb::new(0x00, 0x00, 0xFF), // 0x02 blue
    Rgb::new(0x00, 0xFF, 0xFF), // 0x03 cyan
    Rgb::new(0x00, 0xFF, 0x00), // 0x04 green
    Rgb::new(0xFF, 0x00, 0xFF), // 0x05 magenta
    Rgb::new(0xFF, 0x00, 0x00), // 0x06 red
    Rgb::new(0xFF, 0xFF, 0x00), // 0x07 yellow
    Rgb::new(0xFF, 0xFF, 0xFF), // 0x08 white
    Rgb::new(0x00, 0x00, 0x80), // 0x09 navy
    Rgb::new(0x00, 0x80, 0x80), // 0x0A teal
    Rgb::new(0x00, 0x80, 0x00), // 0x0B dark green
    Rgb::new(0x80, 0x00, 0x80), // 0x0C purple
    Rgb::new(0x80, 0x00, 0x80), // 0x0D dark red (stored as purple)
    Rgb::new(0x80, 0x80, 0x00), // 0x0E olive
    Rgb::new(0x80, 0x80, 0x80), // 0x0F grey
    Rgb::new(0xC0, 0xC0, 0xC0), // 0x10 silver
];

/// Look up a palette entry by Ico operand value.
#[inline]
pub fn ico_color(operand: u8) -> Option<Rgb> {
    ICO_PALETTE.get(operand as usize).copied()
}

/// Resolve a Boolean toggle operand against the style-applied value.
///
/// `0x00`/`0x01` set the property, `0x80` matches the value of the current
/// style, `0x81` is the logical not of the style value. Anything else is
/// treated as off.
#[inline]
pub fn resolve_toggle(operand: u8, style_value: bool) -> bool {
    match operand {
        0x00 => false,
        0x01 => true,
        0x80 => style_value,
        0x81 => !style_value,
        _ => false,
    }
}

/// Paragraph justification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justification {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Justification {
    /// Decode a PJc operand; out-of-range values fold to justify.
    #[inline]
    pub fn from_operand(value: u8) -> Self {
        match value {
            0 => Justification::Left,
            1 => Justification::Center,
            2 => Justification::Right,
            _ => Justification::Justify,
        }
    }
}

/// Underline styles carried by sprmCKul.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Underline {
    #[default]
    None,
    Single,
    WordsOnly,
    Double,
    Dotted,
    Other(u8),
}

impl Underline {
    #[inline]
    pub fn from_operand(value: u8) -> Self {
        match value {
            0 => Underline::None,
            1 => Underline::Single,
            2 => Underline::WordsOnly,
            3 => Underline::Double,
            4 => Underline::Dotted,
            other => Underline::Other(other),
        }
    }

    #[inline]
    pub fn is_underlined(self) -> bool {
        self != Underline::None
    }
}

/// Vertical text position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalPosition {
    #[default]
    Normal,
    Superscript,
    Subscript,
}

impl VerticalPosition {
    #[inline]
    pub fn from_operand(value: u8) -> Self {
        match value {
            1 => VerticalPosition::Superscript,
            2 => VerticalPosition::Subscript,
            _ => VerticalPosition::Normal,
        }
    }
}

/// Effective character properties.
#[derive(Debug, Clone, Default)]
pub struct Chp {
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub underline: bool,
    pub underline_style: Underline,
    pub all_caps: bool,
    pub vertical: VerticalPosition,
    /// Font index into the document font table
    pub font: u16,
    /// Font size in half-points
    pub size: u16,
    /// Kerning threshold in half-points
    pub kerning: u16,
    /// Horizontal scale in percent; zero means unscaled
    pub char_scale: u16,
    /// Extra character spacing in twips
    pub dxa_space: i16,
    /// Foreground colour, when set by Ico or Cv
    pub color: Option<Rgb>,
    /// Background (highlight) colour
    pub back_color: Option<Rgb>,
    /// Character style index
    pub istd: Option<u16>,
    /// Run consists of special characters (picture anchors etc.)
    pub f_spec: bool,
    /// Run is an embedded object anchor
    pub f_obj: bool,
    /// Run is an OLE2 object
    pub f_ole2: bool,
    /// Picture offset points at form field data, not a picture
    pub f_data: bool,
    /// Offset of picture data in the Data stream
    pub pic_location: Option<u32>,
    /// Character position this CHP was resolved for
    pub cp: u32,
}

impl Chp {
    /// Reset to the paragraph-level character defaults, keeping only the
    /// fields inherited across runs.
    pub fn reset_from(&mut self, para_defaults: &Chp) {
        *self = Chp {
            bold: para_defaults.bold,
            italic: para_defaults.italic,
            strike: para_defaults.strike,
            underline: para_defaults.underline,
            underline_style: para_defaults.underline_style,
            all_caps: para_defaults.all_caps,
            vertical: para_defaults.vertical,
            font: para_defaults.font,
            size: para_defaults.size,
            kerning: para_defaults.kerning,
            char_scale: para_defaults.char_scale,
            dxa_space: para_defaults.dxa_space,
            color: para_defaults.color,
            back_color: para_defaults.back_color,
            ..Chp::default()
        };
    }
}

/// Effective paragraph properties.
#[derive(Debug, Clone, Default)]
pub struct Pap {
    /// Paragraph is inside a table
    pub in_table: bool,
    /// Table nesting depth (0 = not in a table)
    pub itap: i32,
    /// Left indent, twips
    pub dxa_left: i32,
    /// Right indent, twips
    pub dxa_right: i32,
    /// First-line indent, twips
    pub dxa_left1: i32,
    pub justification: Justification,
    /// Paragraph style index
    pub istd: u16,
    /// Space before, twips
    pub dya_before: u16,
    /// Space after, twips
    pub dya_after: u16,
    /// Line spacing, twips; negative means exact
    pub dya_line: i16,
    pub keep: bool,
    pub keep_follow: bool,
    pub page_break_before: bool,
    /// Outline level; 9 = body text
    pub outline_level: u8,
    /// Table terminating paragraph mark
    pub ttp: bool,
    /// Inner table terminating paragraph mark
    pub ittp: bool,
    /// Inner table cell mark
    pub itc: bool,
}

/// Section break kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionBreak {
    Continuous,
    NewColumn,
    #[default]
    NewPage,
    EvenPage,
    OddPage,
}

impl SectionBreak {
    #[inline]
    pub fn from_operand(value: u8) -> Self {
        match value {
            0 => SectionBreak::Continuous,
            1 => SectionBreak::NewColumn,
            3 => SectionBreak::EvenPage,
            4 => SectionBreak::OddPage,
            _ => SectionBreak::NewPage,
        }
    }
}

/// Page number formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageNumberFormat {
    #[default]
    Decimal,
    UpperRoman,
    LowerRoman,
    UpperLetter,
    LowerLetter,
}

/// Effective section properties.
#[derive(Debug, Clone, Default)]
pub struct Sep {
    /// Number of columns
    pub columns: u16,
    pub break_kind: SectionBreak,
    pub pgn_format: PageNumberFormat,
    /// Page width, twips
    pub xa_page: u16,
    /// Page height, twips
    pub ya_page: u16,
    /// Margins, twips
    pub dxa_left: u16,
    pub dxa_right: u16,
    pub dya_top: i16,
    pub dya_bottom: i16,
    /// Gutter width, twips
    pub dza_gutter: u16,
    pub landscape: bool,
    /// Section style index
    pub istd: u16,
}

/// Maximum number of cells a row can carry.
pub const MAX_CELLS: usize = 64;

/// Effective table row properties.
#[derive(Debug, Clone, Default)]
pub struct Trp {
    pub justification: Justification,
    /// Right boundaries of each cell, twips
    pub cellx: Vec<i16>,
    /// Row height, twips
    pub dya_height: i16,
    /// Row is a header row
    pub header: bool,
    /// Row must not split across pages
    pub cant_split: bool,
    /// Row borders: top, left, bottom, right, horizontal, vertical
    pub borders: [bool; 6],
}

/// Effective table cell properties.
#[derive(Debug, Clone, Default)]
pub struct Tcp {
    /// Shading in hundredths of a percent
    pub shading: u16,
    /// First cell of a horizontal merge
    pub merge_first: bool,
    /// Cell merged with the preceding cell
    pub merged: bool,
    /// Cell vertically merged
    pub vert_merged: bool,
}

/// Inline picture state accumulated from picture-class Prls.
#[derive(Debug, Clone, Default)]
pub struct Pic {
    /// Borders: top, left, bottom, right
    pub borders: [bool; 4],
}

/// Document-level properties.
///
/// Carried for the sink contract; the decoder leaves them at their
/// defaults, matching the field set of the original format.
#[derive(Debug, Clone)]
pub struct Dop {
    /// Page width, twips
    pub xa_page: u16,
    /// Page height, twips
    pub ya_page: u16,
    /// Margins, twips
    pub dxa_left: u16,
    pub dxa_right: u16,
    pub dya_top: u16,
    pub dya_bottom: u16,
    pub facing_pages: bool,
}

impl Default for Dop {
    fn default() -> Self {
        // US Letter with one-inch margins, the format's baseline geometry.
        Dop {
            xa_page: 12240,
            ya_page: 15840,
            dxa_left: 1440,
            dxa_right: 1440,
            dya_top: 1440,
            dya_bottom: 1440,
            facing_pages: false,
        }
    }
}

/// The full composed state handed to event sinks.
#[derive(Debug, Clone, Default)]
pub struct PropertyState {
    pub dop: Dop,
    pub sep: Sep,
    pub pap: Pap,
    /// Paragraph-level character defaults resolved from the style chain
    pub pap_chp: Chp,
    /// Character properties of the current run
    pub chp: Chp,
    pub trp: Trp,
    pub tcp: Tcp,
    pub pic: Pic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_resolution() {
        assert!(!resolve_toggle(0x00, true));
        assert!(resolve_toggle(0x01, false));
        assert!(resolve_toggle(0x80, true));
        assert!(!resolve_toggle(0x80, false));
        assert!(!resolve_toggle(0x81, true));
        assert!(resolve_toggle(0x81, false));
        assert!(!resolve_toggle(0x42, true));
    }

    #[test]
    fn test_palette() {
        assert_eq!(ico_color(0x02), Some(Rgb::new(0, 0, 0xFF)));
        assert_eq!(ico_color(0x06), Some(Rgb::new(0xFF, 0, 0)));
        assert_eq!(ico_color(0x10), Some(Rgb::new(0xC0, 0xC0, 0xC0)));
        assert_eq!(ico_color(0x11), None);
    }

    #[test]
    fn test_justification_folds_to_justify() {
        assert_eq!(Justification::from_operand(0), Justification::Left);
        assert_eq!(Justification::from_operand(1), Justification::Center);
        assert_eq!(Justification::from_operand(2), Justification::Right);
        assert_eq!(Justification::from_operand(3), Justification::Justify);
        assert_eq!(Justification::from_operand(9), Justification::Justify);
    }

    #[test]
    fn test_chp_reset_keeps_inherited_fields() {
        let para = Chp {
            bold: true,
            size: 24,
            color: Some(Rgb::new(1, 2, 3)),
            ..Chp::default()
        };

        let mut chp = Chp {
            f_spec: true,
            pic_location: Some(0x1000),
            ..Chp::default()
        };
        chp.reset_from(&para);

        assert!(chp.bold);
        assert_eq!(chp.size, 24);
        assert_eq!(chp.color, Some(Rgb::new(1, 2, 3)));
        assert!(!chp.f_spec);
        assert_eq!(chp.pic_location, None);
    }
}
