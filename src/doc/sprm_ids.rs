//! Sprm property classes and operation identifiers.
//!
//! A Sprm is a packed 16-bit control word: `ispmd` (9 bits, operation),
//! `fSpec` (1 bit), `sgc` (3 bits, property class) and `spra` (3 bits,
//! operand size code). The constants here are the `sgc` classes and the
//! per-class `ispmd` values the property composer recognises.

/// Property classes (`sgc`).
pub const SGC_PARAGRAPH: u8 = 0x1;
pub const SGC_CHARACTER: u8 = 0x2;
pub const SGC_PICTURE: u8 = 0x3;
pub const SGC_SECTION: u8 = 0x4;
pub const SGC_TABLE: u8 = 0x5;

// Character class (sgc = 2)

/// sprmCPicLocation - offset of picture data in the Data stream
pub const SPRM_C_PIC_LOCATION: u16 = 0x03;
/// sprmCFData - picture offset actually points at form field data
pub const SPRM_C_F_DATA: u16 = 0x06;
/// sprmCFOle2 - run is an OLE2 embedded object
pub const SPRM_C_F_OLE2: u16 = 0x0A;
/// sprmCHighlight - highlight (background) colour index
pub const SPRM_C_HIGHLIGHT: u16 = 0x0C;
/// sprmCIstd - character style index
pub const SPRM_C_ISTD: u16 = 0x30;
/// sprmCFBold
pub const SPRM_C_F_BOLD: u16 = 0x35;
/// sprmCFItalic
pub const SPRM_C_F_ITALIC: u16 = 0x36;
/// sprmCFStrike
pub const SPRM_C_F_STRIKE: u16 = 0x37;
/// sprmCFOutline
pub const SPRM_C_F_OUTLINE: u16 = 0x38;
/// sprmCFSmallCaps
pub const SPRM_C_F_SMALL_CAPS: u16 = 0x3A;
/// sprmCFCaps
pub const SPRM_C_F_CAPS: u16 = 0x3B;
/// sprmCKul - underline style
pub const SPRM_C_KUL: u16 = 0x3E;
/// sprmCDxaSpace - extra character spacing
pub const SPRM_C_DXA_SPACE: u16 = 0x40;
/// sprmCIco - foreground colour palette index
pub const SPRM_C_ICO: u16 = 0x42;
/// sprmCHps - font size in half-points
pub const SPRM_C_HPS: u16 = 0x43;
/// sprmCIss - superscript/subscript
pub const SPRM_C_ISS: u16 = 0x48;
/// sprmCHpsKern - kerning threshold in half-points
pub const SPRM_C_HPS_KERN: u16 = 0x4B;
/// sprmCRgFtc0 - font index for ASCII characters
pub const SPRM_C_RG_FTC0: u16 = 0x4F;
/// sprmCCharScale - horizontal scale in percent
pub const SPRM_C_CHAR_SCALE: u16 = 0x52;
/// sprmCFSpec - run consists of special characters
pub const SPRM_C_F_SPEC: u16 = 0x55;
/// sprmCFObj - run is an embedded object anchor
pub const SPRM_C_F_OBJ: u16 = 0x56;
/// sprmCHpsBi - font size for complex scripts
pub const SPRM_C_HPS_BI: u16 = 0x61;
/// sprmCCv - foreground colour as COLORREF
pub const SPRM_C_CV: u16 = 0x70;

// Paragraph class (sgc = 1)

/// sprmPIstd - paragraph style index; drives full style resolution
pub const SPRM_P_ISTD: u16 = 0x00;
/// sprmPJc80 - physical justification
pub const SPRM_P_JC80: u16 = 0x03;
/// sprmPFKeep - keep paragraph on one page
pub const SPRM_P_F_KEEP: u16 = 0x05;
/// sprmPFKeepFollow - keep with the following paragraph
pub const SPRM_P_F_KEEP_FOLLOW: u16 = 0x06;
/// sprmPFPageBreakBefore
pub const SPRM_P_F_PAGE_BREAK_BEFORE: u16 = 0x07;
/// sprmPDxaRight80
pub const SPRM_P_DXA_RIGHT80: u16 = 0x0E;
/// sprmPDxaLeft80
pub const SPRM_P_DXA_LEFT80: u16 = 0x0F;
/// sprmPDxaLeft180 - first line indent
pub const SPRM_P_DXA_LEFT180: u16 = 0x11;
/// sprmPDyaLine - line spacing descriptor
pub const SPRM_P_DYA_LINE: u16 = 0x12;
/// sprmPDyaBefore - space before, twips
pub const SPRM_P_DYA_BEFORE: u16 = 0x13;
/// sprmPDyaAfter - space after, twips
pub const SPRM_P_DYA_AFTER: u16 = 0x14;
/// sprmPChgTabs - tab change operand with exceptional length encoding
pub const SPRM_P_CHG_TABS: u16 = 0x15;
/// sprmPFInTable
pub const SPRM_P_F_IN_TABLE: u16 = 0x16;
/// sprmPFTtp - table terminating paragraph mark
pub const SPRM_P_F_TTP: u16 = 0x17;
/// sprmPOutLvl - outline level
pub const SPRM_P_OUT_LVL: u16 = 0x40;
/// sprmPItap - table nesting depth
pub const SPRM_P_ITAP: u16 = 0x49;
/// sprmPFInnerTableCell - inner table cell mark
pub const SPRM_P_F_INNER_TABLE_CELL: u16 = 0x4B;
/// sprmPFInnerTtp - inner table terminating paragraph mark
pub const SPRM_P_F_INNER_TTP: u16 = 0x4C;
/// sprmPDxaRight - logical right indent
pub const SPRM_P_DXA_RIGHT: u16 = 0x5D;
/// sprmPDxaLeft - logical left indent
pub const SPRM_P_DXA_LEFT: u16 = 0x5E;
/// sprmPDxaLeft1 - logical first line indent
pub const SPRM_P_DXA_LEFT1: u16 = 0x60;
/// sprmPJc - logical justification
pub const SPRM_P_JC: u16 = 0x61;

// Section class (sgc = 4)

/// sprmSBkc - section break kind
pub const SPRM_S_BKC: u16 = 0x09;
/// sprmSCcolumns - number of columns minus 1
pub const SPRM_S_CCOLUMNS: u16 = 0x0B;
/// sprmSNfcPgn - page number format
pub const SPRM_S_NFC_PGN: u16 = 0x0E;
/// sprmSBOrientation - page orientation
pub const SPRM_S_B_ORIENTATION: u16 = 0x1D;
/// sprmSXaPage - page width
pub const SPRM_S_XA_PAGE: u16 = 0x1F;
/// sprmSYaPage - page height
pub const SPRM_S_YA_PAGE: u16 = 0x20;
/// sprmSDxaLeft - left margin
pub const SPRM_S_DXA_LEFT: u16 = 0x21;
/// sprmSDxaRight - right margin
pub const SPRM_S_DXA_RIGHT: u16 = 0x22;
/// sprmSDyaTop - top margin
pub const SPRM_S_DYA_TOP: u16 = 0x23;
/// sprmSDyaBottom - bottom margin
pub const SPRM_S_DYA_BOTTOM: u16 = 0x24;
/// sprmSDzaGutter - gutter width
pub const SPRM_S_DZA_GUTTER: u16 = 0x25;

// Table class (sgc = 5)

/// sprmTJc90 - physical row justification
pub const SPRM_T_JC90: u16 = 0x00;
/// sprmTFCantSplit90 - row must not split across pages
pub const SPRM_T_F_CANT_SPLIT90: u16 = 0x03;
/// sprmTTableHeader - row is a header row
pub const SPRM_T_TABLE_HEADER: u16 = 0x04;
/// sprmTTableBorders80 - row border set
pub const SPRM_T_TABLE_BORDERS80: u16 = 0x05;
/// sprmTDyaRowHeight
pub const SPRM_T_DYA_ROW_HEIGHT: u16 = 0x07;
/// sprmTDefTable - cell boundary definition; exceptional length encoding
pub const SPRM_T_DEF_TABLE: u16 = 0x08;
/// sprmTDefTableShd80 - cell shading
pub const SPRM_T_DEF_TABLE_SHD80: u16 = 0x09;
/// sprmTVertMerge - vertical merge flags
pub const SPRM_T_VERT_MERGE: u16 = 0x2B;
/// sprmTJc - logical row justification
pub const SPRM_T_JC: u16 = 0x8A;

// Picture class (sgc = 3)

/// sprmPicBrcTop80
pub const SPRM_PIC_BRC_TOP80: u16 = 0x02;
/// sprmPicBrcLeft80
pub const SPRM_PIC_BRC_LEFT80: u16 = 0x03;
/// sprmPicBrcBottom80
pub const SPRM_PIC_BRC_BOTTOM80: u16 = 0x04;
/// sprmPicBrcRight80
pub const SPRM_PIC_BRC_RIGHT80: u16 = 0x05;
