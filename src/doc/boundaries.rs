//! Paragraph, row and section boundary determination.
//!
//! Boundaries are computed by joining the piece table with the paragraph
//! bin table and its FKP pages: a paragraph's extent is known once an FKP
//! offset range ends inside the current piece, and paragraphs crossing
//! piece boundaries are followed piece by piece. Finding the end of a
//! paragraph also resolves its direct formatting, mirroring how the
//! structures interleave on disk.

use super::apply::{ChpLevel, Composer};
use super::fkp::PapxFkp;
use super::piece_table::Pcd;
use super::properties::{Chp, Pap, Sep};
use super::session::{DocError, Result, Session};
use super::sprm::parse_grpprl;
use super::sprm_ids::SGC_PARAGRAPH;
use crate::common::binary::ByteOrder;
use tracing::{debug, warn};

/// Sentinel for a section without stored properties
const FC_SEPX_NIL: u32 = 0xFFFF_FFFF;

/// One section descriptor.
#[derive(Debug, Clone, Copy)]
pub struct Sed {
    /// Offset of the section's Sepx in the main stream
    pub fc_sepx: u32,
}

/// The section table (PlcfSed): ascending section limits and their
/// descriptors.
#[derive(Debug, Clone)]
pub struct SectionTable {
    a_cp: Vec<u32>,
    seds: Vec<Sed>,
}

impl SectionTable {
    /// Parse the PlcfSed region read from the table stream.
    ///
    /// Each descriptor is 12 bytes with the Sepx offset at byte 2.
    pub fn parse(data: &[u8], order: ByteOrder) -> Result<Self> {
        if data.len() < 16 || (data.len() - 4) % 16 != 0 {
            return Err(DocError::Corrupted(format!(
                "section table size {} is not a valid PlcfSed",
                data.len()
            )));
        }
        let n = (data.len() - 4) / 16;
        let mut a_cp = Vec::with_capacity(n + 1);
        for i in 0..=n {
            a_cp.push(order.u32(data, i * 4)?);
        }
        for window in a_cp.windows(2) {
            if window[0] >= window[1] {
                return Err(DocError::Corrupted(
                    "section limits are not strictly ascending".to_string(),
                ));
            }
        }
        let sed_base = (n + 1) * 4;
        let mut seds = Vec::with_capacity(n);
        for i in 0..n {
            seds.push(Sed {
                fc_sepx: order.u32(data, sed_base + i * 12 + 2)?,
            });
        }
        Ok(SectionTable { a_cp, seds })
    }

    /// Number of sections.
    #[inline]
    pub fn count(&self) -> usize {
        self.seds.len()
    }

    /// Descriptor of section `index`.
    #[inline]
    pub fn sed(&self, index: usize) -> &Sed {
        &self.seds[index]
    }

    /// Index of the section containing `cp`.
    pub fn section_index(&self, cp: u32) -> Option<usize> {
        if cp >= *self.a_cp.last()? {
            return None;
        }
        match self.a_cp.binary_search(&cp) {
            Ok(i) => Some(i),
            Err(0) => None,
            Err(i) => Some(i - 1),
        }
    }

    /// The last CP of the section containing `cp`: one before the
    /// smallest section limit greater than `cp`.
    pub fn last_cp_in_section(&self, cp: u32) -> Option<u32> {
        let index = self.section_index(cp)?;
        Some(self.a_cp[index + 1] - 1)
    }
}

impl Session {
    /// Character position of the last character of the paragraph
    /// containing `cp`.
    ///
    /// On success the paragraph's direct formatting (and the
    /// paragraph-level character defaults) have been resolved into the
    /// session state.
    pub fn last_cp_in_paragraph(&mut self, cp: u32) -> Result<u32> {
        let mut cp = cp;
        let mut i = self
            .pieces
            .piece_index(cp)
            .ok_or(DocError::OutOfRange(cp))?;

        loop {
            let pcd = *self.pieces.pcd(i);
            let mut fc_pcd = pcd.fc();
            let mut fc = fc_pcd + 2 * (cp - self.pieces.cp(i));
            let mut fc_mac = fc_pcd + 2 * (self.pieces.cp(i + 1) - self.pieces.cp(i));
            if pcd.is_compressed() {
                fc /= 2;
                fc_pcd /= 2;
                fc_mac /= 2;
            }

            // A bin table ending at or before fc means the paragraph end
            // lies in a later piece.
            if self.papx_bins.fc_last() > fc {
                let (_, pn) = self.papx_bins.lookup(fc).ok_or_else(|| {
                    DocError::Corrupted(format!("offset {fc} precedes the paragraph bin table"))
                })?;
                let fkp = self.papx_page(pn)?;
                let Some(k) = fkp.index_of(fc) else {
                    // The last rgfc entry bounds the valid document text.
                    return Err(DocError::OutOfRange(cp));
                };
                let fc_lim = fkp.rgfc[k + 1];
                if fc_lim <= fc_mac {
                    let dfc = if pcd.is_compressed() {
                        fc_lim - fc_pcd
                    } else {
                        (fc_lim - fc_pcd) / 2
                    };
                    let last = self.pieces.cp(i) + dfc - 1;
                    self.direct_paragraph_formatting(&fkp, k, &pcd);
                    return Ok(last);
                }
            }

            // The paragraph extends across the piece boundary.
            i += 1;
            if i >= self.pieces.count() {
                return Err(DocError::OutOfRange(cp));
            }
            cp = self.pieces.cp(i);
        }
    }

    /// Character position of the first character of the paragraph
    /// containing `cp`, found by searching backwards through the pieces.
    pub fn first_cp_in_paragraph(&mut self, cp: u32) -> Result<u32> {
        let mut cp = cp;
        let mut i = self
            .pieces
            .piece_index(cp)
            .ok_or(DocError::OutOfRange(cp))?;

        loop {
            let pcd = *self.pieces.pcd(i);
            let mut fc_pcd = pcd.fc();
            let mut fc = fc_pcd + 2 * (cp - self.pieces.cp(i));
            if pcd.is_compressed() {
                fc /= 2;
                fc_pcd /= 2;
            }

            let fc_last = self.papx_bins.fc_last();
            let fc_first = if fc_last <= fc {
                if fc_last < fc_pcd {
                    // No paragraph start recorded inside this piece.
                    if self.pieces.cp(i) == 0 || i == 0 {
                        return Ok(0);
                    }
                    cp = self.pieces.cp(i);
                    i -= 1;
                    continue;
                }
                if pcd.is_compressed() {
                    fc_last / 2
                } else {
                    fc_last
                }
            } else {
                let (_, pn) = self.papx_bins.lookup(fc).ok_or_else(|| {
                    DocError::Corrupted(format!("offset {fc} precedes the paragraph bin table"))
                })?;
                let fkp = self.papx_page(pn)?;
                let Some(k) = fkp.index_of(fc) else {
                    return Err(DocError::OutOfRange(cp));
                };
                fkp.rgfc[k]
            };

            if fc_first > fc_pcd {
                let mut dfc = fc_first - fc_pcd;
                if !pcd.is_compressed() {
                    dfc /= 2;
                }
                return Ok(self.pieces.cp(i) + dfc);
            }
            if self.pieces.cp(i) == 0 || i == 0 {
                return Ok(0);
            }
            cp = self.pieces.cp(i);
            i -= 1;
        }
    }

    /// Character position of the last character of the row containing
    /// `cp`.
    ///
    /// The end of a row is the end of its table-terminating paragraph.
    /// For a paragraph at inner depth, the scan walks paragraph by
    /// paragraph until one at the original depth carries the inner
    /// terminator mark.
    pub fn last_cp_in_row(&mut self, cp: u32) -> Result<u32> {
        let mut last = self.last_cp_in_paragraph(cp)?;
        if self.state.pap.itap <= 0 {
            return Ok(last);
        }
        if self.state.pap.ttp {
            return Ok(last);
        }
        let itap_orig = self.state.pap.itap;

        while last + 1 < self.fib.ccp.text {
            self.state.trp = Default::default();
            last = self.last_cp_in_paragraph(last + 1)?;
            if self.state.pap.ttp {
                return Ok(last);
            }
            if self.state.pap.itap == itap_orig && self.state.pap.ittp {
                return Ok(last);
            }
        }
        // A table left open at the end of the sub-document.
        Err(DocError::OutOfRange(cp))
    }

    /// Reset and recompose paragraph-scoped state from the style sheet,
    /// the paragraph's FKP record and the piece's property modifier.
    fn direct_paragraph_formatting(&mut self, fkp: &PapxFkp, k: usize, pcd: &Pcd) {
        self.state.pap = Pap::default();
        self.state.pap_chp = Chp::default();

        let (istd, grpprl) = match &fkp.entries[k] {
            Some(entry) => (entry.istd, Some(entry.grpprl.clone())),
            // A zero record offset means default properties.
            None => (0, None),
        };
        self.state.pap.istd = istd;

        let composer = Composer {
            styles: &self.styles,
            order: self.order,
        };
        composer.apply_style(&mut self.state, istd);
        if let Some(grpprl) = grpprl {
            for prl in parse_grpprl(&grpprl, self.order) {
                composer.apply_direct(&mut self.state, ChpLevel::ParagraphDefault, &prl);
            }
        }
        composer.apply_prm(
            &mut self.state,
            pcd.prm,
            ChpLevel::ParagraphDefault,
            SGC_PARAGRAPH,
        );
    }

    /// Reset and recompose section properties from the Sepx of section
    /// `index`.
    pub(crate) fn direct_section_formatting(&mut self, index: usize) -> Result<()> {
        self.state.sep = Sep::default();
        let Some(sections) = &self.sections else {
            return Ok(());
        };
        if index >= sections.count() {
            warn!(index, "no section descriptor at index");
            return Ok(());
        }
        let fc_sepx = sections.sed(index).fc_sepx;
        if fc_sepx == FC_SEPX_NIL {
            debug!(index, "section carries default properties");
            return Ok(());
        }

        let at = fc_sepx as usize;
        let cb = self.order.i16(&self.word_document, at)?;
        if cb <= 0 {
            warn!(index, cb, "empty or negative Sepx size; defaults kept");
            return Ok(());
        }
        let start = at + 2;
        let end = start + cb as usize;
        if end > self.word_document.len() {
            return Err(DocError::Corrupted(format!(
                "Sepx of section {index} overruns the main stream"
            )));
        }
        let grpprl = self.word_document[start..end].to_vec();
        let composer = Composer {
            styles: &self.styles,
            order: self.order,
        };
        for prl in parse_grpprl(&grpprl, self.order) {
            composer.apply_direct(&mut self.state, ChpLevel::ParagraphDefault, &prl);
        }
        Ok(())
    }
}
