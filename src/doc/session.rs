//! Decoder session: stream ownership, character retrieval and the driver
//! loop.
//!
//! A session owns the container streams and the decoded lookup tables.
//! [`Session::run`] makes a single pass over the character positions of
//! the main document, the footnotes and the headers, resolving effective
//! formatting for every position and emitting exactly one event per CP to
//! the caller's sink. Sessions are single-threaded and not re-entrant;
//! the exclusive borrow held during a run enforces both.

use super::apply::{ChpLevel, Composer};
use super::bin_table::BinTable;
use super::boundaries::SectionTable;
use super::events::{Completion, DocEvent, EventSink, SinkFlow};
use super::fib::Fib;
use super::fkp::{ChpxFkp, FKP_PAGE_SIZE, FkpCache, PapxFkp};
use super::piece_table::{Pcd, PieceTable};
use super::picture::Picture;
use super::properties::{PropertyState, Tcp, Trp};
use super::sprm::parse_grpprl;
use super::sprm_ids::SGC_CHARACTER;
use super::stylesheet::StyleSheet;
use super::text::{Utf16Unit, decode_compressed, decode_utf16_unit};
use crate::common::binary::{BinaryError, ByteOrder};
use crate::ole::{OleError, OleFile};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{debug, warn};

/// Error type for the document decoder.
#[derive(Debug, thiserror::Error)]
pub enum DocError {
    /// Container-level failure
    #[error("container error: {0}")]
    Ole(#[from] OleError),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The WordDocument stream does not start with the FIB signature
    #[error("not a Word binary document (wIdent 0x{0:04X})")]
    NotAWordDocument(u16),
    /// A header field violates the format
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    /// A structure is damaged beyond recovery
    #[error("corrupted file: {0}")]
    Corrupted(String),
    /// The document requires features the decoder does not provide
    #[error("unsupported document: {0}")]
    Unsupported(String),
    /// A character position outside the document was requested
    #[error("character position {0} out of range")]
    OutOfRange(u32),
}

impl From<BinaryError> for DocError {
    fn from(err: BinaryError) -> Self {
        DocError::Corrupted(err.to_string())
    }
}

/// Result type for decoder operations.
pub type Result<T> = std::result::Result<T, DocError>;

/// Number of FKP pages each cache retains
const FKP_CACHE_PAGES: usize = 32;

/// The sub-document a traversal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubDocument {
    Main,
    Footnotes,
    Headers,
}

/// An open decoding session over one document.
#[derive(Debug)]
pub struct Session {
    pub(crate) order: ByteOrder,
    pub(crate) word_document: Vec<u8>,
    pub(crate) data_stream: Option<Vec<u8>>,
    pub(crate) fib: Fib,
    pub(crate) pieces: PieceTable,
    pub(crate) papx_bins: BinTable,
    pub(crate) chpx_bins: BinTable,
    pub(crate) styles: StyleSheet,
    pub(crate) sections: Option<SectionTable>,
    pub(crate) papx_cache: FkpCache<PapxFkp>,
    pub(crate) chpx_cache: FkpCache<ChpxFkp>,
    pub(crate) state: PropertyState,
    current_section: Option<usize>,
}

impl Session {
    /// Open a document from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    /// Open a document from any seekable reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut ole = OleFile::open(reader)?;
        let order = ole.byte_order();

        let word_document = ole.open_stream("WordDocument")?;
        let fib = Fib::parse(&word_document, order)?;
        if fib.is_encrypted() {
            return Err(DocError::Unsupported(
                "encrypted or obfuscated document".to_string(),
            ));
        }

        let table_name = if fib.which_table_stream() {
            "1Table"
        } else {
            "0Table"
        };
        let table = ole.open_stream(table_name)?;
        let data_stream = match ole.open_stream("Data") {
            Ok(data) => Some(data),
            Err(OleError::StreamNotFound(_)) => None,
            Err(err) => return Err(err.into()),
        };

        let clx = region(&table, fib.clx().fc, fib.clx().lcb, "CLX")?;
        let pieces = PieceTable::parse(clx, fib.last_cp(), order)?;

        let papx_region = region(
            &table,
            fib.plcf_bte_papx().fc,
            fib.plcf_bte_papx().lcb,
            "PlcBtePapx",
        )?;
        let papx_bins = BinTable::parse(papx_region, order)?;
        let chpx_region = region(
            &table,
            fib.plcf_bte_chpx().fc,
            fib.plcf_bte_chpx().lcb,
            "PlcBteChpx",
        )?;
        let chpx_bins = BinTable::parse(chpx_region, order)?;

        let styles = if fib.stshf().is_present() {
            let stsh = region(&table, fib.stshf().fc, fib.stshf().lcb, "STSH")?;
            StyleSheet::parse(stsh, order)?
        } else {
            warn!("document carries no style sheet; styles contribute nothing");
            StyleSheet::default()
        };

        let sections = if fib.plcf_sed().is_present() {
            let sed = region(&table, fib.plcf_sed().fc, fib.plcf_sed().lcb, "PlcfSed")?;
            Some(SectionTable::parse(sed, order)?)
        } else {
            None
        };

        Ok(Session {
            order,
            word_document,
            data_stream,
            fib,
            pieces,
            papx_bins,
            chpx_bins,
            styles,
            sections,
            papx_cache: FkpCache::new(FKP_CACHE_PAGES),
            chpx_cache: FkpCache::new(FKP_CACHE_PAGES),
            state: PropertyState::default(),
            current_section: None,
        })
    }

    /// The parsed File Information Block.
    #[inline]
    pub fn fib(&self) -> &Fib {
        &self.fib
    }

    /// The composed property state as of the last emitted event.
    #[inline]
    pub fn state(&self) -> &PropertyState {
        &self.state
    }

    /// Byte order of the document.
    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Emit the whole document to `sink`: main body, then footnotes, then
    /// headers. Events arrive in ascending CP order within each
    /// sub-document.
    pub fn run<S: EventSink>(&mut self, sink: &mut S) -> Result<Completion> {
        let main_end = self.fib.ccp.text;
        let ftn_end = main_end + self.fib.ccp.footnotes;
        let hdd_end = ftn_end + self.fib.ccp.headers;

        for (start, end, which) in [
            (0, main_end, SubDocument::Main),
            (main_end, ftn_end, SubDocument::Footnotes),
            (ftn_end, hdd_end, SubDocument::Headers),
        ] {
            if self.traverse(start, end, which, sink)? == SinkFlow::Stop {
                return Ok(Completion::Cancelled);
            }
        }
        Ok(Completion::Finished)
    }

    fn traverse<S: EventSink>(
        &mut self,
        start: u32,
        end: u32,
        which: SubDocument,
        sink: &mut S,
    ) -> Result<SinkFlow> {
        let mut cp = start;
        while cp < end {
            // Resolves paragraph and paragraph-level character
            // properties as a side effect.
            let last = self.last_cp_in_paragraph(cp)?;
            if last < cp {
                return Err(DocError::Corrupted(format!(
                    "paragraph end {last} precedes its start {cp}"
                )));
            }
            self.refresh_section(cp)?;

            while cp <= last && cp < end {
                if let Some(event) = self.event_for_cp(cp)? {
                    let flow = match which {
                        SubDocument::Main => sink.main_document(&self.state, event),
                        SubDocument::Footnotes => sink.footnotes(&self.state, event),
                        SubDocument::Headers => sink.headers(&self.state, event),
                    };
                    if flow == SinkFlow::Stop {
                        return Ok(SinkFlow::Stop);
                    }
                }
                cp += 1;
            }

            // Row-scoped state dies with the row-terminating paragraph.
            if self.state.pap.ttp {
                self.state.trp = Trp::default();
                self.state.tcp = Tcp::default();
            }
        }
        Ok(SinkFlow::Continue)
    }

    /// Retrieve and decode the character at `cp`, resolving its effective
    /// character formatting first. Returns `None` for a byte order mark.
    pub(crate) fn event_for_cp(&mut self, cp: u32) -> Result<Option<DocEvent>> {
        let i = self
            .pieces
            .piece_index(cp)
            .ok_or(DocError::OutOfRange(cp))?;
        let pcd = *self.pieces.pcd(i);
        let offset = self.pieces.offset_of(i, cp) as usize;

        self.direct_character_formatting(offset as u32, &pcd)?;
        self.state.chp.cp = cp;

        if pcd.is_compressed() {
            let byte = *self.word_document.get(offset).ok_or_else(|| {
                DocError::Corrupted(format!("text offset {offset} outside the main stream"))
            })?;
            Ok(Some(DocEvent::from_codepoint(decode_compressed(byte))))
        } else {
            let unit = self.order.u16(&self.word_document, offset)?;
            Ok(match decode_utf16_unit(unit) {
                Utf16Unit::Bom => None,
                Utf16Unit::Control(value) => Some(DocEvent::from_codepoint(value as u32)),
                Utf16Unit::Codepoint(value) => Some(DocEvent::from_codepoint(value)),
            })
        }
    }

    /// Reset the run CHP from the paragraph defaults and fold in the
    /// direct character formatting covering the byte offset `fc`.
    fn direct_character_formatting(&mut self, fc: u32, pcd: &Pcd) -> Result<()> {
        let defaults = self.state.pap_chp.clone();
        self.state.chp.reset_from(&defaults);

        let Some((_, pn)) = self.chpx_bins.lookup(fc) else {
            debug!(fc, "no character bin table entry; defaults kept");
            return Ok(());
        };
        let fkp = self.chpx_page(pn)?;
        let Some(j) = fkp.index_of(fc) else {
            debug!(fc, "offset not covered by its ChpxFkp; defaults kept");
            return Ok(());
        };

        let grpprl = fkp.entries[j].clone();
        let composer = Composer {
            styles: &self.styles,
            order: self.order,
        };
        for prl in parse_grpprl(&grpprl, self.order) {
            composer.apply_direct(&mut self.state, ChpLevel::Run, &prl);
        }
        composer.apply_prm(&mut self.state, pcd.prm, ChpLevel::Run, SGC_CHARACTER);
        Ok(())
    }

    /// Refresh the section properties when `cp` has crossed into another
    /// section.
    fn refresh_section(&mut self, cp: u32) -> Result<()> {
        let Some(sections) = &self.sections else {
            return Ok(());
        };
        let Some(index) = sections.section_index(cp) else {
            return Ok(());
        };
        if self.current_section == Some(index) {
            return Ok(());
        }
        self.current_section = Some(index);
        self.direct_section_formatting(index)
    }

    /// Load and decode the paragraph FKP page `pn`.
    pub(crate) fn papx_page(&mut self, pn: u32) -> Result<PapxFkp> {
        let order = self.order;
        let word_document = &self.word_document;
        self.papx_cache.get_or_insert(pn, || {
            PapxFkp::parse(page_slice(word_document, pn)?, order)
        })
    }

    /// Load and decode the character FKP page `pn`.
    pub(crate) fn chpx_page(&mut self, pn: u32) -> Result<ChpxFkp> {
        let order = self.order;
        let word_document = &self.word_document;
        self.chpx_cache.get_or_insert(pn, || {
            ChpxFkp::parse(page_slice(word_document, pn)?, order)
        })
    }

    /// Pull the inline picture anchored at the current character, if any.
    ///
    /// Valid after an [`DocEvent::Control`] carrying an inline picture
    /// anchor; the CHP must mark the run as special and point into the
    /// `Data` stream. Anchors whose location addresses form-field data
    /// yield `None`.
    pub fn inline_picture(&self) -> Result<Option<Picture<'_>>> {
        let chp = &self.state.chp;
        if !chp.f_spec || chp.f_data || chp.f_obj {
            return Ok(None);
        }
        let Some(location) = chp.pic_location else {
            return Ok(None);
        };
        let Some(data_stream) = &self.data_stream else {
            return Err(DocError::Corrupted(
                "picture anchor without a Data stream".to_string(),
            ));
        };
        Picture::read(data_stream, location, self.order).map(Some)
    }
}

/// Slice a (fc, lcb) region out of a stream.
fn region<'a>(stream: &'a [u8], fc: u32, lcb: u32, what: &str) -> Result<&'a [u8]> {
    if lcb == 0 {
        return Err(DocError::Corrupted(format!("required region {what} absent")));
    }
    let start = fc as usize;
    let end = start + lcb as usize;
    if end > stream.len() {
        return Err(DocError::Corrupted(format!(
            "{what} region [{start}, {end}) overruns its stream"
        )));
    }
    Ok(&stream[start..end])
}

/// Slice a 512-byte FKP page out of the main stream.
fn page_slice(word_document: &[u8], pn: u32) -> Result<&[u8]> {
    let start = pn as usize * FKP_PAGE_SIZE;
    let end = start + FKP_PAGE_SIZE;
    if end > word_document.len() {
        return Err(DocError::Corrupted(format!(
            "FKP page {pn} outside the main stream"
        )));
    }
    Ok(&word_document[start..end])
}

/// Parse a document and feed every event to `sink`.
///
/// Convenience wrapper over [`Session::open`] and [`Session::run`].
pub fn parse<P: AsRef<Path>, S: EventSink>(path: P, sink: &mut S) -> Result<Completion> {
    let mut session = Session::open(path)?;
    session.run(sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_bounds() {
        let stream = [0u8; 32];
        assert!(region(&stream, 0, 16, "x").is_ok());
        assert!(region(&stream, 16, 16, "x").is_ok());
        assert!(region(&stream, 17, 16, "x").is_err());
        assert!(region(&stream, 0, 0, "x").is_err());
    }

    #[test]
    fn test_page_slice_bounds() {
        let stream = vec![0u8; FKP_PAGE_SIZE * 2];
        assert!(page_slice(&stream, 0).is_ok());
        assert!(page_slice(&stream, 1).is_ok());
        assert!(page_slice(&stream, 2).is_err());
    }
}
