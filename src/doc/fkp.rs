//! Formatted disk page (FKP) decoding.
//!
//! FKPs are fixed 512-byte pages in the `WordDocument` stream mapping
//! ranges of stream offsets to property records. A `PapxFkp` carries one
//! record per paragraph (style index plus grpprl), a `ChpxFkp` one grpprl
//! per character run. Pages are addressed by page number (`pn * 512`) and
//! cached in a small LRU.

use super::session::{DocError, Result};
use crate::common::binary::ByteOrder;
use bytes::Bytes;
use std::collections::HashMap;
use std::collections::VecDeque;

/// Size of an FKP page in bytes
pub const FKP_PAGE_SIZE: usize = 512;
/// Largest record count a page can carry
const FKP_MAX_COUNT: usize = 0x65;
/// Size of a BxPap entry: offset byte plus 12 reserved bytes
const BX_PAP_SIZE: usize = 13;

/// A paragraph property record inside a PapxFkp.
#[derive(Debug, Clone)]
pub struct PapxEntry {
    /// Style index of the paragraph
    pub istd: u16,
    /// Direct paragraph grpprl
    pub grpprl: Bytes,
}

/// Paragraph formatted disk page.
#[derive(Debug, Clone)]
pub struct PapxFkp {
    /// `cpara + 1` ascending stream offsets; the last one is the end of
    /// the final paragraph
    pub rgfc: Vec<u32>,
    /// One record per paragraph; `None` when the paragraph has default
    /// properties (BxPap offset of zero)
    pub entries: Vec<Option<PapxEntry>>,
}

impl PapxFkp {
    /// Parse a 512-byte page.
    pub fn parse(page: &[u8], order: ByteOrder) -> Result<Self> {
        let cpara = page_count(page)?;
        let rgfc = read_rgfc(page, cpara, order)?;

        let bx_base = (cpara + 1) * 4;
        let mut entries = Vec::with_capacity(cpara);
        for k in 0..cpara {
            let b_offset = page[bx_base + k * BX_PAP_SIZE] as usize;
            if b_offset == 0 {
                entries.push(None);
                continue;
            }
            let papx_at = b_offset * 2;
            if papx_at + 1 >= FKP_PAGE_SIZE {
                return Err(DocError::Corrupted("PapxInFkp offset out of page".into()));
            }
            // First byte cb: non-zero means the record is 2*cb-1 bytes;
            // zero defers to a second byte cb' for 2*cb' bytes.
            let cb = page[papx_at] as usize;
            let (size, body_at) = if cb != 0 {
                (2 * cb - 1, papx_at + 1)
            } else {
                let cb2 = page[papx_at + 1] as usize;
                if cb2 < 1 {
                    return Err(DocError::Corrupted(
                        "PapxInFkp secondary size must be at least 1".into(),
                    ));
                }
                (2 * cb2, papx_at + 2)
            };
            if size < 2 || body_at + size > FKP_PAGE_SIZE {
                return Err(DocError::Corrupted("PapxInFkp record out of page".into()));
            }
            let istd = order.u16(page, body_at)?;
            let grpprl = Bytes::copy_from_slice(&page[body_at + 2..body_at + size]);
            entries.push(Some(PapxEntry { istd, grpprl }));
        }

        Ok(PapxFkp { rgfc, entries })
    }

    /// Record count.
    #[inline]
    pub fn cpara(&self) -> usize {
        self.entries.len()
    }

    /// The largest `k` with `rgfc[k] <= fc`, or `None` when `fc` is not
    /// covered by this page.
    pub fn index_of(&self, fc: u32) -> Option<usize> {
        lower_bound(&self.rgfc, fc)
    }
}

/// Character formatted disk page.
#[derive(Debug, Clone)]
pub struct ChpxFkp {
    /// `crun + 1` ascending stream offsets
    pub rgfc: Vec<u32>,
    /// One grpprl per run; empty when the run has no direct formatting
    pub entries: Vec<Bytes>,
}

impl ChpxFkp {
    /// Parse a 512-byte page.
    pub fn parse(page: &[u8], order: ByteOrder) -> Result<Self> {
        let crun = page_count(page)?;
        let rgfc = read_rgfc(page, crun, order)?;

        let rgb_base = (crun + 1) * 4;
        let mut entries = Vec::with_capacity(crun);
        for j in 0..crun {
            let half_offset = page[rgb_base + j] as usize;
            if half_offset == 0 {
                entries.push(Bytes::new());
                continue;
            }
            let chpx_at = half_offset * 2;
            if chpx_at >= FKP_PAGE_SIZE {
                return Err(DocError::Corrupted("Chpx offset out of page".into()));
            }
            let cb = page[chpx_at] as usize;
            if chpx_at + 1 + cb > FKP_PAGE_SIZE {
                return Err(DocError::Corrupted("Chpx record out of page".into()));
            }
            entries.push(Bytes::copy_from_slice(
                &page[chpx_at + 1..chpx_at + 1 + cb],
            ));
        }

        Ok(ChpxFkp { rgfc, entries })
    }

    /// Record count.
    #[inline]
    pub fn crun(&self) -> usize {
        self.entries.len()
    }

    /// The largest `j` with `rgfc[j] <= fc`, or `None` when `fc` is not
    /// covered by this page.
    pub fn index_of(&self, fc: u32) -> Option<usize> {
        lower_bound(&self.rgfc, fc)
    }
}

fn page_count(page: &[u8]) -> Result<usize> {
    if page.len() != FKP_PAGE_SIZE {
        return Err(DocError::Corrupted(format!(
            "FKP page is {} bytes, expected {FKP_PAGE_SIZE}",
            page.len()
        )));
    }
    let count = page[FKP_PAGE_SIZE - 1] as usize;
    if count == 0 || count > FKP_MAX_COUNT {
        return Err(DocError::Corrupted(format!(
            "FKP record count {count} out of range"
        )));
    }
    Ok(count)
}

fn read_rgfc(page: &[u8], count: usize, order: ByteOrder) -> Result<Vec<u32>> {
    let mut rgfc = Vec::with_capacity(count + 1);
    for i in 0..=count {
        rgfc.push(order.u32(page, i * 4)?);
    }
    for window in rgfc.windows(2) {
        if window[0] >= window[1] {
            return Err(DocError::Corrupted(
                "FKP offsets are not strictly ascending".to_string(),
            ));
        }
    }
    Ok(rgfc)
}

fn lower_bound(rgfc: &[u32], fc: u32) -> Option<usize> {
    if fc >= *rgfc.last()? {
        return None;
    }
    match rgfc.binary_search(&fc) {
        Ok(i) => Some(i),
        Err(0) => None,
        Err(i) => Some(i - 1),
    }
}

/// A small least-recently-used cache of decoded FKP pages.
///
/// Pages are keyed by page number; memory stays bounded by
/// `capacity * 512` regardless of document size.
#[derive(Debug)]
pub struct FkpCache<T> {
    map: HashMap<u32, T>,
    order: VecDeque<u32>,
    capacity: usize,
}

impl<T: Clone> FkpCache<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Fetch the page `pn`, decoding it through `load` on a miss.
    pub fn get_or_insert(
        &mut self,
        pn: u32,
        load: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        if let Some(hit) = self.map.get(&pn) {
            let hit = hit.clone();
            self.touch(pn);
            return Ok(hit);
        }
        let value = load()?;
        if self.map.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.map.remove(&evicted);
            }
        }
        self.map.insert(pn, value.clone());
        self.order.push_back(pn);
        Ok(value)
    }

    fn touch(&mut self, pn: u32) {
        if let Some(pos) = self.order.iter().position(|&p| p == pn) {
            self.order.remove(pos);
            self.order.push_back(pn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_page() -> Vec<u8> {
        vec![0u8; FKP_PAGE_SIZE]
    }

    #[test]
    fn test_page_size_validation() {
        assert!(ChpxFkp::parse(&[0u8; 100], ByteOrder::Little).is_err());
        assert!(PapxFkp::parse(&[0u8; 1000], ByteOrder::Little).is_err());
    }

    #[test]
    fn test_count_validation() {
        let mut page = empty_page();
        page[511] = 0;
        assert!(ChpxFkp::parse(&page, ByteOrder::Little).is_err());
        page[511] = 0x66;
        assert!(ChpxFkp::parse(&page, ByteOrder::Little).is_err());
    }

    #[test]
    fn test_chpx_parse() {
        let mut page = empty_page();
        page[511] = 2;
        page[0..4].copy_from_slice(&0x400u32.to_le_bytes());
        page[4..8].copy_from_slice(&0x410u32.to_le_bytes());
        page[8..12].copy_from_slice(&0x420u32.to_le_bytes());
        // rgb: run 0 at offset 200, run 1 without direct formatting
        page[12] = 100;
        page[13] = 0;
        page[200] = 3; // cb
        page[201..204].copy_from_slice(&[0x35, 0x08, 0x01]);

        let fkp = ChpxFkp::parse(&page, ByteOrder::Little).unwrap();
        assert_eq!(fkp.crun(), 2);
        assert_eq!(fkp.entries[0].as_ref(), &[0x35, 0x08, 0x01]);
        assert!(fkp.entries[1].is_empty());
        assert_eq!(fkp.index_of(0x400), Some(0));
        assert_eq!(fkp.index_of(0x415), Some(1));
        assert_eq!(fkp.index_of(0x420), None);
        assert_eq!(fkp.index_of(0x3FF), None);
    }

    #[test]
    fn test_papx_parse_nonzero_cb() {
        let mut page = empty_page();
        page[511] = 1;
        page[0..4].copy_from_slice(&0x400u32.to_le_bytes());
        page[4..8].copy_from_slice(&0x440u32.to_le_bytes());
        // BxPap at offset 8: record at byte 200
        page[8] = 100;
        // cb = 4 -> record of 2*4-1 = 7 bytes: istd + 5 grpprl bytes
        page[200] = 4;
        page[201..203].copy_from_slice(&5u16.to_le_bytes());
        page[203..208].copy_from_slice(&[0x16, 0x24, 0x01, 0x00, 0x00]);

        let fkp = PapxFkp::parse(&page, ByteOrder::Little).unwrap();
        assert_eq!(fkp.cpara(), 1);
        let entry = fkp.entries[0].as_ref().unwrap();
        assert_eq!(entry.istd, 5);
        assert_eq!(entry.grpprl.as_ref(), &[0x16, 0x24, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_papx_parse_zero_cb() {
        let mut page = empty_page();
        page[511] = 1;
        page[0..4].copy_from_slice(&0x400u32.to_le_bytes());
        page[4..8].copy_from_slice(&0x440u32.to_le_bytes());
        page[8] = 100;
        // cb = 0, cb' = 3 -> record of 6 bytes: istd + 4 grpprl bytes
        page[200] = 0;
        page[201] = 3;
        page[202..204].copy_from_slice(&2u16.to_le_bytes());
        page[204..208].copy_from_slice(&[0x03, 0x24, 0x01, 0x00]);

        let fkp = PapxFkp::parse(&page, ByteOrder::Little).unwrap();
        let entry = fkp.entries[0].as_ref().unwrap();
        assert_eq!(entry.istd, 2);
        assert_eq!(entry.grpprl.as_ref(), &[0x03, 0x24, 0x01, 0x00]);
    }

    #[test]
    fn test_papx_default_entry() {
        let mut page = empty_page();
        page[511] = 1;
        page[0..4].copy_from_slice(&0x400u32.to_le_bytes());
        page[4..8].copy_from_slice(&0x440u32.to_le_bytes());
        page[8] = 0; // no PapxInFkp

        let fkp = PapxFkp::parse(&page, ByteOrder::Little).unwrap();
        assert!(fkp.entries[0].is_none());
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache: FkpCache<u32> = FkpCache::new(2);
        cache.get_or_insert(1, || Ok(10)).unwrap();
        cache.get_or_insert(2, || Ok(20)).unwrap();
        // touch 1 so 2 becomes the eviction candidate
        cache.get_or_insert(1, || panic!("must hit")).unwrap();
        cache.get_or_insert(3, || Ok(30)).unwrap();
        assert_eq!(cache.get_or_insert(1, || panic!("must hit")).unwrap(), 10);
        let mut loaded = false;
        cache
            .get_or_insert(2, || {
                loaded = true;
                Ok(20)
            })
            .unwrap();
        assert!(loaded, "page 2 should have been evicted");
    }
}
