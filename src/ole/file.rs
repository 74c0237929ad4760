//! OLE2 structured storage reader.
//!
//! A compound file stores its streams on 512-byte (or 4096-byte) sectors
//! chained through a File Allocation Table; streams smaller than the mini
//! stream cutoff live on 64-byte mini sectors inside a dedicated ministream.
//! One root directory enumerates every named stream.
//!
//! The reader is read-only and eager: a stream is reconstructed into a
//! contiguous buffer by walking its sector chain once. Byte order is
//! detected from the header BOM and applied to every multi-byte field in
//! the container and in all document structures derived from it.

use super::consts::*;
use crate::common::binary::ByteOrder;
use fixedbitset::FixedBitSet;
use smallvec::SmallVec;
use std::io::{self, Read, Seek, SeekFrom};
use tracing::warn;

/// Error type for the container layer.
#[derive(Debug, thiserror::Error)]
pub enum OleError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("not an OLE compound file")]
    NotOleFile,
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("corrupted file: {0}")]
    Corrupted(String),
    #[error("stream not found: {0}")]
    StreamNotFound(String),
}

/// A single directory entry (stream or storage).
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    /// Entry name (UTF-16 decoded)
    pub name: String,
    /// Entry type (stream, storage, root)
    pub entry_type: u8,
    /// Left sibling in the red-black tree
    pub sid_left: u32,
    /// Right sibling in the red-black tree
    pub sid_right: u32,
    /// First child
    pub sid_child: u32,
    /// First sector of the stream
    pub start_sector: u32,
    /// Stream size in bytes
    pub size: u64,
    /// Whether the stream lives in the ministream
    pub is_minifat: bool,
}

/// Read-only OLE2 compound file.
pub struct OleFile<R: Read + Seek> {
    reader: R,
    order: ByteOrder,
    sector_size: usize,
    mini_sector_size: usize,
    mini_stream_cutoff: u32,
    fat: Vec<u32>,
    minifat: Vec<u32>,
    entries: Vec<Option<DirectoryEntry>>,
    root_child: u32,
    root_start_sector: u32,
    ministream: Option<Vec<u8>>,
}

impl<R: Read + Seek> OleFile<R> {
    /// Open a compound file and index its directory.
    pub fn open(mut reader: R) -> Result<Self, OleError> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        if file_size < MINIMAL_OLEFILE_SIZE as u64 {
            return Err(OleError::NotOleFile);
        }

        let mut header = [0u8; 512];
        reader.read_exact(&mut header)?;
        if &header[0..8] != MAGIC {
            return Err(OleError::NotOleFile);
        }

        // The BOM field decides how every other header field is read.
        let order = match crate::common::binary::read_u16_le(&header, 0x1C).unwrap_or(0) {
            BOM_LITTLE => ByteOrder::Little,
            BOM_BIG => ByteOrder::Big,
            other => {
                return Err(OleError::InvalidFormat(format!(
                    "unrecognised byte order mark 0x{other:04X}"
                )));
            }
        };

        let rd16 = |off| order.u16(&header, off).unwrap_or(0);
        let rd32 = |off| order.u32(&header, off).unwrap_or(0);

        let dll_version = rd16(0x1A);
        let sector_shift = rd16(0x1E);
        let mini_sector_shift = rd16(0x20);
        let first_dir_sector = rd32(0x30);
        let mini_stream_cutoff = rd32(0x38);
        let first_minifat_sector = rd32(0x3C);
        let num_minifat_sectors = rd32(0x40);
        let first_difat_sector = rd32(0x44);
        let num_difat_sectors = rd32(0x48);

        if sector_shift > 15 || mini_sector_shift > 15 {
            return Err(OleError::InvalidFormat("sector shift out of range".into()));
        }
        let sector_size = 1usize << sector_shift;
        let mini_sector_size = 1usize << mini_sector_shift;
        if (dll_version == 3 && sector_size != 512) || (dll_version == 4 && sector_size != 4096) {
            return Err(OleError::InvalidFormat(
                "sector size does not match major version".into(),
            ));
        }

        let mut ole = OleFile {
            reader,
            order,
            sector_size,
            mini_sector_size,
            mini_stream_cutoff,
            fat: Vec::new(),
            minifat: Vec::new(),
            entries: Vec::new(),
            root_child: NOSTREAM,
            root_start_sector: ENDOFCHAIN,
            ministream: None,
        };

        ole.load_fat(&header, first_difat_sector, num_difat_sectors)?;
        ole.load_directory(first_dir_sector)?;
        if num_minifat_sectors > 0 {
            ole.load_minifat(first_minifat_sector)?;
        }
        Ok(ole)
    }

    /// Byte order detected from the container header.
    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Check whether a root-level stream exists.
    pub fn exists(&self, name: &str) -> bool {
        self.find_entry(name).is_ok()
    }

    /// Names of all streams in the file (diagnostics).
    pub fn stream_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .flatten()
            .filter(|e| e.entry_type == STGTY_STREAM)
            .map(|e| e.name.clone())
            .collect()
    }

    /// Read an entire root-level stream into memory.
    pub fn open_stream(&mut self, name: &str) -> Result<Vec<u8>, OleError> {
        let (is_minifat, start_sector, size) = {
            let entry = self.find_entry(name)?;
            if entry.entry_type != STGTY_STREAM {
                return Err(OleError::InvalidFormat(format!("{name} is not a stream")));
            }
            (entry.is_minifat, entry.start_sector, entry.size)
        };
        if is_minifat {
            self.read_ministream_chain(start_sector, size)
        } else {
            let mut data = self.read_fat_chain(start_sector)?;
            data.truncate(size as usize);
            Ok(data)
        }
    }

    /// Build the FAT from the header DIFAT and any DIFAT sectors.
    fn load_fat(
        &mut self,
        header: &[u8; 512],
        first_difat_sector: u32,
        num_difat_sectors: u32,
    ) -> Result<(), OleError> {
        let mut fat_sectors = Vec::new();
        for i in 0..109 {
            let sector = self.order.u32(header, 0x4C + i * 4).unwrap_or(FREESECT);
            if sector == FREESECT || sector == ENDOFCHAIN {
                break;
            }
            fat_sectors.push(sector);
        }

        let entries_per_difat = self.sector_size / 4 - 1;
        let mut difat_sector = first_difat_sector;
        for _ in 0..num_difat_sectors {
            if difat_sector == ENDOFCHAIN || difat_sector == FREESECT {
                break;
            }
            let data = self.read_sector(difat_sector)?;
            for i in 0..entries_per_difat {
                let sector = self.order.u32(&data, i * 4).unwrap_or(FREESECT);
                if sector == FREESECT || sector == ENDOFCHAIN {
                    break;
                }
                fat_sectors.push(sector);
            }
            difat_sector = self
                .order
                .u32(&data, entries_per_difat * 4)
                .unwrap_or(ENDOFCHAIN);
        }

        let entries_per_sector = self.sector_size / 4;
        self.fat = Vec::with_capacity(fat_sectors.len() * entries_per_sector);
        for &sector_id in &fat_sectors {
            let data = self.read_sector(sector_id)?;
            for i in 0..entries_per_sector {
                self.fat.push(self.order.u32(&data, i * 4).unwrap_or(0));
            }
        }
        Ok(())
    }

    fn load_minifat(&mut self, first_minifat_sector: u32) -> Result<(), OleError> {
        let data = self.read_fat_chain(first_minifat_sector)?;
        self.minifat = Vec::with_capacity(data.len() / 4);
        for i in 0..data.len() / 4 {
            self.minifat.push(self.order.u32(&data, i * 4).unwrap_or(0));
        }
        Ok(())
    }

    /// Parse the directory stream and index every reachable entry.
    fn load_directory(&mut self, first_dir_sector: u32) -> Result<(), OleError> {
        let dir_data = self.read_fat_chain(first_dir_sector)?;
        let num_entries = dir_data.len() / DIRENTRY_SIZE;
        if num_entries == 0 {
            return Err(OleError::Corrupted("empty directory".into()));
        }
        self.entries = vec![None; num_entries];

        let root = self.parse_directory_entry(&dir_data[..DIRENTRY_SIZE])?;
        if root.entry_type != STGTY_ROOT {
            return Err(OleError::Corrupted("first directory entry is not root".into()));
        }
        self.root_child = root.sid_child;
        self.root_start_sector = root.start_sector;
        self.entries[0] = Some(root);

        // Iterative traversal with a visited set guards against sibling
        // cycles in damaged directories.
        let mut queue: SmallVec<[u32; 32]> = SmallVec::new();
        queue.push(self.root_child);
        let mut visited = FixedBitSet::with_capacity(num_entries);
        while let Some(sid) = queue.pop() {
            if sid == NOSTREAM {
                continue;
            }
            let idx = sid as usize;
            if idx >= num_entries {
                return Err(OleError::Corrupted("directory SID out of range".into()));
            }
            if visited.contains(idx) {
                continue;
            }
            visited.insert(idx);
            let offset = idx * DIRENTRY_SIZE;
            let entry = self.parse_directory_entry(&dir_data[offset..offset + DIRENTRY_SIZE])?;
            queue.push(entry.sid_child);
            queue.push(entry.sid_right);
            queue.push(entry.sid_left);
            self.entries[idx] = Some(entry);
        }
        Ok(())
    }

    fn parse_directory_entry(&self, data: &[u8]) -> Result<DirectoryEntry, OleError> {
        let rd16 = |off| self.order.u16(data, off).unwrap_or(0);
        let rd32 = |off| self.order.u32(data, off).unwrap_or(0);

        let name_len = rd16(64) as usize;
        // name_len counts bytes including the UTF-16 null terminator
        let name_units = name_len.saturating_sub(2).min(64) / 2;
        let name = crate::common::binary::utf16_string(data, 0, name_units, self.order);

        let entry_type = data[66];
        let size_raw = self.order.u64(data, 0x78).unwrap_or(0);
        // With 512-byte sectors only the low half of the size field is valid.
        let size = if self.sector_size == 512 {
            size_raw & 0xFFFF_FFFF
        } else {
            size_raw
        };

        let is_minifat = entry_type == STGTY_STREAM && size < self.mini_stream_cutoff as u64;
        Ok(DirectoryEntry {
            name,
            entry_type,
            sid_left: rd32(68),
            sid_right: rd32(72),
            sid_child: rd32(76),
            start_sector: rd32(0x74),
            size,
            is_minifat,
        })
    }

    fn read_sector(&mut self, sector_id: u32) -> Result<Vec<u8>, OleError> {
        let position = (sector_id as u64 + 1) * self.sector_size as u64;
        self.reader.seek(SeekFrom::Start(position))?;
        let mut buffer = vec![0u8; self.sector_size];
        self.reader.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Follow a FAT chain, batching contiguous sectors into single reads.
    fn read_fat_chain(&mut self, start_sector: u32) -> Result<Vec<u8>, OleError> {
        if start_sector == ENDOFCHAIN {
            return Ok(Vec::new());
        }
        let mut sectors = Vec::new();
        let mut sector = start_sector;
        while sector != ENDOFCHAIN {
            if sector as usize >= self.fat.len() {
                return Err(OleError::Corrupted("sector index outside FAT".into()));
            }
            if sectors.len() > self.fat.len() {
                return Err(OleError::Corrupted("cycle in FAT chain".into()));
            }
            sectors.push(sector);
            sector = self.fat[sector as usize];
        }

        let mut data = vec![0u8; sectors.len() * self.sector_size];
        let mut i = 0;
        while i < sectors.len() {
            let mut count = 1;
            while i + count < sectors.len() && sectors[i + count] == sectors[i + count - 1] + 1 {
                count += 1;
            }
            let position = (sectors[i] as u64 + 1) * self.sector_size as u64;
            let start = i * self.sector_size;
            self.reader.seek(SeekFrom::Start(position))?;
            self.reader
                .read_exact(&mut data[start..start + count * self.sector_size])?;
            i += count;
        }
        Ok(data)
    }

    fn read_ministream_chain(&mut self, start_sector: u32, size: u64) -> Result<Vec<u8>, OleError> {
        if self.ministream.is_none() {
            let data = self.read_fat_chain(self.root_start_sector)?;
            self.ministream = Some(data);
        }
        let ministream = self.ministream.as_ref().unwrap();

        let mut data = Vec::with_capacity(size as usize);
        let mut sector = start_sector;
        let mut hops = 0usize;
        while sector != ENDOFCHAIN {
            if sector as usize >= self.minifat.len() || hops > self.minifat.len() {
                return Err(OleError::Corrupted("bad MiniFAT chain".into()));
            }
            let position = sector as usize * self.mini_sector_size;
            if position + self.mini_sector_size > ministream.len() {
                return Err(OleError::Corrupted("mini sector out of bounds".into()));
            }
            data.extend_from_slice(&ministream[position..position + self.mini_sector_size]);
            sector = self.minifat[sector as usize];
            hops += 1;
        }
        data.truncate(size as usize);
        Ok(data)
    }

    /// Find a root-level entry by name (case-insensitive, as written by Word).
    fn find_entry(&self, name: &str) -> Result<&DirectoryEntry, OleError> {
        let mut queue: SmallVec<[u32; 32]> = SmallVec::new();
        queue.push(self.root_child);
        let mut hops = 0usize;
        while let Some(sid) = queue.pop() {
            if sid == NOSTREAM || sid as usize >= self.entries.len() {
                continue;
            }
            hops += 1;
            if hops > self.entries.len() {
                warn!("directory sibling cycle while searching for {name}");
                break;
            }
            let Some(entry) = self.entries[sid as usize].as_ref() else {
                continue;
            };
            if entry.name.eq_ignore_ascii_case(name) {
                return Ok(entry);
            }
            queue.push(entry.sid_right);
            queue.push(entry.sid_left);
        }
        Err(OleError::StreamNotFound(name.to_string()))
    }
}

/// Check whether a buffer starts with the compound file magic.
pub fn is_ole_file(data: &[u8]) -> bool {
    data.len() >= MINIMAL_OLEFILE_SIZE && &data[0..8] == MAGIC
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_too_small() {
        let result = OleFile::open(Cursor::new(vec![0u8; 100]));
        assert!(matches!(result, Err(OleError::NotOleFile)));
    }

    #[test]
    fn test_bad_magic() {
        let mut data = vec![0u8; 2048];
        data[0] = 0xFF;
        let result = OleFile::open(Cursor::new(data));
        assert!(matches!(result, Err(OleError::NotOleFile)));
    }

    #[test]
    fn test_bad_byte_order_mark() {
        let mut data = vec![0u8; 2048];
        data[..8].copy_from_slice(MAGIC);
        data[0x1C] = 0x12;
        data[0x1D] = 0x34;
        let result = OleFile::open(Cursor::new(data));
        assert!(matches!(result, Err(OleError::InvalidFormat(_))));
    }

    #[test]
    fn test_is_ole_file() {
        let mut data = vec![0u8; MINIMAL_OLEFILE_SIZE];
        data[..8].copy_from_slice(MAGIC);
        assert!(is_ole_file(&data));
        assert!(!is_ole_file(&data[..100]));
    }
}
