//! Constants of the OLE2 compound file format.

/// Magic bytes at the start of every compound file
pub const MAGIC: &[u8; 8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Smallest possible compound file (header plus one sector)
pub const MINIMAL_OLEFILE_SIZE: usize = 1024;

/// Byte-order mark in the header: little-endian on disk
pub const BOM_LITTLE: u16 = 0xFFFE;
/// Byte-order mark of a byte-swapped (big-endian) container
pub const BOM_BIG: u16 = 0xFEFF;

/// Size of a directory entry in bytes
pub const DIRENTRY_SIZE: usize = 128;

/// Sector chain terminator
pub const ENDOFCHAIN: u32 = 0xFFFFFFFE;
/// Free (unallocated) sector
pub const FREESECT: u32 = 0xFFFFFFFF;
/// Sector holding FAT entries
pub const FATSECT: u32 = 0xFFFFFFFD;
/// "No stream" sentinel for directory SIDs
pub const NOSTREAM: u32 = 0xFFFFFFFF;

/// Directory entry types
pub const STGTY_STORAGE: u8 = 1;
pub const STGTY_STREAM: u8 = 2;
pub const STGTY_ROOT: u8 = 5;
