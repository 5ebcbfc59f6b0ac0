//! The UDIF "koly" trailer.
//!
//! The last 512 bytes of a DMG are a big-endian trailer describing where
//! the data fork, resource fork and XML property list live, along with the
//! image checksums. All fields are big endian for compatibility with the
//! PPC-era format.
//!
//! See: <http://newosxbook.com/DMG.html>

use crate::domain::dmg::DmgError;
use scroll::{Pread, Pwrite, SizeWith};

/// Trailer size in bytes; also the value of `header_size`.
pub const KOLY_BLOCK_SIZE: usize = 512;

const KOLY_MAGIC: &[u8; 4] = b"koly";

/// UDIF CRC32 checksum type tag.
pub const UDIF_CRC32: u32 = 0x0000_0002;
/// Bit width recorded next to UDIF CRC32 checksums.
pub const UDIF_CRC32_SIZE: u32 = 32;

#[derive(Clone, Debug, PartialEq, Eq, Pread, Pwrite, SizeWith)]
pub struct KolyBlock {
    /// "koly"
    pub signature: [u8; 4],
    pub version: u32,
    pub header_size: u32,
    pub flags: u32,
    pub running_data_fork_offset: u64,
    pub data_fork_offset: u64,
    pub data_fork_length: u64,
    pub rsrc_fork_offset: u64,
    pub rsrc_fork_length: u64,
    pub segment_number: u32,
    pub segment_count: u32,
    pub segment_id: [u32; 4],
    pub data_checksum_type: u32,
    pub data_checksum_size: u32,
    pub data_checksum: [u32; 32],
    /// Offset of the XML property list from the start of the image.
    pub xml_offset: u64,
    /// Length of the XML property list.
    pub xml_length: u64,
    pub reserved1: [u64; 8],
    pub code_signature_offset: u64,
    pub code_signature_size: u64,
    pub reserved2: [u64; 5],
    pub checksum_type: u32,
    pub checksum_size: u32,
    pub checksum: [u32; 32],
    pub image_variant: u32,
    pub sector_count: u64,
    pub reserved3: [u32; 3],
}

impl KolyBlock {
    /// Parse the trailer from the last 512 bytes of a DMG image.
    pub fn parse(data: &[u8]) -> Result<Self, DmgError> {
        if data.len() < KOLY_BLOCK_SIZE {
            return Err(DmgError::NotKolyBlock);
        }
        let tail = &data[data.len() - KOLY_BLOCK_SIZE..];
        let block: KolyBlock = tail
            .pread_with(0, scroll::BE)
            .map_err(|e: scroll::Error| DmgError::Binary(e.to_string()))?;

        if &block.signature != KOLY_MAGIC {
            return Err(DmgError::NotKolyBlock);
        }
        if block.header_size as usize != KOLY_BLOCK_SIZE {
            return Err(DmgError::InvalidHeaderSize);
        }

        Ok(block)
    }

    /// Serialize to exactly 512 big-endian bytes.
    pub fn to_bytes(&self) -> Result<[u8; KOLY_BLOCK_SIZE], DmgError> {
        let mut buf = [0u8; KOLY_BLOCK_SIZE];
        buf.pwrite_with(self.clone(), 0, scroll::BE)
            .map_err(|e: scroll::Error| DmgError::Binary(e.to_string()))?;
        Ok(buf)
    }
}

#[cfg(test)]
pub(crate) fn empty_koly_block() -> KolyBlock {
    KolyBlock {
        signature: *KOLY_MAGIC,
        version: 4,
        header_size: KOLY_BLOCK_SIZE as u32,
        flags: 0,
        running_data_fork_offset: 0,
        data_fork_offset: 0,
        data_fork_length: 0,
        rsrc_fork_offset: 0,
        rsrc_fork_length: 0,
        segment_number: 0,
        segment_count: 0,
        segment_id: [0; 4],
        data_checksum_type: 0,
        data_checksum_size: 0,
        data_checksum: [0; 32],
        xml_offset: 0,
        xml_length: 0,
        reserved1: [0; 8],
        code_signature_offset: 0,
        code_signature_size: 0,
        reserved2: [0; 5],
        checksum_type: 0,
        checksum_size: 0,
        checksum: [0; 32],
        image_variant: 0,
        sector_count: 0,
        reserved3: [0; 3],
    }
}
