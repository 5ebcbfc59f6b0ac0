//! BLKX block tables from the DMG resource fork.
//!
//! Each `blkx` resource holds a big-endian table describing how a range of
//! sectors maps onto compressed data, followed by one run record per block.
//! The run count lives in the table, so the runs are length-prefixed by the
//! fixed-size table and parsed separately.

use crate::domain::dmg::koly::UDIF_CRC32;
use crate::domain::dmg::DmgError;
use scroll::{Pread, Pwrite, SizeWith};

/// Size of the fixed [`BlkxTable`] prefix; the runs start here.
pub const BLKX_RUNS_OFFSET: usize = 204;

/// Size of one [`BlkxRun`] record.
const BLKX_RUN_SIZE: usize = 40;

#[derive(Clone, Debug, PartialEq, Eq, Pread, Pwrite, SizeWith)]
pub struct UdifChecksum {
    pub kind: u32,
    pub bitness: u32,
    pub data: [u32; 32],
}

#[derive(Clone, Debug, PartialEq, Eq, Pread, Pwrite, SizeWith)]
pub struct BlkxRun {
    pub kind: u32,
    pub reserved: u32,
    pub sector_start: u64,
    pub sector_count: u64,
    pub comp_offset: u64,
    pub comp_length: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Pread, Pwrite, SizeWith)]
pub struct BlkxTable {
    pub signature: u32,
    pub info_version: u32,
    pub first_sector_number: u64,
    pub sector_count: u64,
    pub data_start: u64,
    pub decompress_buffer_requested: u32,
    pub blocks_descriptor: u32,
    pub reserved: [u32; 6],
    pub checksum: UdifChecksum,
    pub blocks_run_count: u32,
}

/// A parsed `blkx` resource: the fixed table and its run records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlkxContainer {
    pub table: BlkxTable,
    pub runs: Vec<BlkxRun>,
}

impl BlkxContainer {
    /// Parse the `Data` field of a `blkx` resource record.
    pub fn parse(data: &[u8]) -> Result<Self, DmgError> {
        let table: BlkxTable = data
            .pread_with(0, scroll::BE)
            .map_err(|e: scroll::Error| DmgError::Binary(e.to_string()))?;

        let run_count = table.blocks_run_count as usize;
        let needed = BLKX_RUNS_OFFSET + run_count * BLKX_RUN_SIZE;
        if data.len() < needed {
            return Err(DmgError::Binary(format!(
                "blkx data too short for {run_count} runs: {} < {needed}",
                data.len()
            )));
        }

        let mut runs = Vec::with_capacity(run_count);
        let mut offset = BLKX_RUNS_OFFSET;
        for _ in 0..run_count {
            let run: BlkxRun = data
                .pread_with(offset, scroll::BE)
                .map_err(|e: scroll::Error| DmgError::Binary(e.to_string()))?;
            runs.push(run);
            offset += BLKX_RUN_SIZE;
        }

        Ok(Self { table, runs })
    }

    /// Serialize table and runs back to big-endian bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DmgError> {
        let mut buf = vec![0u8; BLKX_RUNS_OFFSET + self.runs.len() * BLKX_RUN_SIZE];
        buf.pwrite_with(self.table.clone(), 0, scroll::BE)
            .map_err(|e: scroll::Error| DmgError::Binary(e.to_string()))?;
        let mut offset = BLKX_RUNS_OFFSET;
        for run in &self.runs {
            buf.pwrite_with(run.clone(), offset, scroll::BE)
                .map_err(|e: scroll::Error| DmgError::Binary(e.to_string()))?;
            offset += BLKX_RUN_SIZE;
        }
        Ok(buf)
    }

    /// Whether this table carries a UDIF CRC32 checksum.
    #[must_use]
    pub fn has_crc32_checksum(&self) -> bool {
        self.table.checksum.kind == UDIF_CRC32
    }
}
