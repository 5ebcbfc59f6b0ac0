//! In-memory DMG image: parsed trailer, resources, and the raw bytes.

use crate::domain::crc::crc32;
use crate::domain::dmg::blkx::BlkxContainer;
use crate::domain::dmg::koly::{KolyBlock, KOLY_BLOCK_SIZE, UDIF_CRC32, UDIF_CRC32_SIZE};
use crate::domain::dmg::resources::Resources;
use crate::domain::dmg::DmgError;

/// A DMG with its metadata parsed and the full raw image retained for
/// in-place patching.
#[derive(Clone, Debug)]
pub struct DmgImage {
    pub koly: KolyBlock,
    pub resources: Resources,
    pub data: Vec<u8>,
}

impl DmgImage {
    /// Parse a DMG from its full byte image.
    pub fn parse(data: Vec<u8>) -> Result<Self, DmgError> {
        let koly = KolyBlock::parse(&data)?;

        if koly.xml_length == 0 {
            return Err(DmgError::NoPropertyList);
        }
        let xml_start = usize::try_from(koly.xml_offset)
            .map_err(|_| DmgError::Binary("XML offset does not fit in memory".into()))?;
        let xml_len = usize::try_from(koly.xml_length)
            .map_err(|_| DmgError::Binary("XML length does not fit in memory".into()))?;
        let xml_end = xml_start
            .checked_add(xml_len)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| DmgError::Binary("XML property list out of bounds".into()))?;

        let resources = Resources::parse(&data[xml_start..xml_end])?;

        Ok(Self {
            koly,
            resources,
            data,
        })
    }

    /// Replace the named resource and re-encode the property list into the
    /// raw image, space-padded to the original XML length.
    pub fn update_resource(
        &mut self,
        name: &str,
        records: Vec<crate::domain::dmg::resources::ResourceRecord>,
    ) -> Result<(), DmgError> {
        self.resources.update(name, records);
        self.write_resources()
    }

    /// Re-encode `self.resources` into the raw XML span.
    pub fn write_resources(&mut self) -> Result<(), DmgError> {
        let xml_start = self.koly.xml_offset as usize;
        let xml_len = self.koly.xml_length as usize;
        let encoded = self.resources.encode_padded(xml_len)?;
        self.data[xml_start..xml_start + xml_len].copy_from_slice(&encoded);
        Ok(())
    }

    /// Install a new overall data checksum, recompute the master checksum
    /// from the blkx tables, and write the trailer back into the raw image.
    pub fn update_koly_block(&mut self, new_data_checksum: u32) -> Result<(), DmgError> {
        self.koly.data_checksum_type = UDIF_CRC32;
        self.koly.data_checksum_size = UDIF_CRC32_SIZE;
        self.koly.data_checksum[0] = new_data_checksum;

        self.update_overall_checksum()?;
        self.write_koly_block()
    }

    /// Master checksum: CRC32 over the concatenated big-endian primary
    /// checksums of the blkx tables. Entries without a UDIF CRC32 checksum
    /// contribute a zero slot.
    pub fn update_overall_checksum(&mut self) -> Result<(), DmgError> {
        let blkx = self.resources.get("blkx")?;

        let mut containers = Vec::with_capacity(blkx.len());
        for record in blkx {
            containers.push(BlkxContainer::parse(&record.data)?);
        }

        let mut buf = vec![0u8; containers.len() * 4];
        for (i, container) in containers.iter().enumerate() {
            if container.has_crc32_checksum() {
                buf[i * 4..(i + 1) * 4]
                    .copy_from_slice(&container.table.checksum.data[0].to_be_bytes());
            }
        }

        self.koly.checksum_type = UDIF_CRC32;
        self.koly.checksum_size = UDIF_CRC32_SIZE;
        self.koly.checksum[0] = crc32(&buf);

        Ok(())
    }

    /// Serialize the trailer into the final 512 bytes of the raw image.
    pub fn write_koly_block(&mut self) -> Result<(), DmgError> {
        let bytes = self.koly.to_bytes()?;
        let start = self.data.len() - KOLY_BLOCK_SIZE;
        self.data[start..].copy_from_slice(&bytes);
        Ok(())
    }
}
