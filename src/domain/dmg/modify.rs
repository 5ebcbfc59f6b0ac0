//! Attribution patching for DMG installers.
//!
//! Port of the attribution flow from libdmg-hfsplus: locate the reserved
//! slot via the descriptor in `plst[0]`, write the payload over the TAB
//! padding, then repair the blkx and trailer checksums with CRC32 combines
//! so the image stays internally consistent.
//!
//! The attribution descriptor itself is left untouched: re-attributing an
//! already-stamped image is not a supported operation, and skipping the
//! rewrite keeps work out of the critical path of a download.

use crate::domain::crc::{crc32, crc32_combine};
use crate::domain::dmg::attribution::AttributionResource;
use crate::domain::dmg::blkx::BlkxContainer;
use crate::domain::dmg::image::DmgImage;
use crate::domain::dmg::DmgError;

const TAB: u8 = 0x09;
const NUL: u8 = 0x00;

/// Name fragment identifying the filesystem blkx entry whose checksum
/// covers the attribution block.
const HFS_BLKX_NAME: &str = "Apple_HFS";

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Write `code` into the attribution slot of `dmg`, updating the blkx and
/// koly checksums in place.
pub fn write_attribution_code(
    dmg: &mut DmgImage,
    sentinel: &str,
    code: &[u8],
) -> Result<(), DmgError> {
    // The blkx resource carries the checksum we must refresh after the
    // payload lands.
    let mut blkx_records = dmg.resources.get("blkx")?.to_vec();

    // plst[0].Name holds the descriptor locating the attribution block.
    let plst_records = dmg.resources.get("plst")?;
    let first_plst = plst_records
        .first()
        .ok_or_else(|| DmgError::ResourceNotFound("plst".to_string()))?;
    let attr = AttributionResource::parse(&first_plst.name)?;

    let raw_start = attr.raw_pos as usize;
    let raw_end = raw_start + attr.raw_length as usize;
    if raw_end > dmg.data.len() {
        return Err(DmgError::Binary(
            "attribution block out of bounds".to_string(),
        ));
    }

    let sentinel_index =
        find(&dmg.data[raw_start..raw_end], sentinel.as_bytes()).ok_or(DmgError::SentinelMissing)?;

    // The run of TAB bytes after the sentinel is the reserved capacity;
    // convert it to NULs before writing the payload over the front of it.
    let code_offset = raw_start + sentinel_index + sentinel.len();
    let mut padding_offset = code_offset;
    while padding_offset < dmg.data.len() && dmg.data[padding_offset] == TAB {
        dmg.data[padding_offset] = NUL;
        padding_offset += 1;
    }

    if code.len() > padding_offset - code_offset {
        return Err(DmgError::CodeTooLong);
    }

    dmg.data[code_offset..code_offset + code.len()].copy_from_slice(code);

    // New checksum of the raw block the payload sits in.
    let raw_crc = crc32(&dmg.data[raw_start..raw_end]);

    // Splice it between the before/after checksums recorded in the
    // descriptor, once for the uncompressed (blkx) chain and once for the
    // compressed (overall data) chain.
    let new_blkx_checksum = crc32_combine(
        crc32_combine(attr.before_uncompressed_checksum, raw_crc, attr.raw_length),
        attr.after_uncompressed_checksum,
        attr.after_uncompressed_length,
    );
    let new_data_checksum = crc32_combine(
        crc32_combine(attr.before_compressed_checksum, raw_crc, attr.raw_length),
        attr.after_compressed_checksum,
        attr.after_compressed_length,
    );

    // The first HFS filesystem entry is the one covering the payload.
    let blkx_index = blkx_records
        .iter()
        .position(|record| record.name.contains(HFS_BLKX_NAME))
        .ok_or(DmgError::BlkxMissing)?;

    let mut container = BlkxContainer::parse(&blkx_records[blkx_index].data)?;
    container.table.checksum.data[0] = new_blkx_checksum;
    blkx_records[blkx_index].data = container.to_bytes()?;

    dmg.update_resource("blkx", blkx_records)?;
    dmg.update_koly_block(new_data_checksum)?;

    Ok(())
}
