//! Attribution patching for signed PE installers.
//!
//! Windows installers ship with an oversized dummy certificate in the
//! Authenticode certificate table. The Authenticode digest does not cover
//! the slack bytes of that entry, so an attribution payload can be written
//! after the `__MOZCUSTOM__:` marker without invalidating the signature.

use thiserror::Error;

/// Marker preceding the attribution payload inside the dummy certificate.
pub const MOZ_TAG: &[u8] = b"__MOZCUSTOM__:";

/// Space reserved for marker plus payload inside the dummy certificate.
const ATTRIBUTION_AREA_SIZE: usize = 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("code plus marker exceeds {ATTRIBUTION_AREA_SIZE} bytes")]
    PayloadTooLong,
    #[error("input truncated: need at least {needed} bytes")]
    Truncated { needed: usize },
    #[error("input is not in a known PE format")]
    UnknownPeFormat,
    #[error("input is not signed")]
    Unsigned,
    #[error("input does not contain a dummy cert")]
    MissingDummyCert,
    #[error("payload would overflow the binary")]
    PayloadOverflowsBinary,
    #[error("payload is longer than available cert table space")]
    PayloadOverflowsCertTable,
}

fn read_u32_le(mapped: &[u8], offset: usize) -> Result<u32, PatchError> {
    let end = offset
        .checked_add(4)
        .ok_or(PatchError::Truncated { needed: usize::MAX })?;
    if mapped.len() < end {
        return Err(PatchError::Truncated { needed: end });
    }
    Ok(u32::from_le_bytes([
        mapped[offset],
        mapped[offset + 1],
        mapped[offset + 2],
        mapped[offset + 3],
    ]))
}

fn read_u16_le(mapped: &[u8], offset: usize) -> Result<u16, PatchError> {
    let end = offset
        .checked_add(2)
        .ok_or(PatchError::Truncated { needed: usize::MAX })?;
    if mapped.len() < end {
        return Err(PatchError::Truncated { needed: end });
    }
    Ok(u16::from_le_bytes([mapped[offset], mapped[offset + 1]]))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Write `code` into the dummy certificate of a signed PE image.
///
/// Returns a fresh buffer of the same length; `mapped` is never modified.
/// The dummy certificate ships zero-padded after the marker, so only the
/// payload bytes themselves are written.
pub fn write_attribution_code(mapped: &[u8], code: &[u8]) -> Result<Vec<u8>, PatchError> {
    if code.len() + MOZ_TAG.len() > ATTRIBUTION_AREA_SIZE {
        return Err(PatchError::PayloadTooLong);
    }

    // e_lfanew lives at 0x3C; the optional header follows the 24-byte
    // COFF/NT header.
    if mapped.len() < 0x40 {
        return Err(PatchError::Truncated { needed: 0x40 });
    }
    let pe_header_offset = read_u32_le(mapped, 0x3C)? as usize;
    let optional_header_offset = pe_header_offset + 24;

    // The optional-header magic tells us whether the image is PE32 or
    // PE32+, which moves the data directories.
    let pe_magic = read_u16_le(mapped, optional_header_offset)?;
    let cert_dir_entry_offset = match pe_magic {
        0x10b => optional_header_offset + 128,
        0x20b => optional_header_offset + 144,
        _ => return Err(PatchError::UnknownPeFormat),
    };

    let cert_table_offset = read_u32_le(mapped, cert_dir_entry_offset)? as usize;
    let cert_table_size = read_u32_le(mapped, cert_dir_entry_offset + 4)? as usize;
    if cert_table_offset == 0 || cert_table_size == 0 {
        return Err(PatchError::Unsigned);
    }

    let cert_table_end = cert_table_offset + cert_table_size;
    if mapped.len() < cert_table_end {
        return Err(PatchError::Truncated {
            needed: cert_table_end,
        });
    }
    let tag_index = find(&mapped[cert_table_offset..cert_table_end], MOZ_TAG)
        .ok_or(PatchError::MissingDummyCert)?;

    let insert_start = cert_table_offset + tag_index + MOZ_TAG.len();
    if insert_start + code.len() >= mapped.len() {
        return Err(PatchError::PayloadOverflowsBinary);
    }
    if insert_start + code.len() > cert_table_end {
        return Err(PatchError::PayloadOverflowsCertTable);
    }

    let mut modified = mapped.to_vec();
    modified[insert_start..insert_start + code.len()].copy_from_slice(code);

    Ok(modified)
}
