//! The attribution descriptor embedded in a DMG's `plst` resource.
//!
//! Images produced with attribution support carry a 76-byte little-endian
//! record, base64-encoded into the `Name` field of `plst[0]`. It pins down
//! the raw byte range reserved for the attribution payload and the
//! checksums and lengths of the regions before and after it, so the image
//! checksums can be recomputed without reading the whole file.

use crate::domain::dmg::DmgError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use scroll::{Pread, Pwrite, SizeWith};

/// "attr"
const ATTR_BLOCK_SIGNATURE: u32 = 0x6174_7472;
const ATTR_BLOCK_VERSION: u32 = 1;
/// Size of the encoded descriptor.
pub const ATTR_BLOCK_SIZE: usize = 76;

#[derive(Clone, Debug, Default, PartialEq, Eq, Pread, Pwrite, SizeWith)]
pub struct AttributionResource {
    pub signature: u32,
    pub version: u32,
    pub before_compressed_checksum: u32,
    pub before_compressed_length: u64,
    pub before_uncompressed_checksum: u32,
    pub before_uncompressed_length: u64,
    /// Absolute offset of the raw attribution block in the image.
    pub raw_pos: u64,
    /// Length of the raw attribution block.
    pub raw_length: u64,
    pub raw_checksum: u32,
    pub after_compressed_checksum: u32,
    pub after_compressed_length: u64,
    pub after_uncompressed_checksum: u32,
    pub after_uncompressed_length: u64,
}

impl AttributionResource {
    /// Decode the descriptor from the `Name` field of `plst[0]`.
    ///
    /// Plist string storage sometimes folds tabs and newlines into the
    /// value; they are stripped before base64 decoding.
    pub fn parse(raw: &str) -> Result<Self, DmgError> {
        let cleaned: String = raw.chars().filter(|c| *c != '\t' && *c != '\n').collect();

        let buf = STANDARD
            .decode(cleaned.as_bytes())
            .map_err(|_| DmgError::BadAttrBase64)?;

        if buf.len() != ATTR_BLOCK_SIZE {
            return Err(DmgError::BadAttrLength);
        }

        let attr: AttributionResource = buf
            .pread_with(0, scroll::LE)
            .map_err(|e: scroll::Error| DmgError::Binary(e.to_string()))?;

        if attr.signature != ATTR_BLOCK_SIGNATURE {
            return Err(DmgError::BadAttrSignature);
        }
        if attr.version != ATTR_BLOCK_VERSION {
            return Err(DmgError::BadAttrVersion);
        }

        Ok(attr)
    }

    /// Encode as the base64 string stored in `plst[0].Name`.
    pub fn encode(&self) -> Result<String, DmgError> {
        let mut buf = [0u8; ATTR_BLOCK_SIZE];
        buf.pwrite_with(self.clone(), 0, scroll::LE)
            .map_err(|e: scroll::Error| DmgError::Binary(e.to_string()))?;
        Ok(STANDARD.encode(buf))
    }

    #[cfg(test)]
    pub(crate) fn new_for_test() -> Self {
        Self {
            signature: ATTR_BLOCK_SIGNATURE,
            version: ATTR_BLOCK_VERSION,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let mut attr = AttributionResource::new_for_test();
        attr.raw_pos = 4096;
        attr.raw_length = 1024;
        attr.before_uncompressed_checksum = 0xAAAA_AAAA;
        attr.after_uncompressed_length = 2048;

        let encoded = attr.encode().unwrap();
        let parsed = AttributionResource::parse(&encoded).unwrap();
        assert_eq!(parsed, attr);
    }

    #[test]
    fn strips_tabs_and_newlines() {
        let attr = AttributionResource::new_for_test();
        let encoded = attr.encode().unwrap();
        let mangled = format!("\t{}\n\t{}\n", &encoded[..40], &encoded[40..]);
        let parsed = AttributionResource::parse(&mangled).unwrap();
        assert_eq!(parsed, attr);
    }

    #[test]
    fn rejects_bad_base64() {
        assert!(matches!(
            AttributionResource::parse("!!! not base64 !!!"),
            Err(DmgError::BadAttrBase64)
        ));
    }

    #[test]
    fn rejects_wrong_length() {
        let short = STANDARD.encode([0u8; 40]);
        assert!(matches!(
            AttributionResource::parse(&short),
            Err(DmgError::BadAttrLength)
        ));
    }

    #[test]
    fn rejects_wrong_signature() {
        let mut attr = AttributionResource::new_for_test();
        attr.signature = 0x1111_1111;
        let encoded = attr.encode().unwrap();
        assert!(matches!(
            AttributionResource::parse(&encoded),
            Err(DmgError::BadAttrSignature)
        ));
    }

    #[test]
    fn rejects_wrong_version() {
        let mut attr = AttributionResource::new_for_test();
        attr.version = 2;
        let encoded = attr.encode().unwrap();
        assert!(matches!(
            AttributionResource::parse(&encoded),
            Err(DmgError::BadAttrVersion)
        ));
    }

    #[test]
    fn encoded_block_is_76_bytes() {
        let attr = AttributionResource::new_for_test();
        let decoded = STANDARD.decode(attr.encode().unwrap()).unwrap();
        assert_eq!(decoded.len(), ATTR_BLOCK_SIZE);
    }
}
