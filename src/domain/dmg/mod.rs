//! DMG (UDIF) container support: trailer, resource fork, block tables and
//! the attribution patch operation.

pub mod attribution;
pub mod blkx;
pub mod image;
pub mod koly;
pub mod modify;
pub mod resources;

pub use attribution::AttributionResource;
pub use blkx::{BlkxContainer, BlkxRun, BlkxTable, UdifChecksum};
pub use image::DmgImage;
pub use koly::KolyBlock;
pub use modify::write_attribution_code;
pub use resources::{ResourceRecord, Resources};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DmgError {
    #[error("not a koly block")]
    NotKolyBlock,
    #[error("invalid koly header size")]
    InvalidHeaderSize,
    #[error("no XML property list")]
    NoPropertyList,
    #[error("no resource fork")]
    NoResourceFork,
    #[error("named resource not found: {0}")]
    ResourceNotFound(String),
    #[error("couldn't decode base64 attribution data")]
    BadAttrBase64,
    #[error("bad attribution object length")]
    BadAttrLength,
    #[error("invalid attribution signature")]
    BadAttrSignature,
    #[error("invalid attribution resource version")]
    BadAttrVersion,
    #[error("sentinel value not found")]
    SentinelMissing,
    #[error("attribution code is too long")]
    CodeTooLong,
    #[error("unable to find blkx resource to update")]
    BlkxMissing,
    #[error("encoded resources are too big to be written")]
    ResourcesTooBig,
    #[error("property list error: {0}")]
    Plist(String),
    #[error("binary layout error: {0}")]
    Binary(String),
}
