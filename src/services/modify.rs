//! Fetched installer stubs and the per-platform patch dispatch.

use crate::domain::dmg::{self, DmgImage};
use crate::domain::pe;
use crate::infra::error::StubResult;
use sha2::{Digest, Sha256};

/// Sentinel marking the attribution slot in both installer formats.
const ATTRIBUTION_SENTINEL: &str = "__MOZCUSTOM__:";

/// A fetched (or patched) installer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stub {
    pub body: Vec<u8>,
    pub content_type: String,
    /// Basename of the resolved upstream URL.
    pub filename: String,
}

/// Patch `stub` with the encoded attribution code, dispatching on the
/// request's `os` value. macOS installers are DMGs; everything else that
/// reaches this service is a Windows PE stub (the bouncer only hands out
/// attributable builds).
pub fn modify_stub(stub: &Stub, attribution_code: &str, os: &str) -> StubResult<Stub> {
    metrics::counter!("modify_stub").increment(1);

    let body = if attribution_code.is_empty() {
        stub.body.clone()
    } else {
        match os {
            "osx" => {
                let mut image = DmgImage::parse(stub.body.clone())?;
                dmg::write_attribution_code(
                    &mut image,
                    ATTRIBUTION_SENTINEL,
                    attribution_code.as_bytes(),
                )?;
                image.data
            }
            _ => pe::write_attribution_code(&stub.body, attribution_code.as_bytes())?,
        }
    };

    log::info!(
        "modified stub original_filename={} original_stub_sha256={:X} modified_stub_sha256={:X} attribution_code={}",
        stub.filename,
        Sha256::digest(&stub.body),
        Sha256::digest(&body),
        attribution_code,
    );

    Ok(Stub {
        body,
        content_type: stub.content_type.clone(),
        filename: stub.filename.clone(),
    })
}
