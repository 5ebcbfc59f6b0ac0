//! Shared fixtures: a fake signed PE and a mock upstream redirector.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, OnceLock};
use warp::http::Response;
use warp::hyper::Body;
use warp::Filter;

pub const MOZ_TAG: &[u8] = b"__MOZCUSTOM__:";

/// Offset of the cert table in [`make_signed_pe`] output.
pub const CERT_TABLE_OFFSET: usize = 4096;
/// Offset of the attribution marker inside the cert table.
pub const TAG_OFFSET_IN_TABLE: usize = 512;

/// A minimal signed-PE-shaped buffer with a dummy cert carrying the
/// attribution marker.
pub fn make_signed_pe() -> Vec<u8> {
    let mut data = vec![0u8; 8192];
    data[0] = b'M';
    data[1] = b'Z';
    let pe_offset: u32 = 0x80;
    data[0x3C..0x40].copy_from_slice(&pe_offset.to_le_bytes());
    data[0x80..0x84].copy_from_slice(b"PE\0\0");

    // PE32 optional header magic
    let optional_header_offset = 0x80 + 24;
    data[optional_header_offset..optional_header_offset + 2]
        .copy_from_slice(&0x10bu16.to_le_bytes());

    let cert_dir_entry_offset = optional_header_offset + 128;
    data[cert_dir_entry_offset..cert_dir_entry_offset + 4]
        .copy_from_slice(&(CERT_TABLE_OFFSET as u32).to_le_bytes());
    data[cert_dir_entry_offset + 4..cert_dir_entry_offset + 8]
        .copy_from_slice(&2048u32.to_le_bytes());

    let tag_at = CERT_TABLE_OFFSET + TAG_OFFSET_IN_TABLE;
    data[tag_at..tag_at + MOZ_TAG.len()].copy_from_slice(MOZ_TAG);

    data
}

/// A mock upstream: `/` answers like the bouncer with a 302 to the
/// installer path, which serves `body` and counts its hits.
pub struct Upstream {
    pub addr: SocketAddr,
    pub bouncer_hits: Arc<AtomicUsize>,
    pub stub_hits: Arc<AtomicUsize>,
}

impl Upstream {
    /// Bouncer base URL for this mock.
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Absolute URL of the served installer.
    pub fn stub_url(&self) -> String {
        format!("http://{}/pub/firefox/fake-installer.exe", self.addr)
    }
}

pub async fn start_upstream(body: Vec<u8>, content_type: &'static str) -> Upstream {
    let bouncer_hits = Arc::new(AtomicUsize::new(0));
    let stub_hits = Arc::new(AtomicUsize::new(0));

    let own_base: Arc<OnceLock<String>> = Arc::new(OnceLock::new());

    let bouncer = {
        let own_base = own_base.clone();
        let bouncer_hits = bouncer_hits.clone();
        warp::path::end().and(warp::get()).map(move || {
            bouncer_hits.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let location = format!(
                "{}/pub/firefox/fake-installer.exe",
                own_base.get().expect("upstream address set")
            );
            Response::builder()
                .status(302)
                .header("Location", location)
                .body(Body::empty())
                .unwrap()
        })
    };

    let stub = {
        let stub_hits = stub_hits.clone();
        warp::path!("pub" / "firefox" / "fake-installer.exe")
            .and(warp::get())
            .map(move || {
                stub_hits.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Response::builder()
                    .header("Content-Type", content_type)
                    .body(Body::from(body.clone()))
                    .unwrap()
            })
    };

    let missing = warp::path!("missing.exe").and(warp::get()).map(|| {
        Response::builder()
            .status(404)
            .body(Body::empty())
            .unwrap()
    });

    let (addr, server) =
        warp::serve(bouncer.or(stub).or(missing)).bind_ephemeral(([127, 0, 0, 1], 0));
    own_base
        .set(format!("http://{addr}"))
        .expect("address set once");
    tokio::spawn(server);

    Upstream {
        addr,
        bouncer_hits,
        stub_hits,
    }
}
