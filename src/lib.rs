//! Attribution-stamping service for signed installer binaries.
//!
//! On each download request the service validates a caller-supplied
//! attribution payload, resolves the canonical installer through the
//! upstream bouncer, writes the payload into the region the build system
//! reserved for it (the dummy-certificate slack of a signed PE, or the
//! attribution slot of a DMG), and either streams the patched bytes back
//! or publishes them to an object store and redirects. The original code
//! signature survives because only producer-reserved slack is touched.
//!
//! Any failure downgrades the request to a plain bouncer redirect; the
//! client always gets an installer.

pub mod adapters;
pub mod attribution;
pub mod cache;
pub mod domain;
pub mod handlers;
pub mod infra;
pub mod services;

pub use attribution::{Code, Validator};
pub use cache::SizedLru;
pub use handlers::{DirectHandler, RedirectHandler, StubService};
pub use infra::{Config, ErrorReporter, ReturnMode, StubError, StubResult};
pub use services::{Stub, StubFetcher};
