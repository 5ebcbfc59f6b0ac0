//! Service layer: fetching, coalescing and stub modification.

pub mod fetcher;
pub mod modify;
pub mod singleflight;

pub use fetcher::StubFetcher;
pub use modify::{modify_stub, Stub};
pub use singleflight::SingleFlight;
