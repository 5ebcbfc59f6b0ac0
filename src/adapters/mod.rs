//! Adapters to external systems.

pub mod storage;

pub use storage::{MemStorage, ObjectStorage, Storage};
