//! Storage abstractions for service layer
//!
//! `json_map_store` persists small maps as JSON files; `signer_store` builds
//! the write-once signer cache on top of it (or on an in-memory map).

pub mod json_map_store;
pub mod signer_store;

pub use signer_store::{open_signer_store, JsonFileSignerStore, MemorySignerStore, SignerStore};
