//! Neynar API access: wire types and the HTTP client.

pub mod client;
pub mod types;

pub use client::NeynarClient;
pub use types::{Channel, SignerRecord, SignerState};
