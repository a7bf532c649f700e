//! On-disk audio cache for Murattal
//!
//! One flat directory of per-verse audio blobs named
//! `{narratorId}_{chapter}_{verse}.mp3`. File presence is the only
//! persisted state: there is no manifest, so every question about the cache
//! is answered by asking the filesystem again. That trades a small latency
//! cost for correctness when the OS evicts files behind our back.

mod error;
mod store;

pub use error::{CacheError, CacheResult};
pub use store::AudioCache;
