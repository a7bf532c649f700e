//! Network layer for Murattal
//!
//! Three concerns live here:
//! - a thin `reqwest` wrapper with timeouts and retry (`client`)
//! - background whole-chapter audio prefetch with cancellation and
//!   aggregate progress (`downloader`)
//! - fetching and parsing per-verse word-timing tables (`timing`)
//!
//! Nothing in this crate touches playback state; results flow back to the
//! engine asynchronously.

mod client;
mod downloader;
mod error;
mod retry;
mod timing;

pub use client::{Client, ClientConfig};
pub use downloader::{ChapterDownloader, ChapterProgress, DownloaderConfig, ProgressCallback};
pub use error::{NetworkError, NetworkResult};
pub use retry::RetryPolicy;
pub use timing::fetch_word_timings;
