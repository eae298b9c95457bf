//! Data availability adapter for rollup sequencers.
//!
//! Batches are aggregated into one blob, handed to a DA network (plain
//! store/fetch or an asynchronous disperser), and the resulting locator is
//! returned as a versioned commitment for on-chain posting. The commitment
//! is later the only input needed to get the batches back.

pub mod batch;
pub mod commitment;
pub mod config;
pub mod da;
pub mod error;
pub mod packing;
pub mod storage;
pub mod types;
pub mod utils;

pub use da::{DaAdapter, DataAvailability, PollPolicy, Transport};
pub use error::{DaError, Result};
pub use types::{Batch, BlobReference, BlobStatus};
