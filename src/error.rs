use std::time::Duration;
use thiserror::Error;

use crate::types::BlobStatus;

pub type Result<T> = std::result::Result<T, DaError>;

/// Failures surfaced by the adapter and its transports
#[derive(Debug, Error)]
pub enum DaError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("no data found for reference {reference}")]
    NotFound { reference: String },
    #[error("remote storage failed to {action}: status {status}")]
    RemoteError { action: &'static str, status: u16 },
    #[error("blob dispersal rejected: {reason}")]
    DispersalRejected { reason: String },
    #[error("blob dispersal {request_id} failed in processing with status {status}")]
    DispersalFailed { request_id: String, status: BlobStatus },
    #[error("timed out after {timeout:?} getting status for dispersed blob {request_id}")]
    DispersalTimeout { request_id: String, timeout: Duration },
    #[error("blob dispersal {request_id} reported {status} without a blob reference")]
    MissingBlobReference { request_id: String, status: BlobStatus },
    #[error("gave up on blob {request_id} after {attempts} consecutive status query errors: {last_error}")]
    StatusQueryFailed {
        request_id: String,
        attempts: u32,
        last_error: String,
    },
    #[error("malformed aggregate ({len} bytes): {source}")]
    MalformedAggregate {
        len: usize,
        source: alloy_rlp::Error,
    },
    #[error("invalid commitment: {0}")]
    InvalidCommitment(String),
    #[error("unsupported commitment version 0x{0:02x}")]
    UnsupportedVersion(u8),
    #[error("operation cancelled")]
    Cancelled,
    #[error("http transport: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rpc transport: {0}")]
    Rpc(#[from] tonic::Status),
    #[error("rpc endpoint: {0}")]
    Endpoint(#[from] tonic::transport::Error),
}
