use alloy_rlp::{Bytes, Decodable, RlpDecodable, RlpEncodable};
use std::fmt;

use crate::utils::to_hex_prefixed;

/// An opaque batch payload produced by the sequencer
pub type Batch = Vec<u8>;

/// Lifecycle of a dispersed blob as reported by the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobStatus {
    Processing,
    Confirmed,
    Finalized,
    Failed,
    Unknown,
}

impl BlobStatus {
    /// Only confirmed/finalized blobs can hand out a reference
    pub fn is_confirmed(&self) -> bool {
        matches!(self, BlobStatus::Confirmed | BlobStatus::Finalized)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, BlobStatus::Failed | BlobStatus::Unknown)
    }
}

impl fmt::Display for BlobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlobStatus::Processing => "PROCESSING",
            BlobStatus::Confirmed => "CONFIRMED",
            BlobStatus::Finalized => "FINALIZED",
            BlobStatus::Failed => "FAILED",
            BlobStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Request identifier handed back by the disperser, only good for polling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispersalReceipt {
    pub request_id: Vec<u8>,
}

impl fmt::Display for DispersalReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_hex_prefixed(&self.request_id))
    }
}

/// Durable locator of a confirmed blob: batch header hash + index in batch.
/// Encodes as RLP `[batch_header_hash, blob_index]`.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct BlobReference {
    pub batch_header_hash: Bytes,
    pub blob_index: u32,
}

impl BlobReference {
    pub fn to_rlp_bytes(&self) -> Vec<u8> {
        alloy_rlp::encode(self)
    }

    /// Decode a reference, rejecting anything after the list
    pub fn from_rlp_bytes(data: &[u8]) -> alloy_rlp::Result<Self> {
        let mut buf = data;
        let reference = Self::decode(&mut buf)?;
        if !buf.is_empty() {
            return Err(alloy_rlp::Error::Custom("trailing bytes after blob reference"));
        }
        Ok(reference)
    }
}

/// Immediate answer to a blob submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReply {
    pub status: BlobStatus,
    pub receipt: DispersalReceipt,
}

/// Answer to a status query; `reference` is only set once confirmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReply {
    pub status: BlobStatus,
    pub reference: Option<BlobReference>,
}
