//! On-chain commitment format: `version ‖ reference`.

use crate::error::{DaError, Result};

/// Known commitment layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommitmentVersion {
    /// Reference bytes exactly as returned by the configured transport
    V0 = 0x00,
}

impl CommitmentVersion {
    pub const CURRENT: CommitmentVersion = CommitmentVersion::V0;

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for CommitmentVersion {
    type Error = DaError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(CommitmentVersion::V0),
            other => Err(DaError::UnsupportedVersion(other)),
        }
    }
}

/// Prepend the version byte to the reference
pub fn encode(reference: &[u8], version: u8) -> Vec<u8> {
    let mut commitment = Vec::with_capacity(reference.len() + 1);
    commitment.push(version);
    commitment.extend_from_slice(reference);
    commitment
}

/// Split a commitment into its version byte and reference.
///
/// Only empty input is rejected; the version byte is returned as-is and
/// layout checks are left to the caller (see [`CommitmentVersion`]).
pub fn decode(commitment: &[u8]) -> Result<(u8, &[u8])> {
    match commitment.split_first() {
        Some((&version, reference)) => Ok((version, reference)),
        None => Err(DaError::InvalidCommitment(
            "commitment is empty".to_string(),
        )),
    }
}
