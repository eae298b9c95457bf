use alloy_rlp::{Bytes, Decodable};

use crate::error::{DaError, Result};
use crate::types::Batch;

/// Aggregate an ordered set of batches into a single blob payload
/// (RLP list of byte strings). Order and empty batches are preserved.
pub fn serialize<B: AsRef<[u8]>>(batches: &[B]) -> Vec<u8> {
    let items: Vec<Bytes> = batches
        .iter()
        .map(|batch| Bytes::copy_from_slice(batch.as_ref()))
        .collect();
    alloy_rlp::encode(&items)
}

/// Reverse of [`serialize`]
pub fn deserialize(data: &[u8]) -> Result<Vec<Batch>> {
    decode_batches(data).map_err(|source| DaError::MalformedAggregate {
        len: data.len(),
        source,
    })
}

fn decode_batches(data: &[u8]) -> alloy_rlp::Result<Vec<Batch>> {
    let mut buf = data;
    let items = Vec::<Bytes>::decode(&mut buf)?;
    if !buf.is_empty() {
        return Err(alloy_rlp::Error::Custom("trailing bytes after aggregate"));
    }
    Ok(items.into_iter().map(|item| item.to_vec()).collect())
}
