//! Deterministic content hashing for assets using blake3.
//!
//! The stored document is the asset's `serde_json` encoding. Every container
//! in the model is ordered (`Vec`, `IndexMap`), so the same asset always
//! encodes to the same bytes and therefore the same hash. The save path
//! compares hashes to skip rewriting unchanged assets.

use bpmcp_core::GraphAsset;

use crate::error::BackendError;

/// Encodes `asset` as the stored JSON document.
pub fn encode_asset(asset: &GraphAsset) -> Result<Vec<u8>, BackendError> {
    Ok(serde_json::to_vec(asset)?)
}

/// Hash of an encoded document.
pub fn hash_document(bytes: &[u8]) -> blake3::Hash {
    blake3::hash(bytes)
}

/// Content hash of an asset.
pub fn hash_asset(asset: &GraphAsset) -> Result<blake3::Hash, BackendError> {
    Ok(hash_document(&encode_asset(asset)?))
}
