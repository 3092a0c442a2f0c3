//! Content digests for cache keys.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 of a value's JSON form, as 64 lowercase hex characters.
///
/// Used for in-memory load keys and profile-store directory keys, so equal
/// requests always land on the same entry.
pub fn compute_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    Ok(digest_hex(json.as_bytes()))
}

fn digest_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
