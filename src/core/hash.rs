//! Content hashing for stable identities.
//!
//! FNV-1a over canonical JSON bytes. 32 bits is deliberate: draft keys are
//! cache keys inside one store, not global cryptographic identities, and
//! the short `draft_<hex8>` form stays readable in logs and snapshots.

use serde::Serialize;

use super::json_canon::{CanonJsonError, to_canon_json_bytes};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a 32-bit rolling hash.
pub fn fnv1a32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &b in bytes {
        hash ^= u32::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Canonical-serialize `value` and hash it, as 8 lowercase hex chars.
///
/// Pure: same value, same output, forever, across processes and runs.
pub fn content_hash_hex<T: Serialize>(value: &T) -> Result<String, CanonJsonError> {
    let bytes = to_canon_json_bytes(value)?;
    Ok(format!("{:08x}", fnv1a32(&bytes)))
}
