use crate::header::Header;
use ferra_hashes::{Hash, HeaderHasher};

/// Returns the header hash over the canonical field serialization.
/// The cached `hash` field itself is not part of the digest.
pub fn hash(header: &Header) -> Hash {
    let mut hasher = HeaderHasher::new();
    hasher
        .update(header.parent_hash)
        .update(header.number.to_le_bytes())
        .update(header.difficulty.to_le_bytes::<32>())
        .update(header.timestamp.to_le_bytes());
    hasher.finalize()
}
