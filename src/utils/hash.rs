use base64::{engine::general_purpose::STANDARD_NO_PAD as Base64, Engine as _};
use sha2::{Digest, Sha256};

/// Stable fingerprint for request payloads, used as the scan cache key
/// component. Same bytes in, same key out.
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Base64.encode(hasher.finalize())
}
