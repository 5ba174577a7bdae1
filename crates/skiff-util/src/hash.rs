/// Compute the BLAKE3 hash of a byte slice, returning the hex-encoded digest.
#[must_use]
pub fn blake3_bytes(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Compute the BLAKE3 hash of a string, returning the hex-encoded digest.
#[must_use]
pub fn blake3_str(data: &str) -> String {
    blake3_bytes(data.as_bytes())
}
