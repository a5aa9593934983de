/// BLAKE3 hash (32 bytes).
pub type Hash = [u8; 32];

/// Hash arbitrary data using BLAKE3.
pub fn hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Hash arbitrary data and return the lowercase hex digest.
pub fn hash_hex(data: &[u8]) -> String {
    hex::encode(hash(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let data = b"permit credential bytes";
        assert_eq!(hash(data), hash(data));
    }

    #[test]
    fn test_hash_different_inputs() {
        assert_ne!(hash(b"data A"), hash(b"data B"));
    }

    #[test]
    fn test_hash_empty() {
        let h = hash(b"");
        assert_eq!(h.len(), 32);
        assert_ne!(h, [0u8; 32]);
    }

    #[test]
    fn test_hash_hex_length() {
        assert_eq!(hash_hex(b"test").len(), 64);
    }
}
