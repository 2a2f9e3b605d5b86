use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of raw bytes as lowercase hex.
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_deterministic() {
        assert_eq!(digest(b"hello world"), digest(b"hello world"));
        assert_ne!(digest(b"hello"), digest(b"world"));
    }

    #[test]
    fn test_digest_known_value() {
        assert_eq!(
            digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(digest(b"abc").len(), 64);
    }

    #[test]
    fn test_digest_binary_bytes() {
        let bytes = [0u8, 159, 146, 150, 255];
        assert_eq!(digest(&bytes), digest(&bytes.to_vec()));
        assert_ne!(digest(&bytes), digest(&bytes[..4]));
    }
}
