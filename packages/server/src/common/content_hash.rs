use sha2::{Digest, Sha256};

/// Generate a 16-byte content digest for cache keying.
///
/// SHA-256 of normalized text, truncated to 16 bytes and hex encoded.
/// Normalization rules:
/// - Convert to lowercase
/// - Drop all non-alphanumeric characters (except whitespace)
/// - Collapse runs of whitespace into single spaces
/// - Trim leading/trailing whitespace
///
/// Equal inputs always produce equal digests, which is what makes the
/// embedding cache safe to share between texts rendered at different times.
pub fn content_digest(text: &str) -> String {
    let normalized = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(&hasher.finalize()[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_same_digest() {
        assert_eq!(
            content_digest("Sales Executive at TechCorp"),
            content_digest("Sales Executive at TechCorp")
        );
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(
            content_digest("Sales Executive"),
            content_digest("SALES EXECUTIVE")
        );
    }

    #[test]
    fn punctuation_ignored() {
        assert_eq!(
            content_digest("Sales-Executive, Lagos!"),
            content_digest("Sales Executive Lagos")
        );
    }

    #[test]
    fn whitespace_normalized() {
        assert_eq!(
            content_digest("  Sales   Executive  "),
            content_digest("Sales Executive")
        );
    }

    #[test]
    fn different_content_different_digest() {
        assert_ne!(
            content_digest("Sales Executive"),
            content_digest("Marketing Executive")
        );
    }

    #[test]
    fn digest_is_sixteen_bytes_hex() {
        let digest = content_digest("anything");
        assert_eq!(digest.len(), 32);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
