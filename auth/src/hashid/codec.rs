use harsh::Harsh;

use super::errors::HashidError;

/// Reversible obfuscation of integer identifiers for external exposure.
///
/// Wraps a keyed hashids scheme: the salt makes encodings
/// deployment-specific and the minimum length keeps short ids from looking
/// sequential. Internal logic always carries the raw numeric id; only the
/// API boundary and token subjects see the encoded form.
pub struct IdCodec {
    harsh: Harsh,
}

impl IdCodec {
    /// Build a codec from a secret salt and a minimum output length.
    ///
    /// # Errors
    /// Fails if the underlying hashids engine rejects the configuration.
    pub fn new(salt: &str, min_length: usize) -> Result<Self, HashidError> {
        Harsh::builder()
            .salt(salt)
            .length(min_length)
            .build()
            .map(|harsh| Self { harsh })
            .map_err(|e| HashidError::InvalidConfiguration(e.to_string()))
    }

    /// Encode a numeric identifier into its opaque form.
    pub fn encode(&self, id: u64) -> String {
        self.harsh.encode(&[id])
    }

    /// Decode an opaque identifier back to its numeric form.
    ///
    /// # Errors
    /// * `InvalidHash` - Input was not produced by this codec (or by a codec
    ///   with a different salt)
    pub fn decode(&self, hash: &str) -> Result<u64, HashidError> {
        self.harsh
            .decode(hash)
            .ok()
            .and_then(|ids| ids.first().copied())
            .ok_or(HashidError::InvalidHash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> IdCodec {
        IdCodec::new("test_salt", 8).expect("Failed to build codec")
    }

    #[test]
    fn test_round_trip() {
        let codec = codec();

        for id in [0u64, 1, 42, 999_999, u64::from(u32::MAX)] {
            let encoded = codec.encode(id);
            assert_eq!(codec.decode(&encoded), Ok(id), "id {id}");
        }
    }

    #[test]
    fn test_minimum_length() {
        let codec = codec();
        assert!(codec.encode(1).len() >= 8);
    }

    #[test]
    fn test_decode_garbage() {
        let codec = codec();

        assert_eq!(codec.decode("garbage!"), Err(HashidError::InvalidHash));
        assert_eq!(codec.decode(""), Err(HashidError::InvalidHash));
    }

    #[test]
    fn test_salt_isolation() {
        let first = IdCodec::new("salt_one", 8).unwrap();
        let second = IdCodec::new("salt_two", 8).unwrap();

        let encoded = first.encode(42);
        // A foreign salt must not silently decode to some other id 42.
        assert_ne!(second.decode(&encoded), Ok(42));
    }
}
