//! Signing primitives used to authenticate tokens

use std::fmt;

use crate::braids::AccessKey;

/// A signer able to produce a raw signature over a byte payload
pub trait Signer {
    /// The error returned on failure to sign
    type Error: fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Attempts to sign the data provided
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Self::Error>;
}

/// HMAC-SHA512 keyed with an access key
///
/// This is the signing scheme expected by the API Management gateway.
#[derive(Clone, PartialEq, Eq)]
#[must_use]
pub struct HmacSha512 {
    secret: AccessKey,
}

impl fmt::Debug for HmacSha512 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("HmacSha512 { secret }")
    }
}

impl HmacSha512 {
    /// HMAC-SHA512 using the provided secret
    pub fn new(secret: impl Into<AccessKey>) -> Self {
        let secret = secret.into();
        Self { secret }
    }
}

impl Signer for HmacSha512 {
    type Error = std::convert::Infallible;

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA512, self.secret.as_str().as_bytes());
        let digest = ring::hmac::sign(&key, data);
        Ok(digest.as_ref().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine as _;

    use super::*;

    #[test]
    fn matches_known_hmac_sha512_vector() {
        let signer = HmacSha512::new("key");

        let digest = signer
            .sign(b"The quick brown fox jumps over the lazy dog")
            .unwrap();

        assert_eq!(
            base64::engine::general_purpose::STANDARD.encode(digest),
            "tCrwkFe6weLUFwjkipAuCbX/fxKrQopP6GZTxz3SSPuC+UilSfe3kaW0GRXuTR7Dk1NX5OIxclDQNyr6Lr7rOg==",
        );
    }

    #[test]
    fn signing_is_deterministic() {
        let signer = HmacSha512::new("key");

        assert_eq!(signer.sign(b"payload").unwrap(), signer.sign(b"payload").unwrap());
    }

    #[test]
    fn debug_never_reveals_the_secret() {
        let signer = HmacSha512::new("super-secret-key");

        assert_eq!(format!("{signer:?}"), "HmacSha512 { secret }");
    }
}
