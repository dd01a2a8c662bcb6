use crate::Error;
use base64::Engine;
use ed25519_dalek::SigningKey;

/// Prefix of the text a wallet signs to attest an identity key.
pub const IDENTITY_SIGNATURE_LABEL: &str = "Tessera : Create Identity";

/// Prefix of the text a wallet signs to derive a storage key.
pub const STORAGE_SIGNATURE_LABEL: &str = "Tessera : Enable Identity";

/// An external signature capability, typically a user's wallet.
///
/// The only operation is signing arbitrary bytes. Signing may suspend, e.g.
/// while a hardware wallet waits for confirmation.
///
/// # Determinism
///
/// Sealed private key bundles are encrypted under a key derived from a
/// signature. Opening them again re-derives that key by signing the same
/// request, so a signer used with [`SecureStorage`](crate::SecureStorage)
/// must return identical signatures for identical input. A signer that
/// randomizes its signatures can still attest identity keys, but bundles
/// sealed with it can never be opened.
pub trait Signer {
    /// Signs `message` and returns the raw signature bytes.
    fn sign(&self, message: &[u8]) -> impl Future<Output = Result<WalletSignature, Error>> + Send;
}

/// Ed25519 signatures are deterministic, so a plain signing key can stand in
/// for a wallet both for attestation and for storage encryption.
impl Signer for SigningKey {
    async fn sign(&self, message: &[u8]) -> Result<WalletSignature, Error> {
        let signature = ed25519_dalek::Signer::sign(self, message);
        Ok(WalletSignature::from(signature.to_bytes().to_vec()))
    }
}

/// Opaque signature bytes produced by a [`Signer`].
///
/// The format is whatever the wallet's signature scheme defines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletSignature(Vec<u8>);

impl WalletSignature {
    /// Returns the raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the signature, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Returns true if the signer produced no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for WalletSignature {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

/// Builds the text a wallet signs to attest an identity public key.
pub fn identity_signature_request(identity_public: &[u8]) -> String {
    signature_request(IDENTITY_SIGNATURE_LABEL, identity_public)
}

/// Builds the text a wallet signs, under `label`, to derive a storage key.
pub(crate) fn signature_request(label: &str, payload: &[u8]) -> String {
    let engine = base64::engine::general_purpose::STANDARD;
    format!("{label}\n{}\n", engine.encode(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signing_key_is_deterministic() {
        let wallet = SigningKey::from_bytes(&[9u8; 32]);
        let first = Signer::sign(&wallet, b"same input").await.unwrap();
        let second = Signer::sign(&wallet, b"same input").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.as_bytes().len(), 64);

        let other = Signer::sign(&wallet, b"other input").await.unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn test_signature_request_format() {
        let request = identity_signature_request(&[0u8; 3]);
        assert_eq!(request, "Tessera : Create Identity\nAAAA\n");

        let request = signature_request(STORAGE_SIGNATURE_LABEL, &[0xff; 3]);
        assert_eq!(request, "Tessera : Enable Identity\n////\n");
    }
}
