/// Errors that can occur while generating, agreeing on or persisting key material.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// A peer's public key bundle is missing its identity key or pre-key.
    #[error("Invalid peer bundle")]
    InvalidPeerBundle,

    /// A pre-key signature does not verify against its identity key.
    #[error("Pre-key signature is invalid")]
    PreKeySignatureInvalid,

    /// The identity key is absent.
    #[error("Missing identity key")]
    MissingIdentityKey,

    /// A private key bundle holds no pre-keys.
    #[error("Missing pre-keys")]
    MissingPreKeys,

    /// No local pre-key matches the one named by the peer.
    #[error("Pre-key not found")]
    PreKeyNotFound,

    /// An encrypted bundle carries no wallet pre-key.
    #[error("Missing wallet pre-key")]
    MissingWalletPreKey,

    /// An encrypted bundle carries no ciphertext, or one of an unknown kind.
    #[error("Missing ciphertext")]
    MissingCiphertext,

    /// A cryptographic operation failed.
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),

    /// The external signer failed to produce a signature.
    #[error("Signer failed: {0}")]
    Signer(String),

    /// Random number generation failed.
    #[error("Random number generation failed")]
    Random,

    /// Serialization or deserialization failed.
    #[error("Serialization/deserialization failed: {0}")]
    Serde(String),
}

impl From<aes_gcm_siv::Error> for Error {
    fn from(value: aes_gcm_siv::Error) -> Self {
        Self::Crypto(value.to_string())
    }
}

impl From<prost::DecodeError> for Error {
    fn from(value: prost::DecodeError) -> Self {
        Self::Serde(value.to_string())
    }
}
