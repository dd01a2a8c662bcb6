use crate::proto::{KeySignatureProto, PublicKeyProto, key_signature_proto};
use crate::{Error, WalletSignature, X25519_KEY_LENGTH, X25519PublicKey};
use base64::Engine;
use ed25519_dalek::{Signature, VerifyingKey};
use std::fmt;

/// Length in bytes of a public key's canonical encoding.
pub const PUBLIC_KEY_LENGTH: usize = 32 + X25519_KEY_LENGTH;

/// A signature attached to a [`PublicKey`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeySignature {
    /// Produced by another key pair over this key's canonical bytes. Pre-keys
    /// carry one from their identity key.
    Key(Signature),
    /// Produced by an external wallet over the identity signature request.
    Wallet(WalletSignature),
}

/// The public half of a [`KeyPair`](crate::KeyPair).
///
/// Carries an Ed25519 verifying key for signatures and an X25519 point for
/// Diffie-Hellman, plus an optional signature vouching for the key.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub(crate) signing_key: VerifyingKey,
    pub(crate) dh_key: X25519PublicKey,
    pub(crate) signature: Option<KeySignature>,
}

impl PublicKey {
    /// Returns the Ed25519 verifying key.
    #[inline]
    pub fn signing_key(&self) -> &VerifyingKey {
        &self.signing_key
    }

    /// Returns the X25519 key used for Diffie-Hellman.
    #[inline]
    pub fn dh_key(&self) -> &X25519PublicKey {
        &self.dh_key
    }

    /// Returns the attached signature, if any.
    #[inline]
    pub fn signature(&self) -> Option<&KeySignature> {
        self.signature.as_ref()
    }

    /// Returns the canonical bytes that signatures are computed over.
    ///
    /// The format is:
    /// - 32 bytes: Ed25519 verifying key
    /// - 32 bytes: X25519 public key
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        let mut bytes = [0u8; PUBLIC_KEY_LENGTH];
        bytes[..32].copy_from_slice(self.signing_key.as_bytes());
        bytes[32..].copy_from_slice(self.dh_key.as_bytes());

        bytes
    }

    /// Returns true if both keys carry the same key material.
    ///
    /// Attached signatures are not compared.
    pub fn same_key(&self, other: &PublicKey) -> bool {
        self.signing_key == other.signing_key && self.dh_key == other.dh_key
    }

    /// Verifies that this key was signed by `signer`.
    ///
    /// Only [`KeySignature::Key`] signatures can be checked here; a missing
    /// signature or a wallet attestation is treated as invalid.
    pub fn verify_key_signature(&self, signer: &PublicKey) -> Result<(), Error> {
        let Some(KeySignature::Key(signature)) = &self.signature else {
            return Err(Error::PreKeySignatureInvalid);
        };

        signer
            .signing_key
            .verify_strict(&self.to_bytes(), signature)
            .map_err(|_| Error::PreKeySignatureInvalid)
    }

    /// Returns a short printable fingerprint of the key, safe for logs.
    pub fn fingerprint(&self) -> String {
        let engine = base64::engine::general_purpose::STANDARD_NO_PAD;
        engine.encode(&self.dh_key.as_bytes()[..8])
    }

    pub(crate) fn to_proto(&self) -> PublicKeyProto {
        let signature = self.signature.as_ref().map(|signature| {
            let union = match signature {
                KeySignature::Key(signature) => {
                    key_signature_proto::Union::KeySignature(signature.to_bytes().to_vec())
                }
                KeySignature::Wallet(signature) => {
                    key_signature_proto::Union::WalletSignature(signature.as_bytes().to_vec())
                }
            };
            KeySignatureProto { union: Some(union) }
        });

        PublicKeyProto {
            signing_key: self.signing_key.to_bytes().to_vec(),
            dh_key: self.dh_key.to_bytes().to_vec(),
            signature,
        }
    }

    pub(crate) fn try_from_proto(proto: PublicKeyProto) -> Result<Self, Error> {
        let signing_key: [u8; 32] = proto
            .signing_key
            .as_slice()
            .try_into()
            .map_err(|_| Error::Serde("Ed25519 public key must be 32 bytes".to_string()))?;
        let signing_key =
            VerifyingKey::from_bytes(&signing_key).map_err(|err| Error::Serde(err.to_string()))?;
        let dh_key = X25519PublicKey::try_from(proto.dh_key.as_slice())?;

        let signature = match proto.signature.and_then(|signature| signature.union) {
            Some(key_signature_proto::Union::KeySignature(bytes)) => Some(KeySignature::Key(
                Signature::from_slice(&bytes).map_err(|err| Error::Serde(err.to_string()))?,
            )),
            Some(key_signature_proto::Union::WalletSignature(bytes)) => {
                Some(KeySignature::Wallet(WalletSignature::from(bytes)))
            }
            None => None,
        };

        Ok(Self {
            signing_key,
            dh_key,
            signature,
        })
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("fingerprint", &self.fingerprint())
            .field("signed", &self.signature.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;

    #[test]
    fn test_canonical_bytes_layout() {
        let key = KeyPair::generate().unwrap();
        let public = key.public_key();
        let bytes = public.to_bytes();

        assert_eq!(&bytes[..32], public.signing_key().as_bytes());
        assert_eq!(&bytes[32..], public.dh_key().as_bytes());
    }

    #[test]
    fn test_unsigned_key_does_not_verify() {
        let identity = KeyPair::generate().unwrap();
        let pre_key = KeyPair::generate().unwrap();

        assert!(
            pre_key
                .public_key()
                .verify_key_signature(identity.public_key())
                .is_err()
        );
    }

    #[test]
    fn test_proto_conversion_keeps_signature() {
        let identity = KeyPair::generate().unwrap();
        let mut pre_key = KeyPair::generate().unwrap().public_key().clone();
        identity.sign_key(&mut pre_key);

        let restored = PublicKey::try_from_proto(pre_key.to_proto()).unwrap();
        assert_eq!(restored, pre_key);
        assert!(restored.verify_key_signature(identity.public_key()).is_ok());
    }

    #[test]
    fn test_proto_conversion_rejects_short_keys() {
        let key = KeyPair::generate().unwrap();
        let mut proto = key.public_key().to_proto();
        proto.dh_key.truncate(16);

        assert!(matches!(
            PublicKey::try_from_proto(proto),
            Err(Error::Serde(_))
        ));
    }

    #[test]
    fn test_debug_does_not_print_key_bytes() {
        let key = KeyPair::generate().unwrap();
        let printed = format!("{:?}", key.public_key());

        assert!(printed.contains("fingerprint"));
        assert!(printed.contains("signed: false"));
    }
}
