use crate::proto::PrivateKeyProto;
use crate::types::{X25519Secret, generate_random_seed};
use crate::{Error, KeySignature, PublicKey};
use ed25519_dalek::{SecretKey, Signature, Signer, SigningKey};
use std::fmt;
use x25519_dalek::SharedSecret;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Length in bytes of a key pair's serialized secret material.
pub(crate) const SECRET_LENGTH: usize = 64;

/// An asymmetric key pair able to both sign and perform Diffie-Hellman.
///
/// A single random seed yields an Ed25519 signing key and an X25519 key, so
/// the same pair can vouch for other keys and take part in key agreement.
/// The secret halves never leave this type except through the encrypted
/// storage path.
pub struct KeyPair {
    signing_key: Box<SigningKey>,
    dh_key: X25519Secret,
    public_key: PublicKey,
}

impl KeyPair {
    /// Creates a new key pair from fresh OS randomness.
    pub fn generate() -> Result<Self, Error> {
        let seed = generate_random_seed()?;
        let signing_key = Box::new(SigningKey::from(SecretKey::from(*seed)));
        let dh_key = X25519Secret::from(seed);

        Ok(Self::from_parts(signing_key, dh_key, None))
    }

    fn from_parts(
        signing_key: Box<SigningKey>,
        dh_key: X25519Secret,
        signature: Option<KeySignature>,
    ) -> Self {
        let public_key = PublicKey {
            signing_key: signing_key.verifying_key(),
            dh_key: dh_key.public_key(),
            signature,
        };

        Self {
            signing_key,
            dh_key,
            public_key,
        }
    }

    /// Returns the public half, including any attached signature.
    #[inline]
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Signs a message with the Ed25519 signing key.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Verifies a signature made by this key pair.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), Error> {
        self.signing_key
            .verifying_key()
            .verify_strict(message, signature)
            .map_err(|err| Error::Crypto(err.to_string()))
    }

    /// Signs `other`'s canonical bytes and attaches the signature to it.
    pub fn sign_key(&self, other: &mut PublicKey) {
        let signature = self.sign(&other.to_bytes());
        other.signature = Some(KeySignature::Key(signature));
    }

    /// Performs Diffie-Hellman with a peer's public key.
    ///
    /// Commutative: `a.shared_secret(b.public_key())` equals
    /// `b.shared_secret(a.public_key())`.
    pub fn shared_secret(&self, peer: &PublicKey) -> SharedSecret {
        self.dh_key.dh(&peer.dh_key)
    }

    /// Returns true if `public_key` is this pair's public half.
    pub fn matches(&self, public_key: &PublicKey) -> bool {
        self.public_key.same_key(public_key)
    }

    pub(crate) fn public_key_mut(&mut self) -> &mut PublicKey {
        &mut self.public_key
    }

    pub(crate) fn attach_signature(&mut self, signature: KeySignature) {
        self.public_key.signature = Some(signature);
    }

    /// Serializes the secret halves.
    ///
    /// The first 32 bytes contain the Ed25519 secret key, and the last
    /// 32 bytes contain the X25519 secret key.
    fn secret_bytes(&self) -> Zeroizing<[u8; SECRET_LENGTH]> {
        let mut bytes = Zeroizing::new([0u8; SECRET_LENGTH]);
        bytes[..32].copy_from_slice(self.signing_key.as_bytes());
        bytes[32..].copy_from_slice(self.dh_key.as_bytes());

        bytes
    }

    pub(crate) fn to_proto(&self) -> PrivateKeyProto {
        PrivateKeyProto {
            secret: self.secret_bytes().to_vec(),
            public_key: Some(self.public_key.to_proto()),
        }
    }

    pub(crate) fn try_from_proto(mut proto: PrivateKeyProto) -> Result<Self, Error> {
        if proto.secret.len() != SECRET_LENGTH {
            proto.secret.zeroize();
            return Err(Error::Serde(format!(
                "Private key material must be {SECRET_LENGTH} bytes"
            )));
        }

        let mut signing_secret = Box::new([0u8; 32]);
        signing_secret.copy_from_slice(&proto.secret[..32]);
        let signing_key = Box::new(SigningKey::from_bytes(&signing_secret));
        signing_secret.zeroize();

        let mut dh_secret = Box::new([0u8; 32]);
        dh_secret.copy_from_slice(&proto.secret[32..]);
        let dh_key = X25519Secret::from(dh_secret);
        proto.secret.zeroize();

        let stored = proto
            .public_key
            .map(PublicKey::try_from_proto)
            .transpose()?
            .ok_or_else(|| Error::Serde("Private key has no public key".to_string()))?;

        let key_pair = Self::from_parts(signing_key, dh_key, stored.signature.clone());
        if !key_pair.matches(&stored) {
            return Err(Error::Serde(
                "Stored public key does not match private key".to_string(),
            ));
        }

        Ok(key_pair)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

// Both secret halves wipe themselves when dropped.
impl ZeroizeOnDrop for KeyPair {}
