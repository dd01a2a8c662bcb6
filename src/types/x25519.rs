use crate::Error;
use x25519_dalek::{PublicKey, SharedSecret, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length in bytes of an X25519 point or scalar.
pub const X25519_KEY_LENGTH: usize = 32;

/// The public half of an X25519 Diffie-Hellman key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct X25519PublicKey(PublicKey);

impl X25519PublicKey {
    /// Returns the Montgomery u-coordinate of the point.
    pub fn as_bytes(&self) -> &[u8; X25519_KEY_LENGTH] {
        self.0.as_bytes()
    }

    /// Returns an owned copy of the point bytes.
    pub fn to_bytes(&self) -> [u8; X25519_KEY_LENGTH] {
        self.0.to_bytes()
    }
}

impl From<[u8; X25519_KEY_LENGTH]> for X25519PublicKey {
    fn from(bytes: [u8; X25519_KEY_LENGTH]) -> Self {
        Self(PublicKey::from(bytes))
    }
}

impl TryFrom<&[u8]> for X25519PublicKey {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Error> {
        let bytes: [u8; X25519_KEY_LENGTH] = bytes
            .try_into()
            .map_err(|_| Error::Serde("X25519 public key must be 32 bytes".to_string()))?;
        Ok(Self::from(bytes))
    }
}

/// An X25519 secret scalar, kept on the heap and wiped on drop.
#[derive(Clone)]
pub(crate) struct X25519Secret(Box<StaticSecret>);

impl X25519Secret {
    pub(crate) fn dh(&self, public_key: &X25519PublicKey) -> SharedSecret {
        self.0.diffie_hellman(&public_key.0)
    }

    pub(crate) fn public_key(&self) -> X25519PublicKey {
        X25519PublicKey(PublicKey::from(self.0.as_ref()))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; X25519_KEY_LENGTH] {
        self.0.as_bytes()
    }
}

impl From<Box<[u8; X25519_KEY_LENGTH]>> for X25519Secret {
    fn from(mut bytes: Box<[u8; X25519_KEY_LENGTH]>) -> Self {
        let secret = StaticSecret::from(*bytes);
        bytes.zeroize();
        Self(Box::new(secret))
    }
}

impl Zeroize for X25519Secret {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl ZeroizeOnDrop for X25519Secret {}
