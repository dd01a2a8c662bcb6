use crate::{Error, KeyPair, PrivateKeyBundle, PublicKey, PublicKeyBundle};
use hkdf::Hkdf;
use sha2::Sha256;
use std::fmt;
use tracing::{debug, warn};
use x25519_dalek::SharedSecret as DhOutput;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Length in bytes of an agreed secret: three 32-byte DH outputs.
pub const SHARED_SECRET_LENGTH: usize = 96;

const KDF_SALT: &[u8] = b"Tessera-X3DH-NaCl";

/// The raw output of the triple Diffie-Hellman agreement, `DH1 || DH2 || DH3`.
///
/// Wiped on drop and never printed.
pub struct SharedSecret(Box<[u8; SHARED_SECRET_LENGTH]>);

impl SharedSecret {
    // The DH outputs wipe themselves when dropped at the end of this call.
    fn concat(dh1: DhOutput, dh2: DhOutput, dh3: DhOutput) -> Self {
        let mut bytes = Box::new([0u8; SHARED_SECRET_LENGTH]);
        bytes[..32].copy_from_slice(dh1.as_bytes());
        bytes[32..64].copy_from_slice(dh2.as_bytes());
        bytes[64..].copy_from_slice(dh3.as_bytes());

        Self(bytes)
    }

    /// Returns the raw secret bytes.
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_LENGTH] {
        &self.0
    }

    /// Derives a 32-byte symmetric key from the secret with HKDF-SHA256.
    ///
    /// The info parameter is used as context for the derivation, so keys
    /// derived for different purposes differ even from the same secret.
    pub fn derive_key(&self, info: &[u8]) -> Result<Zeroizing<[u8; 32]>, Error> {
        let hkdf = Hkdf::<Sha256>::new(Some(KDF_SALT), self.0.as_slice());

        let mut key = Zeroizing::new([0u8; 32]);
        hkdf.expand(info, key.as_mut_slice())
            .map_err(|_| Error::Crypto("HKDF expansion failed".to_string()))?;

        Ok(key)
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl ZeroizeOnDrop for SharedSecret {}

impl PrivateKeyBundle {
    /// Agrees on a secret with a peer using triple Diffie-Hellman.
    ///
    /// Without `recipient_pre_key` this bundle acts as the sender and uses its
    /// current pre-key. With it, this bundle acts as the recipient and uses
    /// the named pre-key, which the sender had fetched from an earlier or
    /// current [`PublicKeyBundle`].
    ///
    /// Both sides produce `DH1 || DH2 || DH3` where, from the sender's view,
    /// `DH1 = DH(IK_s, PK_r)`, `DH2 = DH(PK_s, IK_r)` and
    /// `DH3 = DH(PK_s, PK_r)`. Since DH is commutative the recipient computes
    /// the same values from its own secrets, but must swap the order of the
    /// identity terms to land on the same byte string.
    ///
    /// # Errors
    ///
    /// - [`Error::PreKeySignatureInvalid`] if the peer's pre-key was not signed
    ///   by the peer's identity key.
    /// - [`Error::PreKeyNotFound`] if `recipient_pre_key` is not in this bundle.
    /// - [`Error::MissingPreKeys`] if this bundle has no pre-keys.
    pub fn shared_secret(
        &self,
        peer: &PublicKeyBundle,
        recipient_pre_key: Option<&PublicKey>,
    ) -> Result<SharedSecret, Error> {
        if let Err(err) = peer.verify() {
            warn!(
                peer = %peer.identity_key().fingerprint(),
                "peer pre-key signature does not verify"
            );
            return Err(err);
        }

        match recipient_pre_key {
            None => self.sender_secret(peer),
            Some(pre_key) => self.recipient_secret(peer, pre_key),
        }
    }

    fn sender_secret(&self, peer: &PublicKeyBundle) -> Result<SharedSecret, Error> {
        let pre_key = self.current_pre_key()?;
        debug!(peer = %peer.identity_key().fingerprint(), "deriving secret as sender");

        // DH1 = DH(IK_local, PK_peer)
        let dh1 = self.identity_key.shared_secret(peer.pre_key());
        // DH2 = DH(PK_local, IK_peer)
        let dh2 = pre_key.shared_secret(peer.identity_key());

        Ok(finish_agreement(dh1, dh2, pre_key, peer))
    }

    fn recipient_secret(
        &self,
        peer: &PublicKeyBundle,
        recipient_pre_key: &PublicKey,
    ) -> Result<SharedSecret, Error> {
        let pre_key = self.find_pre_key(recipient_pre_key)?;
        debug!(peer = %peer.identity_key().fingerprint(), "deriving secret as recipient");

        // DH1 = DH(PK_local, IK_peer), the sender's DH(IK_peer, PK_local)
        let dh1 = pre_key.shared_secret(peer.identity_key());
        // DH2 = DH(IK_local, PK_peer), the sender's DH(PK_peer, IK_local)
        let dh2 = self.identity_key.shared_secret(peer.pre_key());

        Ok(finish_agreement(dh1, dh2, pre_key, peer))
    }
}

// DH3 = DH(PK_local, PK_peer), identical for both roles.
fn finish_agreement(
    dh1: DhOutput,
    dh2: DhOutput,
    pre_key: &KeyPair,
    peer: &PublicKeyBundle,
) -> SharedSecret {
    let dh3 = pre_key.shared_secret(peer.pre_key());
    SharedSecret::concat(dh1, dh2, dh3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (PrivateKeyBundle, PrivateKeyBundle) {
        (
            PrivateKeyBundle::generate().unwrap(),
            PrivateKeyBundle::generate().unwrap(),
        )
    }

    #[test]
    fn test_sender_and_recipient_agree() {
        let (alice, bob) = pair();
        let alice_public = alice.public_key_bundle().unwrap();
        let bob_public = bob.public_key_bundle().unwrap();

        let alice_secret = alice.shared_secret(&bob_public, None).unwrap();
        let bob_secret = bob
            .shared_secret(&alice_public, Some(bob_public.pre_key()))
            .unwrap();

        assert_eq!(alice_secret.as_bytes(), bob_secret.as_bytes());
        assert_eq!(alice_secret.as_bytes().len(), SHARED_SECRET_LENGTH);
    }

    #[test]
    fn test_both_sides_as_sender_disagree() {
        let (alice, bob) = pair();
        let alice_public = alice.public_key_bundle().unwrap();
        let bob_public = bob.public_key_bundle().unwrap();

        // The identity terms come out swapped when both use the sender order.
        let alice_secret = alice.shared_secret(&bob_public, None).unwrap();
        let bob_secret = bob.shared_secret(&alice_public, None).unwrap();

        assert_ne!(alice_secret.as_bytes(), bob_secret.as_bytes());
        assert_eq!(alice_secret.as_bytes()[..32], bob_secret.as_bytes()[32..64]);
        assert_eq!(alice_secret.as_bytes()[32..64], bob_secret.as_bytes()[..32]);
        assert_eq!(alice_secret.as_bytes()[64..], bob_secret.as_bytes()[64..]);
    }

    #[test]
    fn test_secret_survives_pre_key_rotation() {
        let (alice, mut bob) = pair();
        let alice_public = alice.public_key_bundle().unwrap();
        let old_bob_public = bob.public_key_bundle().unwrap();

        let alice_secret = alice.shared_secret(&old_bob_public, None).unwrap();

        bob.add_pre_key().unwrap();
        bob.add_pre_key().unwrap();
        assert_ne!(
            bob.current_pre_key().unwrap().public_key(),
            old_bob_public.pre_key()
        );

        let bob_secret = bob
            .shared_secret(&alice_public, Some(old_bob_public.pre_key()))
            .unwrap();
        assert_eq!(alice_secret.as_bytes(), bob_secret.as_bytes());
    }

    #[test]
    fn test_unknown_recipient_pre_key() {
        let (alice, bob) = pair();
        let alice_public = alice.public_key_bundle().unwrap();
        let stranger = KeyPair::generate().unwrap();

        assert_eq!(
            bob.shared_secret(&alice_public, Some(stranger.public_key()))
                .unwrap_err(),
            Error::PreKeyNotFound
        );
    }

    #[test]
    fn test_tampered_pre_key_is_rejected() {
        let (alice, bob) = pair();
        let mut bob_public = bob.public_key_bundle().unwrap();

        let mut dh_bytes = bob_public.pre_key.dh_key.to_bytes();
        dh_bytes[0] ^= 0x01;
        bob_public.pre_key.dh_key = dh_bytes.into();

        assert_eq!(
            alice.shared_secret(&bob_public, None).unwrap_err(),
            Error::PreKeySignatureInvalid
        );
    }

    #[test]
    fn test_pre_key_signed_by_other_identity_is_rejected() {
        let (alice, bob) = pair();
        let mallory = PrivateKeyBundle::generate().unwrap();

        let forged = PublicKeyBundle {
            identity_key: bob.identity_key().public_key().clone(),
            pre_key: mallory.current_pre_key().unwrap().public_key().clone(),
        };

        assert_eq!(
            alice.shared_secret(&forged, None).unwrap_err(),
            Error::PreKeySignatureInvalid
        );
    }

    #[test]
    fn test_derive_key_depends_on_info() {
        let (alice, bob) = pair();
        let bob_public = bob.public_key_bundle().unwrap();
        let secret = alice.shared_secret(&bob_public, None).unwrap();

        let first = secret.derive_key(b"App-A").unwrap();
        let again = secret.derive_key(b"App-A").unwrap();
        let second = secret.derive_key(b"App-B").unwrap();

        assert_eq!(*first, *again);
        assert_ne!(*first, *second);
    }

    #[test]
    fn test_debug_hides_secret() {
        let (alice, bob) = pair();
        let secret = alice
            .shared_secret(&bob.public_key_bundle().unwrap(), None)
            .unwrap();

        assert_eq!(format!("{secret:?}"), "SharedSecret(..)");
    }
}
