use crate::proto::{Aes256GcmSivHkdfSha256Proto, CiphertextProto, ciphertext_proto};
use crate::types::fill_random;
use crate::Error;
use aes_gcm_siv::aead::{Aead, Payload};
use aes_gcm_siv::{Aes256GcmSiv, KeyInit, Nonce};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Length in bytes of the per-message HKDF salt.
pub const HKDF_SALT_LENGTH: usize = 32;

/// Length in bytes of the AES-GCM-SIV nonce.
pub const NONCE_LENGTH: usize = 12;

/// An authenticated-encryption envelope tagged with its algorithm.
///
/// New variants can be added without breaking decoding of existing data;
/// an unrecognized variant decodes to [`Error::MissingCiphertext`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ciphertext {
    /// AES-256-GCM-SIV under a key derived with HKDF-SHA256 from a secret
    /// and a random salt.
    Aes256GcmSivHkdfSha256 {
        /// Random HKDF salt.
        hkdf_salt: [u8; HKDF_SALT_LENGTH],
        /// Random AEAD nonce.
        nonce: [u8; NONCE_LENGTH],
        /// Encrypted and authenticated payload.
        payload: Vec<u8>,
    },
}

impl Ciphertext {
    /// Encrypts `plaintext` under a key derived from `secret`.
    ///
    /// `info` binds the derived key to an application context and `aad` is
    /// authenticated but not encrypted.
    pub fn encrypt(secret: &[u8], info: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Self, Error> {
        let mut hkdf_salt = [0u8; HKDF_SALT_LENGTH];
        fill_random(&mut hkdf_salt)?;
        let mut nonce = [0u8; NONCE_LENGTH];
        fill_random(&mut nonce)?;

        let cipher = Self::cipher(secret, &hkdf_salt, info)?;
        let payload = cipher.encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )?;

        Ok(Self::Aes256GcmSivHkdfSha256 {
            hkdf_salt,
            nonce,
            payload,
        })
    }

    /// Decrypts and authenticates the payload.
    ///
    /// Fails with [`Error::Crypto`] if the secret, `info` or `aad` differ from
    /// the ones used to encrypt, or if the payload was modified.
    pub fn decrypt(&self, secret: &[u8], info: &[u8], aad: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
        match self {
            Self::Aes256GcmSivHkdfSha256 {
                hkdf_salt,
                nonce,
                payload,
            } => {
                let cipher = Self::cipher(secret, hkdf_salt, info)?;
                let plaintext = cipher
                    .decrypt(Nonce::from_slice(nonce), Payload { msg: payload, aad })
                    .map_err(|_| Error::Crypto("Ciphertext authentication failed".to_string()))?;

                Ok(Zeroizing::new(plaintext))
            }
        }
    }

    fn cipher(secret: &[u8], salt: &[u8], info: &[u8]) -> Result<Aes256GcmSiv, Error> {
        let hkdf = Hkdf::<Sha256>::new(Some(salt), secret);

        let mut key = Zeroizing::new([0u8; 32]);
        hkdf.expand(info, key.as_mut_slice())
            .map_err(|_| Error::Crypto("HKDF expansion failed".to_string()))?;

        let key = aes_gcm_siv::Key::<Aes256GcmSiv>::from_slice(key.as_slice());
        Ok(Aes256GcmSiv::new(key))
    }

    pub(crate) fn to_proto(&self) -> CiphertextProto {
        let union = match self {
            Self::Aes256GcmSivHkdfSha256 {
                hkdf_salt,
                nonce,
                payload,
            } => ciphertext_proto::Union::Aes256GcmSivHkdfSha256(Aes256GcmSivHkdfSha256Proto {
                hkdf_salt: hkdf_salt.to_vec(),
                nonce: nonce.to_vec(),
                payload: payload.clone(),
            }),
        };

        CiphertextProto { union: Some(union) }
    }

    pub(crate) fn try_from_proto(proto: CiphertextProto) -> Result<Self, Error> {
        match proto.union {
            Some(ciphertext_proto::Union::Aes256GcmSivHkdfSha256(aead)) => {
                let hkdf_salt = aead
                    .hkdf_salt
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::Serde("HKDF salt must be 32 bytes".to_string()))?;
                let nonce = aead
                    .nonce
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::Serde("Nonce must be 12 bytes".to_string()))?;

                Ok(Self::Aes256GcmSivHkdfSha256 {
                    hkdf_salt,
                    nonce,
                    payload: aead.payload,
                })
            }
            None => Err(Error::MissingCiphertext),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO: &[u8] = b"Test-Info";

    #[test]
    fn test_encrypt_decrypt() {
        let secret = [3u8; 64];
        let ciphertext = Ciphertext::encrypt(&secret, INFO, b"hello", b"ad").unwrap();

        let plaintext = ciphertext.decrypt(&secret, INFO, b"ad").unwrap();
        assert_eq!(plaintext.as_slice(), b"hello");
    }

    #[test]
    fn test_fresh_salt_and_nonce_per_encryption() {
        let secret = [3u8; 64];
        let first = Ciphertext::encrypt(&secret, INFO, b"hello", b"").unwrap();
        let second = Ciphertext::encrypt(&secret, INFO, b"hello", b"").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_wrong_secret_fails_authentication() {
        let ciphertext = Ciphertext::encrypt(&[3u8; 64], INFO, b"hello", b"").unwrap();

        assert!(matches!(
            ciphertext.decrypt(&[4u8; 64], INFO, b""),
            Err(Error::Crypto(_))
        ));
    }

    #[test]
    fn test_wrong_context_fails_authentication() {
        let secret = [3u8; 64];
        let ciphertext = Ciphertext::encrypt(&secret, INFO, b"hello", b"ad").unwrap();

        assert!(ciphertext.decrypt(&secret, b"Other-Info", b"ad").is_err());
        assert!(ciphertext.decrypt(&secret, INFO, b"other-ad").is_err());
    }

    #[test]
    fn test_tampered_payload_fails_authentication() {
        let secret = [3u8; 64];
        let mut ciphertext = Ciphertext::encrypt(&secret, INFO, b"hello", b"").unwrap();

        let Ciphertext::Aes256GcmSivHkdfSha256 { payload, .. } = &mut ciphertext;
        payload[0] ^= 0x01;

        assert!(ciphertext.decrypt(&secret, INFO, b"").is_err());
    }

    #[test]
    fn test_proto_without_variant_is_missing_ciphertext() {
        let proto = CiphertextProto { union: None };
        assert_eq!(
            Ciphertext::try_from_proto(proto),
            Err(Error::MissingCiphertext)
        );
    }

    #[test]
    fn test_proto_with_short_nonce_is_rejected() {
        let ciphertext = Ciphertext::encrypt(&[3u8; 64], INFO, b"hello", b"").unwrap();
        let mut proto = ciphertext.to_proto();
        if let Some(ciphertext_proto::Union::Aes256GcmSivHkdfSha256(aead)) = proto.union.as_mut() {
            aead.nonce.pop();
        }

        assert!(matches!(
            Ciphertext::try_from_proto(proto),
            Err(Error::Serde(_))
        ));
    }
}
