use crate::proto::{EncryptedPrivateKeyBundleProto, PrivateKeyBundleProto};
use crate::signer::signature_request;
use crate::types::fill_random;
use crate::{Ciphertext, Error, PrivateKeyBundle, Signer, StorageConfig};
use prost::Message;
use std::fmt;
use tracing::debug;
use zeroize::Zeroizing;

/// Length in bytes of a [`WalletPreKey`].
pub const WALLET_PRE_KEY_LENGTH: usize = 32;

/// Version written into every sealed bundle.
pub const STORAGE_VERSION: u32 = 1;

/// Random bytes a signer signs to derive a storage encryption key.
///
/// Despite the name this is not a protocol pre-key: it is a per-envelope
/// nonce that only makes sense together with the signer that sealed it.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct WalletPreKey([u8; WALLET_PRE_KEY_LENGTH]);

impl WalletPreKey {
    fn generate() -> Result<Self, Error> {
        let mut bytes = [0u8; WALLET_PRE_KEY_LENGTH];
        fill_random(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; WALLET_PRE_KEY_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for WalletPreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WalletPreKey(..)")
    }
}

/// The persisted form of a [`PrivateKeyBundle`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedPrivateKeyBundle {
    wallet_pre_key: WalletPreKey,
    ciphertext: Ciphertext,
}

impl EncryptedPrivateKeyBundle {
    /// Returns the nonce the signer signs to re-derive the storage key.
    pub fn wallet_pre_key(&self) -> &WalletPreKey {
        &self.wallet_pre_key
    }

    /// Returns the encrypted bundle.
    pub fn ciphertext(&self) -> &Ciphertext {
        &self.ciphertext
    }

    /// Serializes the envelope for storage.
    pub fn to_bytes(&self) -> Vec<u8> {
        EncryptedPrivateKeyBundleProto {
            wallet_pre_key: self.wallet_pre_key.0.to_vec(),
            ciphertext: Some(self.ciphertext.to_proto()),
            version: STORAGE_VERSION,
        }
        .encode_to_vec()
    }

    /// Parses a stored envelope.
    ///
    /// Checks that both fields are present and the version is known, but does
    /// not decrypt anything.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let proto = EncryptedPrivateKeyBundleProto::decode(bytes)?;
        if proto.wallet_pre_key.is_empty() {
            return Err(Error::MissingWalletPreKey);
        }
        let wallet_pre_key = proto
            .wallet_pre_key
            .as_slice()
            .try_into()
            .map(WalletPreKey)
            .map_err(|_| Error::Serde("Wallet pre-key must be 32 bytes".to_string()))?;

        // Later versions may carry ciphertext variants this build cannot name.
        if proto.version != STORAGE_VERSION {
            return Err(Error::Serde(format!(
                "Unsupported storage version {}",
                proto.version
            )));
        }

        let ciphertext = proto.ciphertext.ok_or(Error::MissingCiphertext)?;
        let ciphertext = Ciphertext::try_from_proto(ciphertext)?;

        Ok(Self {
            wallet_pre_key,
            ciphertext,
        })
    }
}

/// Seals and opens private key bundles with a signer-derived key.
///
/// The signer signs a request built from a fresh [`WalletPreKey`]; the
/// signature bytes are the input key material for the encryption key. The
/// signer must be deterministic, see [`Signer`].
#[derive(Clone, Debug, Default)]
pub struct SecureStorage {
    config: StorageConfig,
}

impl SecureStorage {
    /// Creates a codec with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Encrypts `bundle` under a key derived from `signer`.
    pub async fn seal<S: Signer>(
        &self,
        bundle: &PrivateKeyBundle,
        signer: &S,
    ) -> Result<EncryptedPrivateKeyBundle, Error> {
        if bundle.pre_keys.is_empty() {
            return Err(Error::MissingPreKeys);
        }

        let wallet_pre_key = WalletPreKey::generate()?;
        let secret = self.storage_secret(signer, &wallet_pre_key).await?;

        let plaintext = Zeroizing::new(bundle.to_proto().encode_to_vec());
        let ciphertext = Ciphertext::encrypt(
            &secret,
            &self.config.hkdf_info,
            &plaintext,
            wallet_pre_key.as_bytes(),
        )?;

        debug!(
            pre_keys = bundle.pre_keys.len(),
            "sealed private key bundle"
        );

        Ok(EncryptedPrivateKeyBundle {
            wallet_pre_key,
            ciphertext,
        })
    }

    /// Decrypts a sealed bundle with the signer that sealed it.
    ///
    /// A different signer, or one that is not deterministic, fails
    /// authentication with [`Error::Crypto`] rather than yielding garbage.
    pub async fn open<S: Signer>(
        &self,
        signer: &S,
        sealed: &EncryptedPrivateKeyBundle,
    ) -> Result<PrivateKeyBundle, Error> {
        let secret = self.storage_secret(signer, &sealed.wallet_pre_key).await?;

        let plaintext = sealed.ciphertext.decrypt(
            &secret,
            &self.config.hkdf_info,
            sealed.wallet_pre_key.as_bytes(),
        )?;
        let proto = PrivateKeyBundleProto::decode(plaintext.as_slice())?;
        let bundle = PrivateKeyBundle::try_from_proto(proto)?;

        debug!(
            pre_keys = bundle.pre_keys.len(),
            "opened private key bundle"
        );

        Ok(bundle)
    }

    async fn storage_secret<S: Signer>(
        &self,
        signer: &S,
        wallet_pre_key: &WalletPreKey,
    ) -> Result<Zeroizing<Vec<u8>>, Error> {
        let request = signature_request(
            &self.config.signature_request_label,
            wallet_pre_key.as_bytes(),
        );
        let signature = Zeroizing::new(signer.sign(request.as_bytes()).await?.into_bytes());
        if signature.is_empty() {
            return Err(Error::Signer("Signer returned an empty signature".to_string()));
        }

        Ok(signature)
    }
}

impl PrivateKeyBundle {
    /// Encrypts this bundle for storage with the default [`SecureStorage`].
    pub async fn encode<S: Signer>(&self, signer: &S) -> Result<Vec<u8>, Error> {
        let sealed = SecureStorage::default().seal(self, signer).await?;
        Ok(sealed.to_bytes())
    }

    /// Restores a bundle produced by [`PrivateKeyBundle::encode`].
    pub async fn decode<S: Signer>(signer: &S, bytes: &[u8]) -> Result<Self, Error> {
        let sealed = EncryptedPrivateKeyBundle::from_bytes(bytes)?;
        SecureStorage::default().open(signer, &sealed).await
    }
}
