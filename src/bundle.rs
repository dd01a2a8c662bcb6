use crate::proto::{PrivateKeyBundleProto, PublicKeyBundleProto};
use crate::signer::identity_signature_request;
use crate::{Error, KeyPair, KeySignature, PublicKey, Signer};
use prost::Message;
use tracing::{debug, warn};
use zeroize::ZeroizeOnDrop;

/// A user's private key material: one identity key and its pre-keys.
///
/// Pre-keys are ordered most recent first. The first entry is the current
/// pre-key advertised to peers; older entries are kept so that secrets
/// agreed against previously published bundles can still be derived.
#[derive(Debug)]
pub struct PrivateKeyBundle {
    pub(crate) identity_key: KeyPair,
    pub(crate) pre_keys: Vec<KeyPair>,
}

impl PrivateKeyBundle {
    /// Creates a bundle with a fresh identity key and a single pre-key.
    pub fn generate() -> Result<Self, Error> {
        let identity_key = KeyPair::generate()?;
        Self::with_identity(identity_key)
    }

    /// Creates a bundle whose identity key is attested by `wallet`.
    ///
    /// The wallet signs the identity signature request for the identity
    /// public key, and the signature is attached to it. Signer determinism is
    /// not required here.
    pub async fn generate_with_wallet<S: Signer>(wallet: &S) -> Result<Self, Error> {
        let mut identity_key = KeyPair::generate()?;

        let request = identity_signature_request(&identity_key.public_key().to_bytes());
        let signature = wallet.sign(request.as_bytes()).await?;
        if signature.is_empty() {
            return Err(Error::Signer("Wallet returned an empty signature".to_string()));
        }
        identity_key.attach_signature(KeySignature::Wallet(signature));

        Self::with_identity(identity_key)
    }

    fn with_identity(identity_key: KeyPair) -> Result<Self, Error> {
        let mut bundle = Self {
            identity_key,
            pre_keys: Vec::with_capacity(1),
        };
        bundle.add_pre_key()?;

        debug!(
            identity = %bundle.identity_key.public_key().fingerprint(),
            "generated private key bundle"
        );

        Ok(bundle)
    }

    /// Generates a new pre-key signed by the identity key and makes it current.
    ///
    /// Earlier pre-keys are retained behind it.
    pub fn add_pre_key(&mut self) -> Result<&PublicKey, Error> {
        let mut pre_key = KeyPair::generate()?;
        self.identity_key.sign_key(pre_key.public_key_mut());

        self.pre_keys.insert(0, pre_key);
        debug!(
            pre_keys = self.pre_keys.len(),
            "added pre-key to private key bundle"
        );

        Ok(self.pre_keys[0].public_key())
    }

    /// Returns the identity key.
    #[inline]
    pub fn identity_key(&self) -> &KeyPair {
        &self.identity_key
    }

    /// Returns all pre-keys, most recent first.
    #[inline]
    pub fn pre_keys(&self) -> &[KeyPair] {
        &self.pre_keys
    }

    /// Returns the current pre-key.
    ///
    /// An empty pre-key list means the bundle is corrupted.
    pub fn current_pre_key(&self) -> Result<&KeyPair, Error> {
        self.pre_keys.first().ok_or(Error::MissingPreKeys)
    }

    /// Finds the pre-key whose public half is `public_key`.
    pub fn find_pre_key(&self, public_key: &PublicKey) -> Result<&KeyPair, Error> {
        self.pre_keys
            .iter()
            .find(|pre_key| pre_key.matches(public_key))
            .ok_or_else(|| {
                warn!(
                    pre_key = %public_key.fingerprint(),
                    "requested pre-key is not in the bundle"
                );
                Error::PreKeyNotFound
            })
    }

    /// Returns the public bundle to publish: the identity key and the current
    /// pre-key.
    pub fn public_key_bundle(&self) -> Result<PublicKeyBundle, Error> {
        Ok(PublicKeyBundle {
            identity_key: self.identity_key.public_key().clone(),
            pre_key: self.current_pre_key()?.public_key().clone(),
        })
    }

    pub(crate) fn to_proto(&self) -> PrivateKeyBundleProto {
        PrivateKeyBundleProto {
            identity_key: Some(self.identity_key.to_proto()),
            pre_keys: self.pre_keys.iter().map(KeyPair::to_proto).collect(),
        }
    }

    pub(crate) fn try_from_proto(proto: PrivateKeyBundleProto) -> Result<Self, Error> {
        let identity_key = proto.identity_key.ok_or(Error::MissingIdentityKey)?;
        if proto.pre_keys.is_empty() {
            return Err(Error::MissingPreKeys);
        }

        Ok(Self {
            identity_key: KeyPair::try_from_proto(identity_key)?,
            pre_keys: proto
                .pre_keys
                .into_iter()
                .map(KeyPair::try_from_proto)
                .collect::<Result<_, _>>()?,
        })
    }
}

impl ZeroizeOnDrop for PrivateKeyBundle {}

/// The public half of a [`PrivateKeyBundle`], published for peers.
///
/// Holds the identity key and only the current pre-key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKeyBundle {
    pub(crate) identity_key: PublicKey,
    pub(crate) pre_key: PublicKey,
}

impl PublicKeyBundle {
    /// Returns the identity public key.
    #[inline]
    pub fn identity_key(&self) -> &PublicKey {
        &self.identity_key
    }

    /// Returns the advertised pre-key.
    #[inline]
    pub fn pre_key(&self) -> &PublicKey {
        &self.pre_key
    }

    /// Verifies that the pre-key was signed by the identity key.
    pub fn verify(&self) -> Result<(), Error> {
        self.pre_key.verify_key_signature(&self.identity_key)
    }

    /// Serializes the bundle for publication.
    pub fn to_bytes(&self) -> Vec<u8> {
        PublicKeyBundleProto {
            identity_key: Some(self.identity_key.to_proto()),
            pre_key: Some(self.pre_key.to_proto()),
        }
        .encode_to_vec()
    }

    /// Parses a published bundle.
    ///
    /// A bundle missing either key is rejected with
    /// [`Error::InvalidPeerBundle`]. Signatures are not checked here; key
    /// agreement does that.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let proto = PublicKeyBundleProto::decode(bytes)?;
        let (Some(identity_key), Some(pre_key)) = (proto.identity_key, proto.pre_key) else {
            return Err(Error::InvalidPeerBundle);
        };

        Ok(Self {
            identity_key: PublicKey::try_from_proto(identity_key)?,
            pre_key: PublicKey::try_from_proto(pre_key)?,
        })
    }
}
