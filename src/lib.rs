mod types;
pub use types::{X25519_KEY_LENGTH, X25519PublicKey};

mod error;
pub use error::Error;

mod config;
pub use config::StorageConfig;

mod signer;
pub use signer::{
    IDENTITY_SIGNATURE_LABEL, STORAGE_SIGNATURE_LABEL, Signer, WalletSignature,
    identity_signature_request,
};

mod public_key;
pub use public_key::*;

mod key_pair;
pub use key_pair::KeyPair;

mod ciphertext;
pub use ciphertext::*;

mod bundle;
pub use bundle::*;

mod x3dh;
pub use x3dh::*;

mod storage;
pub use storage::*;

mod proto;
