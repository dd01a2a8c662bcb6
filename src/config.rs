use crate::signer::STORAGE_SIGNATURE_LABEL;

/// Settings for sealing private key bundles.
///
/// Both values feed key derivation, so a bundle can only be opened with the
/// configuration it was sealed with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    /// HKDF info used when deriving the storage encryption key.
    pub hkdf_info: Vec<u8>,
    /// First line of the text the signer is asked to sign.
    pub signature_request_label: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            hkdf_info: b"Tessera-Storage-v1".to_vec(),
            signature_request_label: STORAGE_SIGNATURE_LABEL.to_string(),
        }
    }
}
