//! Protocol Buffers wire and storage messages.
//!
//! Field numbers are part of the persisted format and must never be reused.

use prost::{Message, Oneof};

/// Signature attached to a public key.
#[derive(Clone, PartialEq, Message)]
pub(crate) struct KeySignatureProto {
    #[prost(oneof = "key_signature_proto::Union", tags = "1, 2")]
    pub union: Option<key_signature_proto::Union>,
}

pub(crate) mod key_signature_proto {
    use super::Oneof;

    #[derive(Clone, PartialEq, Oneof)]
    pub(crate) enum Union {
        /// Ed25519 signature by another key pair.
        #[prost(bytes, tag = "1")]
        KeySignature(Vec<u8>),
        /// Opaque signature by an external wallet.
        #[prost(bytes, tag = "2")]
        WalletSignature(Vec<u8>),
    }
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct PublicKeyProto {
    #[prost(bytes = "vec", tag = "1")]
    pub signing_key: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub dh_key: Vec<u8>,
    #[prost(message, optional, tag = "3")]
    pub signature: Option<KeySignatureProto>,
}

/// Secret key material and its public half.
#[derive(Clone, PartialEq, Message)]
pub(crate) struct PrivateKeyProto {
    /// Ed25519 secret followed by the X25519 secret, 64 bytes.
    #[prost(bytes = "vec", tag = "1")]
    pub secret: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub public_key: Option<PublicKeyProto>,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct PrivateKeyBundleProto {
    #[prost(message, optional, tag = "1")]
    pub identity_key: Option<PrivateKeyProto>,
    /// Most recent first.
    #[prost(message, repeated, tag = "2")]
    pub pre_keys: Vec<PrivateKeyProto>,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct PublicKeyBundleProto {
    #[prost(message, optional, tag = "1")]
    pub identity_key: Option<PublicKeyProto>,
    #[prost(message, optional, tag = "2")]
    pub pre_key: Option<PublicKeyProto>,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct Aes256GcmSivHkdfSha256Proto {
    #[prost(bytes = "vec", tag = "1")]
    pub hkdf_salt: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub nonce: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub payload: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct CiphertextProto {
    #[prost(oneof = "ciphertext_proto::Union", tags = "1")]
    pub union: Option<ciphertext_proto::Union>,
}

pub(crate) mod ciphertext_proto {
    use super::{Aes256GcmSivHkdfSha256Proto, Oneof};

    #[derive(Clone, PartialEq, Oneof)]
    pub(crate) enum Union {
        #[prost(message, tag = "1")]
        Aes256GcmSivHkdfSha256(Aes256GcmSivHkdfSha256Proto),
    }
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct EncryptedPrivateKeyBundleProto {
    #[prost(bytes = "vec", tag = "1")]
    pub wallet_pre_key: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub ciphertext: Option<CiphertextProto>,
    #[prost(uint32, tag = "3")]
    pub version: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_ciphertext_variant_decodes_as_empty_union() {
        // Field 9 is not a known variant; it must be skipped, not rejected.
        let bytes = [0x4a, 0x02, 0xaa, 0xbb];
        let proto = CiphertextProto::decode(bytes.as_slice()).unwrap();
        assert!(proto.union.is_none());
    }

    #[test]
    fn test_missing_fields_decode_as_defaults() {
        let proto = EncryptedPrivateKeyBundleProto::decode([].as_slice()).unwrap();
        assert!(proto.wallet_pre_key.is_empty());
        assert!(proto.ciphertext.is_none());
        assert_eq!(proto.version, 0);
    }
}
