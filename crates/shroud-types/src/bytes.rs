//! # Opaque Byte Values
//!
//! Newtypes over `Vec<u8>` for every kind of opaque value the system passes
//! around. All of them share the same surface: hex parsing and rendering,
//! random generation, and hex-string serde.

use crate::errors::TypesError;
use rand::RngCore;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Decode a hex string with or without a `0x` prefix.
pub fn decode_hex(value: &str) -> Result<Vec<u8>, TypesError> {
    let trimmed = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    hex::decode(trimmed).map_err(|e| TypesError::InvalidHex {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

macro_rules! opaque_bytes {
    (@common $name:ident) => {
        impl $name {
            /// Wrap raw bytes.
            pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
                Self(bytes.into())
            }

            /// Generate `len` bytes from the thread-local CSPRNG.
            pub fn random(len: usize) -> Self {
                let mut bytes = vec![0u8; len];
                rand::thread_rng().fill_bytes(&mut bytes);
                Self(bytes)
            }

            /// Parse from hex (the `0x` prefix is optional).
            pub fn from_hex(value: &str) -> Result<Self, TypesError> {
                decode_hex(value).map(Self)
            }

            /// Render as `0x`-prefixed lowercase hex.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(&self.0))
            }

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            pub fn into_bytes(self) -> Vec<u8> {
                self.0
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<Vec<u8>> for $name {
            fn from(bytes: Vec<u8>) -> Self {
                Self(bytes)
            }
        }

        impl FromStr for $name {
            type Err = TypesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::from_hex(&raw).map_err(de::Error::custom)
            }
        }
    };

    (secret $(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Default, PartialEq, Eq, Hash)]
        pub struct $name(Vec<u8>);

        opaque_bytes!(@common $name);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("0x<redacted>")
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(<{} bytes redacted>)", stringify!($name), self.0.len())
            }
        }
    };

    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Vec<u8>);

        opaque_bytes!(@common $name);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }
    };
}

opaque_bytes!(
    /// Public identifier of the underlying (non-confidential) asset.
    TokenId
);

opaque_bytes!(
    /// Blinding randomness mixed into a commitment. Unique per state.
    Salt
);

opaque_bytes!(
    /// Commitment over (token id, owner public key, salt).
    Commitment
);

opaque_bytes!(
    /// Public half of an owner's commitment key pair.
    ZkpPublicKey
);

opaque_bytes!(
    secret
    /// Owner secret required to spend or burn a commitment.
    ZkpSecret
);

opaque_bytes!(
    /// On-chain account address.
    Address
);

opaque_bytes!(
    /// Public key addressing a party on the notification channel.
    ChannelPublicKey
);

opaque_bytes!(
    /// Local handle for a notification channel identity.
    IdentityHandle
);
