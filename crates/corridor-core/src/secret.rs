//! Secret / hashlock primitives.
//!
//! One secret/hash pair exists per payment route: the hash is committed
//! into every lock along the route, the secret is revealed on-chain by the
//! first withdrawal and then cascades backward hop by hop.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CoreError;

/// Length in bytes of a freshly generated secret.
pub const SECRET_LEN: usize = 16;

/// The preimage of a hashlock.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Generate a fresh random secret.
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The SHA-256 hashlock of this secret.
    pub fn hash(&self) -> HashLock {
        HashLock::digest(&self.0)
    }
}

// Debug intentionally does not print the secret material.
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({} bytes)", self.0.len())
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl FromStr for Secret {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(stripped).map_err(|e| CoreError::InvalidHex(format!("secret: {e}")))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A SHA-256 hashlock committed into a ledger lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashLock(pub [u8; 32]);

impl HashLock {
    /// Hash arbitrary bytes into a hashlock.
    pub fn digest(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether the given secret is the preimage of this hashlock.
    pub fn matches(&self, secret: &Secret) -> bool {
        secret.hash() == *self
    }
}

impl fmt::Display for HashLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for HashLock {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(stripped).map_err(|e| CoreError::InvalidHex(format!("hashlock: {e}")))?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidHex("hashlock: expected 32 bytes".into()))?;
        Ok(Self(array))
    }
}

impl Serialize for HashLock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HashLock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A freshly generated secret together with its hashlock.
#[derive(Debug, Clone)]
pub struct SecretHashPair {
    pub secret: Secret,
    pub hash: HashLock,
}

impl SecretHashPair {
    /// Generate the one secret/hash pair for a payment route.
    pub fn generate() -> Self {
        let secret = Secret::generate();
        let hash = secret.hash();
        Self { secret, hash }
    }
}
