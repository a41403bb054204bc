//! Content stamps for memoizing work over the project tree.
//!
//! This module provides:
//! - `ObjectHash`: a truncated 20-character hash of a serialized value
//! - `Hashable`: computes an `ObjectHash` from a value's JSON serialization
//! - `hash_bytes()`: full hash of arbitrary bytes

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::OBJ_HASH_PREFIX_LEN;

pub type HashError = serde_json::Error;

/// A content hash identifying one version of an object.
///
/// The hash is a 20-character truncated SHA-256 of the JSON-serialized value.
/// Two values with equal hashes are treated as unchanged by the check cache.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl std::fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    let serialized = serde_json::to_string(self)?;
    let full = hash_bytes(serialized.as_bytes());
    Ok(ObjectHash(full[..OBJ_HASH_PREFIX_LEN].to_string()))
  }
}

/// Full lowercase hex SHA-256 of `data`.
pub fn hash_bytes(data: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(data);
  hex::encode(hasher.finalize())
}
