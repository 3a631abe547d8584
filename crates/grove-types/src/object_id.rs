use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Length of an object id in bytes.
pub const ID_LEN: usize = 32;

/// Content-addressed identifier for an object in the graph.
///
/// An `ObjectId` is a BLAKE3 digest: identical content always hashes to the
/// same id, so objects dedup by identity and references are verifiable. Ids
/// are cheap to copy and usable as map/set keys everywhere.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId([u8; ID_LEN]);

impl ObjectId {
    /// Hash raw content into an id.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Wrap a pre-computed digest.
    pub const fn from_hash(digest: [u8; ID_LEN]) -> Self {
        Self(digest)
    }

    /// The null id (all zeros), meaning "no object".
    pub const fn null() -> Self {
        Self([0u8; ID_LEN])
    }

    /// Returns `true` for the null id.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; ID_LEN]
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// Full hex form (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated hex form for log lines (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse a full hex string back into an id.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; ID_LEN] = bytes.try_into().map_err(|v: Vec<u8>| TypeError::InvalidLength {
            expected: ID_LEN,
            actual: v.len(),
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; ID_LEN]> for ObjectId {
    fn from(digest: [u8; ID_LEN]) -> Self {
        Self(digest)
    }
}

impl From<ObjectId> for [u8; ID_LEN] {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}
