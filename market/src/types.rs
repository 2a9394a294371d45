//! # Item Identity
//!
//! Every listable item in VITRINE is identified by the pair
//! `(collection, token_id)`: the collection an NFT belongs to, and its
//! token number inside that collection. [`ItemKey`] is that pair, used as
//! the map key across the listing registry and the ownership oracle.
//!
//! The canonical text form is `collection#token_id` (e.g. `origins#7`).
//! The `#` separator cannot appear in collection identifiers, which keeps
//! the encoding unambiguous and reversible.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ItemKey
// ---------------------------------------------------------------------------

/// Identity of one listable item: `(collection, token_id)`.
///
/// At most one active listing may exist per key — that uniqueness is
/// enforced by the listing registry, not here. The key itself is plain
/// data: hashable, orderable by its text form, serializable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    /// Collection identifier (the on-network address of the collection).
    pub collection: String,
    /// Token number within the collection.
    pub token_id: u64,
}

impl ItemKey {
    /// Creates a key from a collection identifier and token number.
    pub fn new(collection: impl Into<String>, token_id: u64) -> Self {
        Self {
            collection: collection.into(),
            token_id,
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.collection, self.token_id)
    }
}

/// Errors from parsing the `collection#token_id` text form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItemKeyParseError {
    /// The input has no `#` separator.
    #[error("missing '#' separator in item key")]
    MissingSeparator,

    /// The portion after the last `#` is not a valid token number.
    #[error("invalid token id in item key: {0}")]
    InvalidTokenId(String),
}

impl std::str::FromStr for ItemKey {
    type Err = ItemKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Split on the LAST '#' so token ids stay unambiguous even if a
        // collection identifier ever sneaks one in.
        let (collection, id) = s
            .rsplit_once('#')
            .ok_or(ItemKeyParseError::MissingSeparator)?;
        let token_id = id
            .parse::<u64>()
            .map_err(|_| ItemKeyParseError::InvalidTokenId(id.to_string()))?;
        Ok(Self {
            collection: collection.to_string(),
            token_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Serde helper: serialize HashMap<ItemKey, V> with string keys
// ---------------------------------------------------------------------------

/// Serde helper module for serializing/deserializing `HashMap<ItemKey, V>`
/// as a JSON object with `collection#token_id` string keys.
///
/// JSON requires map keys to be strings, but `ItemKey` is a struct which
/// serde would reject as a map key. This module converts keys to/from
/// their canonical text form so the map serializes correctly.
///
/// # Usage
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct MyStruct {
///     #[serde(with = "crate::types::item_key_map")]
///     listings: HashMap<ItemKey, SomeValue>,
/// }
/// ```
pub mod item_key_map {
    use super::ItemKey;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub fn serialize<V, S>(map: &HashMap<ItemKey, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer,
    {
        use serde::ser::SerializeMap;
        let mut ser_map = serializer.serialize_map(Some(map.len()))?;
        for (key, value) in map {
            ser_map.serialize_entry(&key.to_string(), value)?;
        }
        ser_map.end()
    }

    pub fn deserialize<'de, V, D>(deserializer: D) -> Result<HashMap<ItemKey, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let string_map: HashMap<String, V> = HashMap::deserialize(deserializer)?;
        string_map
            .into_iter()
            .map(|(key, value)| {
                key.parse::<ItemKey>()
                    .map(|k| (k, value))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
