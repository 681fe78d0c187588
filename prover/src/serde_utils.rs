//! Serialization utilities for arkworks types.
//!
//! Field elements and scalars are written as hex strings of their canonical
//! compressed (little-endian) arkworks encoding.

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{Deserialize, Deserializer, Serializer};

fn encode<T: CanonicalSerialize>(value: &T) -> Result<String, String> {
    let mut bytes = Vec::new();
    value
        .serialize_compressed(&mut bytes)
        .map_err(|e| format!("Failed to serialize: {}", e))?;
    Ok(hex::encode(bytes))
}

fn decode<T: CanonicalDeserialize>(s: &str) -> Result<T, String> {
    let bytes = hex::decode(s.trim_start_matches("0x")).map_err(|e| format!("Invalid hex: {}", e))?;
    T::deserialize_compressed(&bytes[..]).map_err(|e| format!("Failed to deserialize: {}", e))
}

/// `#[serde(with = "hex_field")]` for a single field element or scalar
pub mod hex_field {
    use super::*;

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: CanonicalSerialize,
        S: Serializer,
    {
        let encoded = encode(value).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: CanonicalDeserialize,
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        decode(&s).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(with = "hex_field_vec")]` for a list of field elements
pub mod hex_field_vec {
    use super::*;
    use serde::ser::SerializeSeq;

    #[allow(clippy::ptr_arg)]
    pub fn serialize<T, S>(values: &Vec<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: CanonicalSerialize,
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            let encoded = encode(value).map_err(serde::ser::Error::custom)?;
            seq.serialize_element(&encoded)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        T: CanonicalDeserialize,
        D: Deserializer<'de>,
    {
        let strings = Vec::<String>::deserialize(deserializer)?;
        strings
            .iter()
            .map(|s| decode(s).map_err(serde::de::Error::custom))
            .collect()
    }
}
