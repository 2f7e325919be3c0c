use crate::session::Error;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;

/// The typed view of a session payload.
///
/// A session is a set of named fields, each holding a separately encoded value.
/// The whole map is encoded with the crate's codec (`bincode` by default,
/// MessagePack with the `messagepack` feature) and then as URL-safe base64, which
/// gives the opaque string handed to [`SessionStore::write`](crate::SessionStore::write).
///
/// An empty state encodes to an empty payload, which the store refuses to
/// persist.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    fields: BTreeMap<String, Vec<u8>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a payload produced by [`encode`](Self::encode).
    pub fn decode(payload: &str) -> Result<Self, Error> {
        if payload.is_empty() {
            return Ok(Self::default());
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|err| Error::Decode(err.to_string()))?;
        let fields = deserialize_value(&bytes)?;

        Ok(Self { fields })
    }

    pub fn encode(&self) -> Result<String, Error> {
        if self.fields.is_empty() {
            return Ok(String::new());
        }

        let bytes = serialize_value(&self.fields)?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn get<T>(&self, field: &str) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
    {
        self.fields
            .get(field)
            .map(|bytes| deserialize_value(bytes))
            .transpose()
    }

    pub fn insert<T>(&mut self, field: &str, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        self.fields.insert(field.to_string(), serialize_value(value)?);
        Ok(())
    }

    /// Returns `true` if the field was present.
    pub fn remove(&mut self, field: &str) -> bool {
        self.fields.remove(field).is_some()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(feature = "bincode")]
fn serialize_value<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| Error::Encode(e.to_string()))
}

#[cfg(feature = "bincode")]
fn deserialize_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map(|(value, _)| value)
        .map_err(|e| Error::Decode(e.to_string()))
}

#[cfg(feature = "messagepack")]
fn serialize_value<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
    rmp_serde::to_vec(value).map_err(|e| Error::Encode(e.to_string()))
}

#[cfg(feature = "messagepack")]
fn deserialize_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    rmp_serde::from_slice(bytes).map_err(|e| Error::Decode(e.to_string()))
}
