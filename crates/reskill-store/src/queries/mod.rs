//! Typed document operations on top of [`crate::Store`].

pub mod plans;
pub mod profiles;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StoreError;

/// Decode a stored value, attributing shape errors to `path`.
pub(crate) fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|source| StoreError::Shape {
        path: path.to_owned(),
        source,
    })
}
