//! Serialization helpers for optional Duration fields.
//!
//! Provides serde serialization for `Option<std::time::Duration>` as milliseconds.

use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Serialize an optional Duration as milliseconds, or `null`.
pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match duration {
        Some(duration) => {
            let millis = u64::try_from(duration.as_millis())
                .map_err(|_| S::Error::custom("duration exceeds u64 milliseconds"))?;
            serializer.serialize_some(&millis)
        }
        None => serializer.serialize_none(),
    }
}

/// Deserialize an optional Duration from milliseconds.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = Option::<u64>::deserialize(deserializer)?;
    Ok(millis.map(Duration::from_millis))
}
