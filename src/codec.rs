//! Serialization for the JSON-discipline cache entry.
//!
//! A stable textual representation carrying `value`, `expire` and `duration`;
//! absent fields are encoded as `null`. This is an internal wire format —
//! callers of the HTTP API never see it directly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    pub value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl Entry {
    pub fn new(value: serde_json::Value, expire: Option<f64>, duration: Option<String>) -> Self {
        Self {
            value,
            expire,
            duration,
        }
    }

    pub fn is_live(&self, now: f64) -> bool {
        match self.expire {
            Some(expire) => expire > now,
            None => true,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        // `Entry` only ever holds JSON-representable data, so this cannot fail.
        serde_json::to_vec(self).expect("entry is always JSON-serializable")
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let entry: Entry = serde_json::from_slice(bytes).map_err(|e| DecodeError(e.to_string()))?;
        if let Some(duration) = &entry.duration {
            crate::duration::resolve(duration).map_err(|e| DecodeError(e.to_string()))?;
        }
        Ok(entry)
    }
}

#[derive(Debug, Clone)]
pub struct DecodeError(pub String);

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to decode cache entry: {}", self.0)
    }
}

impl std::error::Error for DecodeError {}
