//! Pagination cursors
//!
//! Cursors are opaque to callers: a store continuation key serialized as
//! `{"PK":..,"SK":..}` JSON, or for the month list the bare period, each
//! wrapped in URL-safe base64 without padding.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::{PassbookResult, ValidationError};
use crate::models::Period;

use super::store::Key;

#[derive(Debug, Serialize, Deserialize)]
struct CursorKey {
    #[serde(rename = "PK")]
    pk: String,
    #[serde(rename = "SK")]
    sk: String,
}

/// Encode a continuation key as an opaque cursor
pub fn encode_cursor(key: &Key) -> PassbookResult<String> {
    let json = serde_json::to_vec(&CursorKey {
        pk: key.pk.clone(),
        sk: key.sk.clone(),
    })?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a cursor produced by [`encode_cursor`]
pub fn decode_cursor(token: &str) -> Result<Key, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidCursor(reason.to_string());

    let bytes = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|_| invalid("not base64url"))?;
    let decoded: CursorKey =
        serde_json::from_slice(&bytes).map_err(|_| invalid("not a continuation key"))?;
    if decoded.pk.is_empty() || decoded.sk.is_empty() {
        return Err(invalid("empty key component"));
    }
    Ok(Key::new(decoded.pk, decoded.sk))
}

pub fn encode_month_cursor(period: Period) -> String {
    URL_SAFE_NO_PAD.encode(period.to_string())
}

pub fn decode_month_cursor(token: &str) -> Result<Period, ValidationError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|_| ValidationError::InvalidCursor("not base64url".into()))?;
    let raw = String::from_utf8(bytes)
        .map_err(|_| ValidationError::InvalidCursor("not a month".into()))?;
    Period::parse(&raw).map_err(|_| ValidationError::InvalidCursor("not a month".into()))
}
