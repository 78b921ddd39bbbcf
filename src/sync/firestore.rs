//! Typed Firestore REST document schema.
//!
//! Only what this crate writes is modelled field-by-field. Entries already
//! in a remote document are carried through as raw JSON so a merge can never
//! reshape data it did not produce.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::ResultRecord;

pub const AVG_RESPONSE_TIME: &str = "avg_response_time";
pub const MIN_RESPONSE_TIME: &str = "min_response_time";
pub const MAX_RESPONSE_TIME: &str = "max_response_time";
pub const SCORE: &str = "score";
pub const TIMESTAMP: &str = "timestamp";
pub const HIT_COUNT: &str = "hit_count";
pub const MISS_COUNT: &str = "miss_count";

/// A Firestore value, externally tagged by kind (`{"doubleValue": 1.5}`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum FieldValue {
    NullValue(()),
    BooleanValue(bool),
    /// int64 travels as a decimal string.
    IntegerValue(String),
    DoubleValue(f64),
    StringValue(String),
    TimestampValue(String),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl FieldValue {
    pub fn null() -> Self {
        FieldValue::NullValue(())
    }

    pub fn integer(value: impl Into<i64>) -> Self {
        FieldValue::IntegerValue(value.into().to_string())
    }

    #[cfg(test)]
    fn as_u32(&self) -> Option<u32> {
        match self {
            FieldValue::IntegerValue(raw) => raw.parse().ok(),
            _ => None,
        }
    }

    #[cfg(test)]
    fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::DoubleValue(value) => Some(*value),
            FieldValue::IntegerValue(raw) => raw.parse().ok(),
            _ => None,
        }
    }
}

/// Document as returned by `GET .../documents/{collection}/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default)]
    pub update_time: Option<String>,
}

/// One top-level field of an outgoing document.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum DocumentField {
    /// Already stored remotely; written back verbatim.
    Existing(Value),
    Session(FieldValue),
}

/// PATCH body: the full merged field set.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentWrite<'a> {
    pub fields: &'a BTreeMap<String, DocumentField>,
}

/// Embeds `record` as a `mapValue`. Absent statistics become `nullValue`.
pub fn encode_record(record: &ResultRecord) -> FieldValue {
    let mut fields = BTreeMap::new();
    fields.insert(
        AVG_RESPONSE_TIME.to_string(),
        record.avg_ms.map_or_else(FieldValue::null, FieldValue::DoubleValue),
    );
    fields.insert(SCORE.to_string(), FieldValue::DoubleValue(record.score));
    fields.insert(
        MIN_RESPONSE_TIME.to_string(),
        record.min_ms.map_or_else(FieldValue::null, |ms| FieldValue::integer(ms)),
    );
    fields.insert(
        MAX_RESPONSE_TIME.to_string(),
        record.max_ms.map_or_else(FieldValue::null, |ms| FieldValue::integer(ms)),
    );
    fields.insert(
        TIMESTAMP.to_string(),
        FieldValue::StringValue(record.timestamp.clone()),
    );
    fields.insert(HIT_COUNT.to_string(), FieldValue::integer(record.hit_count));
    fields.insert(MISS_COUNT.to_string(), FieldValue::integer(record.miss_count));

    FieldValue::MapValue(MapValue { fields })
}

/// Reads back an entry written by [`encode_record`].
///
/// Returns `None` for entries in any other shape.
#[cfg(test)]
pub(crate) fn decode_record(value: &Value) -> Option<ResultRecord> {
    let FieldValue::MapValue(map) = FieldValue::deserialize(value).ok()? else {
        return None;
    };
    let field = |name: &str| map.fields.get(name);

    let timestamp = match field(TIMESTAMP)? {
        FieldValue::StringValue(timestamp) => timestamp.clone(),
        _ => return None,
    };

    Some(ResultRecord {
        timestamp,
        hit_count: field(HIT_COUNT).and_then(FieldValue::as_u32).unwrap_or(0),
        miss_count: field(MISS_COUNT).and_then(FieldValue::as_u32).unwrap_or(0),
        min_ms: field(MIN_RESPONSE_TIME).and_then(FieldValue::as_u32),
        max_ms: field(MAX_RESPONSE_TIME).and_then(FieldValue::as_u32),
        avg_ms: field(AVG_RESPONSE_TIME).and_then(FieldValue::as_f64),
        score: field(SCORE).and_then(FieldValue::as_f64)?,
    })
}

/// Inserts `record` under `session_key`, keeping every other entry as-is.
pub fn merge_session(
    existing: BTreeMap<String, Value>,
    session_key: &str,
    record: &ResultRecord,
) -> BTreeMap<String, DocumentField> {
    let mut merged: BTreeMap<String, DocumentField> = existing
        .into_iter()
        .map(|(key, value)| (key, DocumentField::Existing(value)))
        .collect();
    merged.insert(
        session_key.to_string(),
        DocumentField::Session(encode_record(record)),
    );
    merged
}
