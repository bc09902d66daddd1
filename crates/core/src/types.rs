use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;

use crate::timestamp::TimeValue;

/// A loaded transcript document, resolved once from its JSON shape.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptSource {
    /// A top-level array of records.
    Sequence(Vec<RawRecord>),
    /// An object with a `transcription` array.
    Wrapped(Vec<RawRecord>),
    /// Anything else is a single record.
    Single(RawRecord),
}

impl TranscriptSource {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => {
                TranscriptSource::Sequence(items.into_iter().map(RawRecord::from_value).collect())
            }
            Value::Object(mut map) => match map.remove("transcription") {
                Some(Value::Array(items)) => {
                    TranscriptSource::Wrapped(items.into_iter().map(RawRecord::from_value).collect())
                }
                Some(other) => {
                    map.insert("transcription".to_string(), other);
                    TranscriptSource::Single(RawRecord::from_value(Value::Object(map)))
                }
                None => TranscriptSource::Single(RawRecord::from_value(Value::Object(map))),
            },
            other => TranscriptSource::Single(RawRecord::from_value(other)),
        }
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<Value>(text).map(Self::from_value)
    }

    pub fn records(&self) -> &[RawRecord] {
        match self {
            TranscriptSource::Sequence(records) | TranscriptSource::Wrapped(records) => records,
            TranscriptSource::Single(record) => std::slice::from_ref(record),
        }
    }
}

/// One transcript entry before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    /// A bare string entry.
    Text(String),
    /// An object entry with whichever known fields it carries.
    Fields(RecordFields),
    /// A number or boolean entry, kept as its JSON text.
    Scalar(String),
}

impl RawRecord {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => RawRecord::Text(text),
            Value::Number(n) => RawRecord::Scalar(n.to_string()),
            Value::Bool(b) => RawRecord::Scalar(b.to_string()),
            Value::Object(_) => {
                RawRecord::Fields(serde_json::from_value(value).unwrap_or_default())
            }
            Value::Array(_) | Value::Null => RawRecord::Fields(RecordFields::default()),
        }
    }
}

/// The fields transcript generators are known to emit. A field of an
/// unexpected JSON type is treated as missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecordFields {
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<TimeValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamps: Option<TimestampPair>,
    #[serde(default, deserialize_with = "lenient")]
    pub time: Option<TimeValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub transcript: Option<String>,
}

/// `timestamps: { from, to }` as written by whisper.cpp style output.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TimestampPair {
    #[serde(default, deserialize_with = "lenient")]
    pub from: Option<TimeValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub to: Option<TimeValue>,
}

/// A normalized transcript row. Always derived from a [`RawRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub timestamp_display: String,
    pub text: String,
    pub seek_seconds: Option<f64>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
