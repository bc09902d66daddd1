use crate::{
    timestamp::TimeValue,
    types::{RawRecord, RecordFields, Segment},
};

/// Normalize one transcript record.
///
/// Field priority is fixed: display comes from `timestamp`, then
/// `timestamps.{from,to}`, then `time`; text from `text`, then `content`, then
/// `transcript`. Seek time is the numeric display value, then a numeric
/// `timestamp`, then the parsed `timestamps.from`.
pub fn normalize(record: &RawRecord) -> Segment {
    let fields = match record {
        RawRecord::Text(text) | RawRecord::Scalar(text) => {
            return Segment {
                timestamp_display: String::new(),
                text: text.clone(),
                seek_seconds: None,
            };
        }
        RawRecord::Fields(fields) => fields,
    };

    let label = resolve_label(fields);

    let seek_seconds = label
        .as_ref()
        .and_then(TimeValue::as_seconds)
        .or_else(|| fields.timestamp.as_ref().and_then(TimeValue::as_seconds))
        .or_else(|| {
            fields
                .timestamps
                .as_ref()
                .and_then(|pair| pair.from.as_ref())
                .map(TimeValue::seconds)
        });

    Segment {
        timestamp_display: label.map(|l| l.display()).unwrap_or_default(),
        text: resolve_text(fields),
        seek_seconds,
    }
}

fn resolve_label(fields: &RecordFields) -> Option<TimeValue> {
    if let Some(timestamp) = fields.timestamp.as_ref().filter(|t| t.is_present()) {
        return Some(timestamp.clone());
    }

    if let Some(pair) = &fields.timestamps {
        let side = |v: &Option<TimeValue>| v.as_ref().map(ToString::to_string).unwrap_or_default();
        return Some(TimeValue::Text(format!(
            "{} - {}",
            side(&pair.from),
            side(&pair.to)
        )));
    }

    fields.time.clone().filter(TimeValue::is_present)
}

fn resolve_text(fields: &RecordFields) -> String {
    [&fields.text, &fields.content, &fields.transcript]
        .into_iter()
        .flatten()
        .find(|text| !text.is_empty())
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn norm(value: serde_json::Value) -> Segment {
        normalize(&RawRecord::from_value(value))
    }

    #[test]
    fn whisper_style_record() {
        let segment = norm(json!({
            "timestamps": { "from": "00:00:05", "to": "00:00:10" },
            "content": "hi"
        }));
        assert_eq!(segment.text, "hi");
        assert_eq!(segment.timestamp_display, "00:00:05 - 00:00:10");
        assert_eq!(segment.seek_seconds, Some(5.0));
    }

    #[test]
    fn bare_string_record() {
        let segment = norm(json!("hello"));
        assert_eq!(
            segment,
            Segment {
                timestamp_display: String::new(),
                text: "hello".into(),
                seek_seconds: None,
            }
        );
    }

    #[test]
    fn numeric_timestamp_is_formatted_and_seekable() {
        let segment = norm(json!({ "timestamp": 75, "text": "numbers" }));
        assert_eq!(segment.timestamp_display, "01:15");
        assert_eq!(segment.seek_seconds, Some(75.0));
    }

    #[test]
    fn zero_timestamp_is_a_real_start() {
        let segment = norm(json!({
            "timestamp": 0,
            "time": "00:00:09",
            "text": "opening"
        }));
        assert_eq!(segment.timestamp_display, "00:00");
        assert_eq!(segment.seek_seconds, Some(0.0));
    }

    #[test]
    fn timestamp_beats_timestamps_and_time() {
        let segment = norm(json!({
            "timestamp": "00:01:00",
            "timestamps": { "from": "00:00:05", "to": "00:00:10" },
            "time": 3,
            "text": "first wins"
        }));
        assert_eq!(segment.timestamp_display, "00:01:00");
        // A textual `timestamp` is not itself a seek target; `timestamps.from` is.
        assert_eq!(segment.seek_seconds, Some(5.0));
    }

    #[test]
    fn time_field_is_last_resort() {
        let segment = norm(json!({ "time": 12.5, "transcript": "late" }));
        assert_eq!(segment.timestamp_display, "00:12");
        assert_eq!(segment.seek_seconds, Some(12.5));
        assert_eq!(segment.text, "late");

        let unseekable = norm(json!({ "time": "intro", "text": "words" }));
        assert_eq!(unseekable.timestamp_display, "intro");
        assert_eq!(unseekable.seek_seconds, None);
    }

    #[test]
    fn empty_text_falls_through() {
        let segment = norm(json!({ "text": "", "content": "", "transcript": "third" }));
        assert_eq!(segment.text, "third");
        assert_eq!(norm(json!({})).text, "");
    }

    #[test]
    fn normalization_is_deterministic() {
        let record = RawRecord::from_value(json!({ "timestamps": { "from": "00:00:01,250", "to": "00:00:02" }, "text": "x" }));
        assert_eq!(normalize(&record), normalize(&record));
        assert_eq!(normalize(&record).seek_seconds, Some(1.25));
    }
}
