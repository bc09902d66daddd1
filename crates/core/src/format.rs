use crate::{
    timestamp::format_seconds,
    types::Segment,
};

/// Flatten segments into `[timestamp] text` pieces joined by single spaces.
pub fn format_context(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|seg| format!("[{}] {}", seg.timestamp_display, seg.text))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Short label for a playback position, e.g. `▶ 01:02:03`.
pub fn format_position(seconds: f64, playing: bool) -> String {
    let marker = if playing { '▶' } else { '⏸' };
    format!("{} {}", marker, format_seconds(seconds))
}
