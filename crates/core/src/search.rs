use std::collections::BTreeSet;

use crate::transcript::RenderedSegment;

/// Indices of rows whose text contains `term`, ignoring case.
/// An empty term keeps every row.
pub fn filter(rows: &[RenderedSegment], term: &str) -> BTreeSet<usize> {
    let needle = term.to_lowercase();
    rows.iter()
        .filter(|row| row.plain.to_lowercase().contains(&needle))
        .map(|row| row.index)
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{transcript::TranscriptView, types::TranscriptSource};

    fn rows() -> Vec<RenderedSegment> {
        let source = TranscriptSource::from_value(json!([
            { "text": "hello world" },
            { "text": "**Bold** claims" },
            { "text": "nothing here" }
        ]));
        TranscriptView::render(&source).rows().to_vec()
    }

    #[test]
    fn empty_term_keeps_everything() {
        assert_eq!(filter(&rows(), ""), BTreeSet::from([0, 1, 2]));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(filter(&rows(), "HELLO"), BTreeSet::from([0]));
        assert_eq!(filter(&rows(), "bold cl"), BTreeSet::from([1]));
    }

    #[test]
    fn no_match_hides_everything() {
        assert!(filter(&rows(), "zebra").is_empty());
    }
}
