use std::sync::LazyLock;

use regex::Regex;

use crate::timestamp::{parse_precise, split_range};

static CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(\d{2}:\d{2}:\d{2}(?:,\d{3})?(?:\s*-\s*\d{2}:\d{2}:\d{2}(?:,\d{3})?)?)\]")
        .unwrap()
});

/// A piece of an answer: plain text or a clickable timestamp citation.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerFragment {
    Text(String),
    Citation {
        /// The bracketed text exactly as it appeared.
        label: String,
        /// Start of the cited range, e.g. `00:01:02,500`.
        start: String,
        /// `start` in seconds; `None` means clicking does nothing.
        seconds: Option<f64>,
    },
}

/// Split an answer into text and citations of the form `[HH:MM:SS]`,
/// `[HH:MM:SS,mmm]` or a `[start - end]` range of those.
pub fn linkify(answer: &str) -> Vec<AnswerFragment> {
    let mut fragments = Vec::new();
    let mut last = 0;

    for caps in CITATION.captures_iter(answer) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            fragments.push(AnswerFragment::Text(answer[last..whole.start()].to_string()));
        }
        let (start, _) = split_range(inner.as_str());
        fragments.push(AnswerFragment::Citation {
            label: whole.as_str().to_string(),
            start: start.to_string(),
            seconds: parse_precise(start),
        });
        last = whole.end();
    }

    if last < answer.len() {
        fragments.push(AnswerFragment::Text(answer[last..].to_string()));
    }
    fragments
}
