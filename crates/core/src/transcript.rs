use std::{collections::BTreeSet, sync::LazyLock};

use regex::Regex;

use crate::{
    normalize::normalize,
    timestamp::TimeWindow,
    types::{Segment, TranscriptSource},
};

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\*\*(.*?)\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\*(.*?)\*").unwrap());

/// Normalized segments in source order. Re-derived on every call.
pub fn segment_list(source: &TranscriptSource) -> Vec<Segment> {
    source.records().iter().map(normalize).collect()
}

/// A styled run of segment text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text {
        text: String,
        bold: bool,
        italic: bool,
    },
    LineBreak,
}

/// Light markup: newlines break lines, `**x**` is bold, then `*x*` is italic.
pub fn render_markup(text: &str) -> Vec<Inline> {
    // bold pass: strip `**` pairs, remember which chars they enclosed
    let mut chars: Vec<(char, bool)> = Vec::with_capacity(text.len());
    let mut last = 0;
    for caps in BOLD.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        chars.extend(text[last..whole.start()].chars().map(|c| (c, false)));
        chars.extend(inner.as_str().chars().map(|c| (c, true)));
        last = whole.end();
    }
    chars.extend(text[last..].chars().map(|c| (c, false)));

    // italic pass over what is left, `**` pairs already gone
    let stripped: String = chars.iter().map(|(c, _)| *c).collect();
    let spans: Vec<(usize, usize, usize, usize)> = ITALIC
        .captures_iter(&stripped)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let inner = caps.get(1)?;
            Some((whole.start(), whole.end(), inner.start(), inner.end()))
        })
        .collect();

    let mut styled: Vec<(char, bool, bool)> = Vec::with_capacity(chars.len());
    let mut span = spans.iter().peekable();
    for ((offset, c), (_, bold)) in stripped.char_indices().zip(chars.iter()) {
        while span.next_if(|(_, end, _, _)| offset >= *end).is_some() {}
        match span.peek() {
            Some((start, _, inner_start, inner_end)) if offset >= *start => {
                if offset >= *inner_start && offset < *inner_end {
                    styled.push((c, *bold, true));
                }
            }
            _ => styled.push((c, *bold, false)),
        }
    }

    let mut inlines = Vec::new();
    let mut run = String::new();
    let mut style = (false, false);
    for (c, bold, italic) in styled {
        if c == '\n' {
            flush(&mut inlines, &mut run, style);
            inlines.push(Inline::LineBreak);
            continue;
        }
        if (bold, italic) != style {
            flush(&mut inlines, &mut run, style);
            style = (bold, italic);
        }
        run.push(c);
    }
    flush(&mut inlines, &mut run, style);
    inlines
}

fn flush(inlines: &mut Vec<Inline>, run: &mut String, (bold, italic): (bool, bool)) {
    if run.is_empty() {
        return;
    }
    inlines.push(Inline::Text {
        text: std::mem::take(run),
        bold,
        italic,
    });
}

/// Text content of rendered inlines, as a reader would select it.
pub fn plain_text(inlines: &[Inline]) -> String {
    inlines
        .iter()
        .filter_map(|inline| match inline {
            Inline::Text { text, .. } => Some(text.as_str()),
            Inline::LineBreak => None,
        })
        .collect()
}

/// One row of the transcript pane.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSegment {
    pub index: usize,
    pub segment: Segment,
    pub inlines: Vec<Inline>,
    pub plain: String,
    pub window: Option<TimeWindow>,
}

impl RenderedSegment {
    pub fn new(index: usize, segment: Segment) -> Self {
        let inlines = render_markup(&segment.text);
        let plain = plain_text(&inlines);
        let window = TimeWindow::from_display(&segment.timestamp_display);
        Self {
            index,
            segment,
            inlines,
            plain,
            window,
        }
    }

    /// Lines of segment text the row is laid out with.
    pub fn line_count(&self) -> usize {
        1 + self
            .inlines
            .iter()
            .filter(|inline| matches!(inline, Inline::LineBreak))
            .count()
    }
}

/// Rendered transcript with a single active row and a visibility mask.
#[derive(Debug, Clone, Default)]
pub struct TranscriptView {
    rows: Vec<RenderedSegment>,
    visible: Vec<bool>,
    active: Option<usize>,
}

impl TranscriptView {
    pub fn render(source: &TranscriptSource) -> Self {
        let mut view = Self::default();
        view.reload(source);
        view
    }

    /// Empty the pane, then render `source` into it with every row visible.
    pub fn reload(&mut self, source: &TranscriptSource) {
        self.clear();
        self.rows.extend(
            segment_list(source)
                .into_iter()
                .enumerate()
                .map(|(index, segment)| RenderedSegment::new(index, segment)),
        );
        self.visible.resize(self.rows.len(), true);
    }

    pub fn rows(&self) -> &[RenderedSegment] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.get(index).copied().unwrap_or(false)
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &RenderedSegment> {
        self.rows.iter().filter(|row| self.is_visible(row.index))
    }

    /// Activate `index`. Returns `false` when it already was active or does
    /// not exist.
    pub fn select(&mut self, index: usize) -> bool {
        if self.active == Some(index) || index >= self.rows.len() {
            return false;
        }
        self.active = Some(index);
        true
    }

    /// Activate the first row whose time window contains `seconds`.
    /// Leaves the selection alone when nothing matches.
    pub fn select_by_time(&mut self, seconds: f64) -> Option<usize> {
        let index = self
            .rows
            .iter()
            .find(|row| row.window.is_some_and(|w| w.contains(seconds)))
            .map(|row| row.index)?;
        self.select(index);
        Some(index)
    }

    pub fn apply_filter(&mut self, matches: &BTreeSet<usize>) {
        for (index, visible) in self.visible.iter_mut().enumerate() {
            *visible = matches.contains(&index);
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.visible.clear();
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn text(text: &str, bold: bool, italic: bool) -> Inline {
        Inline::Text {
            text: text.into(),
            bold,
            italic,
        }
    }

    fn view(value: serde_json::Value) -> TranscriptView {
        TranscriptView::render(&TranscriptSource::from_value(value))
    }

    #[test]
    fn wrapped_source_keeps_order() {
        let a = json!({ "timestamp": "00:00:01", "text": "a" });
        let b = json!({ "timestamp": "00:00:02", "text": "b" });
        let c = json!("c");
        let source = TranscriptSource::from_value(json!({ "transcription": [a, b, c] }));
        let texts: Vec<_> = segment_list(&source).into_iter().map(|s| s.text).collect();
        assert_eq!(texts, ["a", "b", "c"]);
    }

    #[test]
    fn markup_bold_then_italic() {
        assert_eq!(
            render_markup("say **hi** to *you*"),
            vec![
                text("say ", false, false),
                text("hi", true, false),
                text(" to ", false, false),
                text("you", false, true),
            ]
        );
    }

    #[test]
    fn markup_line_breaks_and_nesting() {
        assert_eq!(
            render_markup("one\n*two **three***"),
            vec![
                text("one", false, false),
                Inline::LineBreak,
                text("two ", false, true),
                text("three", true, true),
            ]
        );
        assert_eq!(render_markup("2 * 3"), vec![text("2 * 3", false, false)]);
    }

    #[test]
    fn line_count_follows_breaks() {
        let pane = view(json!(["one line", "first\nsecond\nthird"]));
        assert_eq!(pane.rows()[0].line_count(), 1);
        assert_eq!(pane.rows()[1].line_count(), 3);
    }

    #[test]
    fn plain_text_drops_markup_and_breaks() {
        assert_eq!(plain_text(&render_markup("**hello**\nworld")), "helloworld");
    }

    #[test]
    fn reselecting_active_row_is_noop() {
        let mut view = view(json!(["a", "b"]));
        assert!(view.select(1));
        assert!(!view.select(1));
        assert_eq!(view.active(), Some(1));
        assert!(!view.select(9));
    }

    #[test]
    fn select_by_time_picks_first_window() {
        let mut view = view(json!([
            { "timestamps": { "from": "00:00:00", "to": "00:00:05" }, "text": "a" },
            { "timestamps": { "from": "00:00:05", "to": "00:00:12" }, "text": "b" },
            { "timestamp": "00:00:06", "text": "c" }
        ]));
        assert_eq!(view.select_by_time(5.0), Some(1));
        assert_eq!(view.active(), Some(1));
        assert_eq!(view.select_by_time(7.5), Some(1));

        assert_eq!(view.select_by_time(400.0), None);
        assert_eq!(view.active(), Some(1));
    }

    #[test]
    fn reload_drops_selection_and_filter() {
        let mut pane = view(json!([
            {"timestamp": 1, "text": "alpha"},
            {"timestamp": 2, "text": "beta"},
        ]));
        pane.select(1);
        pane.apply_filter(&BTreeSet::from([0]));

        pane.reload(&TranscriptSource::from_value(json!(["only row"])));
        assert_eq!(pane.len(), 1);
        assert_eq!(pane.active(), None);
        assert!(pane.is_visible(0));
        assert_eq!(pane.rows()[0].plain, "only row");

        pane.clear();
        assert!(pane.is_empty());
        assert_eq!(pane.visible_rows().count(), 0);
    }

    #[test]
    fn filter_mask_controls_visibility() {
        let mut view = view(json!(["a", "b", "c"]));
        view.apply_filter(&BTreeSet::from([0, 2]));
        assert!(!view.is_visible(1));
        assert_eq!(view.visible_rows().count(), 2);
    }
}
