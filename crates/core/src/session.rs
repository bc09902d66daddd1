//! Viewer state: everything one open video + transcript needs, with no
//! process-wide globals. Front-ends feed it user actions and render from it.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::{
    citation::{AnswerFragment, linkify},
    error::{Result, ScrublineError},
    loader::{MediaBundle, load_transcript},
    playback::Playback,
    qa::{AskConfig, CompletionBackend, ask},
    scroll::{RowBox, RowMetrics, Viewport, center_offset},
    search::filter,
    status::StatusMessage,
    store::CredentialStore,
    transcript::{RenderedSegment, TranscriptView, segment_list},
    types::{Segment, TranscriptSource},
};

pub const LOADED: &str = "Files loaded successfully!";
pub const CREDENTIAL_SAVED: &str = "API key saved successfully!";
pub const PROCESSING: &str = "Processing your question...";

/// A video and its parsed transcript, ready to be shown together.
#[derive(Debug, Clone)]
pub struct LoadedMedia {
    pub video: PathBuf,
    pub source: TranscriptSource,
}

/// Parse the transcript of `bundle`. Nothing is applied until this succeeds.
pub async fn read_bundle(bundle: MediaBundle) -> Result<LoadedMedia> {
    let source = load_transcript(&bundle.transcript).await?;
    Ok(LoadedMedia {
        video: bundle.video,
        source,
    })
}

/// What a click asked the player and the transcript pane to do.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Navigation {
    pub seek: Option<f64>,
    pub highlighted: Option<usize>,
    pub scroll_to: Option<f32>,
}

/// A question that passed validation and is waiting for its answer.
#[derive(Debug, Clone)]
pub struct PendingAsk {
    pub generation: u64,
    pub question: String,
    pub segments: Vec<Segment>,
    pub credential: String,
}

impl PendingAsk {
    pub async fn send<B: CompletionBackend>(self, backend: &B, config: &AskConfig) -> AskOutcome {
        let result = ask(
            backend,
            config,
            &self.question,
            &self.segments,
            Some(&self.credential),
        )
        .await;
        AskOutcome {
            generation: self.generation,
            result,
        }
    }
}

#[derive(Debug)]
pub struct AskOutcome {
    pub generation: u64,
    pub result: Result<String>,
}

#[derive(Debug)]
pub struct Viewer {
    source: Option<TranscriptSource>,
    view: TranscriptView,
    playback: Playback,
    credential: Option<String>,
    status: StatusMessage,
    answer: Option<Vec<AnswerFragment>>,
    search_term: String,
    /// `None` until the front-end reports where the pane is.
    viewport: Option<Viewport>,
    metrics: RowMetrics,
    generation: u64,
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Viewer {
    pub fn new(credential: Option<String>) -> Self {
        Self {
            source: None,
            view: TranscriptView::default(),
            playback: Playback::default(),
            credential,
            status: StatusMessage::default(),
            answer: None,
            search_term: String::new(),
            viewport: None,
            metrics: RowMetrics::default(),
            generation: 0,
        }
    }

    pub fn source(&self) -> Option<&TranscriptSource> {
        self.source.as_ref()
    }

    pub fn view(&self) -> &TranscriptView {
        &self.view
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut Playback {
        &mut self.playback
    }

    pub fn status(&self) -> &StatusMessage {
        &self.status
    }

    pub fn answer(&self) -> Option<&[AnswerFragment]> {
        self.answer.as_deref()
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Asking needs a transcript and a credential.
    pub fn can_ask(&self) -> bool {
        self.source.is_some() && self.credential.is_some()
    }

    /// Re-derived from the source on every call.
    pub fn segments(&self) -> Vec<Segment> {
        self.source.as_ref().map(segment_list).unwrap_or_default()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    pub fn row_metrics(&self) -> RowMetrics {
        self.metrics
    }

    pub fn set_row_metrics(&mut self, metrics: RowMetrics) {
        self.metrics = metrics;
    }

    /// Surface an error in the status slot. Loaded state is left alone.
    pub fn report(&mut self, err: &ScrublineError) {
        debug!(error = %err, "action failed");
        self.status = StatusMessage::error(err.to_string());
    }

    pub fn clear_status(&mut self) {
        self.status = StatusMessage::clear();
    }

    /// Swap in a new video and transcript together.
    pub fn load(&mut self, media: LoadedMedia) {
        info!(
            video = %media.video.display(),
            records = media.source.records().len(),
            "media loaded"
        );
        self.view.reload(&media.source);
        self.source = Some(media.source);
        // a fresh transcript starts scrolled to the top
        if let Some(viewport) = &mut self.viewport {
            viewport.offset = 0.0;
        }
        self.playback = Playback::open(media.video);
        self.search_term.clear();
        self.status = StatusMessage::success(LOADED);
    }

    /// Apply the result of [`read_bundle`]; a failure keeps the previous media.
    pub fn finish_load(&mut self, result: Result<LoadedMedia>) -> bool {
        match result {
            Ok(media) => {
                self.load(media);
                true
            }
            Err(err) => {
                self.report(&err);
                false
            }
        }
    }

    pub fn search(&mut self, term: &str) {
        self.search_term = term.to_string();
        let matches = filter(self.view.rows(), term);
        self.view.apply_filter(&matches);
    }

    /// A click on transcript row `index`: seek if it has a time, then highlight.
    pub fn click_segment(&mut self, index: usize) -> Navigation {
        let Some(row) = self.view.rows().get(index) else {
            return Navigation::default();
        };

        let seek = row.segment.seek_seconds;
        if let Some(seconds) = seek {
            self.playback.seek(seconds);
            self.playback.play();
        }

        let changed = self.view.select(index);
        Navigation {
            seek,
            highlighted: changed.then_some(index),
            scroll_to: if changed { self.scroll_for(index) } else { None },
        }
    }

    /// A click on citation `fragment` of the current answer.
    pub fn click_citation(&mut self, fragment: usize) -> Navigation {
        let seconds = match self.answer.as_ref().and_then(|a| a.get(fragment)) {
            Some(AnswerFragment::Citation {
                seconds: Some(seconds),
                ..
            }) => *seconds,
            _ => return Navigation::default(),
        };

        self.seek_to(seconds)
    }

    /// Jump playback to `seconds` and highlight the row covering it.
    pub fn seek_to(&mut self, seconds: f64) -> Navigation {
        self.playback.seek(seconds);
        self.playback.play();

        let previous = self.view.active();
        let target = self.view.select_by_time(seconds);
        Navigation {
            seek: Some(seconds),
            highlighted: target.filter(|index| previous != Some(*index)),
            scroll_to: target.and_then(|index| self.scroll_for(index)),
        }
    }

    pub fn save_credential(&mut self, store: &CredentialStore, input: &str) -> Result<()> {
        match store.save(input) {
            Ok(credential) => {
                self.credential = Some(credential);
                self.status = StatusMessage::success(CREDENTIAL_SAVED);
                Ok(())
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Validate a question and mark it outstanding. Newer asks supersede
    /// older ones still in flight.
    pub fn begin_ask(&mut self, question: &str) -> Result<PendingAsk> {
        let pending = self.prepare_ask(question);
        match &pending {
            Ok(_) => {
                self.status = StatusMessage::loading(PROCESSING);
                self.answer = None;
            }
            Err(err) => self.report(err),
        }
        pending
    }

    fn prepare_ask(&mut self, question: &str) -> Result<PendingAsk> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ScrublineError::EmptyQuestion);
        }
        let credential = self
            .credential
            .clone()
            .ok_or(ScrublineError::MissingCredential)?;
        if self.source.is_none() {
            return Err(ScrublineError::TranscriptNotLoaded);
        }

        self.generation += 1;
        Ok(PendingAsk {
            generation: self.generation,
            question: question.to_string(),
            segments: self.segments(),
            credential,
        })
    }

    /// Apply an answer. Returns `false` for an answer to a superseded question.
    pub fn finish_ask(&mut self, outcome: AskOutcome) -> bool {
        self.apply_answer(outcome.generation, outcome.result.as_deref())
    }

    pub fn apply_answer(
        &mut self,
        generation: u64,
        result: std::result::Result<&str, &ScrublineError>,
    ) -> bool {
        if generation != self.generation {
            debug!(
                stale = generation,
                latest = self.generation,
                "dropping superseded answer"
            );
            return false;
        }

        match result {
            Ok(answer) => {
                self.answer = Some(linkify(answer));
                self.status = StatusMessage::clear();
            }
            Err(err) => self.report(err),
        }
        true
    }

    fn scroll_for(&self, index: usize) -> Option<f32> {
        let viewport = self.viewport?;
        let row = self.view.rows().get(index)?;
        let above = self
            .view
            .visible_rows()
            .take_while(|above| above.index < index)
            .map(RenderedSegment::line_count);
        center_offset(
            viewport,
            RowBox::stacked(self.metrics, above, row.line_count()),
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::status::StatusKind;

    fn media() -> LoadedMedia {
        LoadedMedia {
            video: PathBuf::from("talk.mp4"),
            source: TranscriptSource::from_value(json!({
                "transcription": [
                    { "timestamps": { "from": "00:00:00,000", "to": "00:00:04,000" }, "text": "Welcome back" },
                    { "timestamps": { "from": "00:00:04,000", "to": "00:01:02,000" }, "text": "Setting up the **cluster**" },
                    { "timestamps": { "from": "00:01:02,000", "to": "00:01:30,000" }, "text": "Deploying" }
                ]
            })),
        }
    }

    fn loaded(credential: Option<&str>) -> Viewer {
        let mut viewer = Viewer::new(credential.map(str::to_string));
        viewer.load(media());
        viewer
    }

    #[test]
    fn load_renders_and_reports_success() {
        let viewer = loaded(None);
        assert_eq!(viewer.view().len(), 3);
        assert_eq!(viewer.status(), &StatusMessage::success(LOADED));
        assert_eq!(viewer.playback().media(), Some(PathBuf::from("talk.mp4").as_path()));
        assert!(!viewer.can_ask());
    }

    #[test]
    fn failed_load_keeps_previous_media() {
        let mut viewer = loaded(None);
        let applied = viewer.finish_load(Err(ScrublineError::Parse {
            reason: "expected value".into(),
        }));
        assert!(!applied);
        assert_eq!(viewer.view().len(), 3);
        assert_eq!(viewer.playback().media(), Some(PathBuf::from("talk.mp4").as_path()));
        assert_eq!(viewer.status().kind, StatusKind::Error);
        assert_eq!(viewer.status().text, "Error loading transcript: expected value");
    }

    #[test]
    fn clicking_a_row_seeks_and_highlights_once() {
        let mut viewer = loaded(None);
        viewer.set_viewport(Viewport {
            offset: 0.0,
            height: 1000.0,
        });

        let first = viewer.click_segment(1);
        assert_eq!(first.seek, Some(4.0));
        assert_eq!(first.highlighted, Some(1));
        assert_eq!(first.scroll_to, None);
        assert!(viewer.playback().is_playing());

        viewer.playback_mut().seek(30.0);
        let again = viewer.click_segment(1);
        assert_eq!(again.seek, Some(4.0));
        assert_eq!(again.highlighted, None);
        assert_eq!(again.scroll_to, None);
        assert_eq!(viewer.playback().position(), 4.0);
    }

    #[test]
    fn offscreen_row_is_centered() {
        let mut viewer = loaded(None);
        viewer.set_row_metrics(RowMetrics {
            line_height: 50.0,
            chrome: 50.0,
            spacing: 0.0,
        });
        viewer.set_viewport(Viewport {
            offset: 0.0,
            height: 150.0,
        });
        let nav = viewer.click_segment(2);
        assert_eq!(nav.scroll_to, Some(175.0));
    }

    #[test]
    fn no_scroll_before_the_pane_reports_its_viewport() {
        let mut viewer = loaded(None);
        let nav = viewer.click_segment(0);
        assert_eq!(nav.highlighted, Some(0));
        assert_eq!(nav.scroll_to, None);

        let nav = viewer.click_segment(2);
        assert_eq!(nav.highlighted, Some(2));
        assert_eq!(nav.scroll_to, None);
    }

    #[test]
    fn taller_rows_shift_the_centering_offset() {
        let mut viewer = Viewer::new(None);
        viewer.load(LoadedMedia {
            video: PathBuf::from("talk.mp4"),
            source: TranscriptSource::from_value(json!(["a\nb\nc\nd", "x", "y"])),
        });
        viewer.set_row_metrics(RowMetrics {
            line_height: 20.0,
            chrome: 20.0,
            spacing: 0.0,
        });
        viewer.set_viewport(Viewport {
            offset: 0.0,
            height: 100.0,
        });

        // row 2 sits below a 100px four-line row and a 40px row
        assert_eq!(viewer.click_segment(2).scroll_to, Some(110.0));
    }

    #[test]
    fn hidden_rows_do_not_count_toward_the_offset() {
        let mut viewer = loaded(None);
        viewer.set_row_metrics(RowMetrics {
            line_height: 50.0,
            chrome: 50.0,
            spacing: 0.0,
        });
        viewer.set_viewport(Viewport {
            offset: 0.0,
            height: 150.0,
        });
        viewer.search("deploy");
        assert_eq!(viewer.click_segment(2).scroll_to, None);
    }

    #[test]
    fn search_hides_rows_without_touching_selection() {
        let mut viewer = loaded(None);
        viewer.click_segment(0);
        viewer.search("CLUSTER");
        assert_eq!(viewer.search_term(), "CLUSTER");
        assert!(viewer.view().is_visible(1));
        assert!(!viewer.view().is_visible(0));
        assert_eq!(viewer.view().active(), Some(0));
        viewer.search("");
        assert_eq!(viewer.view().visible_rows().count(), 3);
    }

    #[test]
    fn ask_validation_order() {
        let mut viewer = loaded(None);
        assert!(matches!(viewer.begin_ask("  "), Err(ScrublineError::EmptyQuestion)));
        assert_eq!(viewer.status().text, "Please enter a question");
        assert!(matches!(viewer.begin_ask("why?"), Err(ScrublineError::MissingCredential)));
        assert_eq!(viewer.status().text, "Please enter your OpenAI API key");

        let mut empty = Viewer::new(Some("sk".into()));
        assert!(matches!(empty.begin_ask("why?"), Err(ScrublineError::TranscriptNotLoaded)));
    }

    #[test]
    fn answer_links_citations_and_clears_status() {
        let mut viewer = loaded(Some("sk"));
        let pending = viewer.begin_ask("when do we deploy?").unwrap();
        assert_eq!(viewer.status(), &StatusMessage::loading(PROCESSING));
        assert_eq!(pending.segments.len(), 3);

        let applied = viewer.finish_ask(AskOutcome {
            generation: pending.generation,
            result: Ok("Deploying starts at [00:01:02,000 - 00:01:30,000].".into()),
        });
        assert!(applied);
        assert!(!viewer.status().is_visible());

        let nav = viewer.click_citation(1);
        assert_eq!(nav.seek, Some(62.0));
        assert_eq!(nav.highlighted, Some(2));
        assert_eq!(viewer.view().active(), Some(2));
        assert_eq!(viewer.playback().position(), 62.0);

        assert_eq!(viewer.click_citation(0), Navigation::default());
    }

    #[test]
    fn seeking_outside_every_window_keeps_selection() {
        let mut viewer = loaded(None);
        viewer.click_segment(0);
        let nav = viewer.seek_to(500.0);
        assert_eq!(nav.highlighted, None);
        assert_eq!(viewer.view().active(), Some(0));
        assert_eq!(viewer.playback().position(), 500.0);
    }

    #[test]
    fn reseeking_inside_the_active_row_only_scrolls() {
        let mut viewer = loaded(None);
        viewer.click_segment(2);
        viewer.set_viewport(Viewport {
            offset: 0.0,
            height: 50.0,
        });

        let nav = viewer.seek_to(70.0);
        assert_eq!(nav.seek, Some(70.0));
        assert_eq!(nav.highlighted, None);
        assert!(nav.scroll_to.is_some());
        assert_eq!(viewer.view().active(), Some(2));
    }

    #[test]
    fn superseded_answers_are_dropped() {
        let mut viewer = loaded(Some("sk"));
        let first = viewer.begin_ask("first?").unwrap();
        let second = viewer.begin_ask("second?").unwrap();

        assert!(viewer.finish_ask(AskOutcome {
            generation: second.generation,
            result: Ok("second answer".into()),
        }));
        assert!(!viewer.finish_ask(AskOutcome {
            generation: first.generation,
            result: Ok("first answer".into()),
        }));
        assert_eq!(
            viewer.answer(),
            Some(&[AnswerFragment::Text("second answer".into())][..])
        );
    }

    #[test]
    fn upstream_failure_keeps_transcript() {
        let mut viewer = loaded(Some("sk"));
        let pending = viewer.begin_ask("q").unwrap();
        viewer.finish_ask(AskOutcome {
            generation: pending.generation,
            result: Err(ScrublineError::Upstream {
                message: "bad key".into(),
            }),
        });
        assert_eq!(viewer.status(), &StatusMessage::error("Error: bad key"));
        assert!(viewer.answer().is_none());
        assert_eq!(viewer.view().len(), 3);
    }

    #[test]
    fn shared_errors_apply_by_reference() {
        let mut viewer = loaded(Some("sk"));
        let pending = viewer.begin_ask("q").unwrap();
        let err = std::sync::Arc::new(ScrublineError::Upstream {
            message: "rate limited".into(),
        });

        assert!(viewer.apply_answer(pending.generation, Err(&*err)));
        assert_eq!(viewer.status().kind, StatusKind::Error);
        assert_eq!(viewer.status().text, "Error: rate limited");
    }

    #[test]
    fn saving_a_credential_enables_asking() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("settings.json"));
        let mut viewer = loaded(None);

        assert!(viewer.save_credential(&store, " ").is_err());
        assert_eq!(viewer.status().text, "Please enter a valid API key");

        viewer.save_credential(&store, "sk-live").unwrap();
        assert_eq!(viewer.credential(), Some("sk-live"));
        assert_eq!(viewer.status(), &StatusMessage::success(CREDENTIAL_SAVED));
        assert!(viewer.can_ask());
    }
}
