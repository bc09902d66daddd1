use std::path::PathBuf;
use std::sync::Arc;

use iced::widget::scrollable::AbsoluteOffset;
use iced::widget::{
    Id, button, column, container, operation, row, scrollable, text, text_input,
};
use iced::{Alignment, Color, Element, Font, Length, Pixels, Task, font};
use scrubline_core::scroll::{RowMetrics, Viewport};
use scrubline_core::{
    AnswerFragment, AskConfig, CredentialStore, HttpBackend, Inline, LoadedMedia, MediaBundle,
    Navigation, RenderedSegment, ScrublineError, StatusKind, Viewer, format_position,
    read_bundle, resolve_credential,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

const ROW_PADDING: u16 = 5;
const LABEL_LINE_HEIGHT: f32 = 16.0;
const LABEL_GAP: f32 = 4.0;

/// Label, gap and padding, with room to spare for the button border.
const ROW_METRICS: RowMetrics = RowMetrics {
    line_height: 22.0,
    chrome: LABEL_LINE_HEIGHT + LABEL_GAP + 2.0 * ROW_PADDING as f32 + 4.0,
    spacing: 4.0,
};

fn main() -> iced::Result {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    iced::application(App::new, App::update, App::view)
        .title("Scrubline")
        .window_size((1200.0, 800.0))
        .run()
}

fn transcript_id() -> Id {
    Id::new("transcript")
}

struct App {
    viewer: Viewer,
    store: Option<CredentialStore>,
    config: AskConfig,
    backend: HttpBackend,
    folder: String,
    question: String,
    key_input: String,
    key_panel_open: bool,
    key_visible: bool,
}

#[derive(Debug, Clone)]
enum Message {
    FolderChanged(String),
    OpenFolder,
    Loaded(Result<LoadedMedia, Arc<ScrublineError>>),
    SearchChanged(String),
    SegmentClicked(usize),
    TranscriptScrolled(scrollable::Viewport),
    TogglePlayback,
    QuestionChanged(String),
    Ask,
    Answered(u64, Result<String, Arc<ScrublineError>>),
    CitationClicked(usize),
    ToggleKeyPanel,
    ToggleKeyVisibility,
    KeyChanged(String),
    SaveKey,
}

impl App {
    fn new() -> (Self, Task<Message>) {
        let config = AskConfig::from_env();
        let store = CredentialStore::open_default()
            .inspect_err(|err| warn!(error = %err, "credential store unavailable"))
            .ok();
        let stored = store.as_ref().and_then(|store| {
            store
                .load()
                .inspect_err(|err| warn!(error = %err, "could not read stored credential"))
                .ok()
                .flatten()
        });
        let credential = resolve_credential(stored, &config.provider);

        let mut viewer = Viewer::new(credential.clone());
        viewer.set_row_metrics(ROW_METRICS);

        let folder = std::env::args().nth(1).unwrap_or_default();
        let open_on_start = !folder.is_empty();

        let mut app = Self {
            viewer,
            store,
            config,
            backend: HttpBackend::default(),
            folder,
            question: String::new(),
            key_input: credential.unwrap_or_default(),
            key_panel_open: false,
            key_visible: false,
        };

        let task = if open_on_start {
            app.update(Message::OpenFolder)
        } else {
            Task::none()
        };
        (app, task)
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::FolderChanged(folder) => self.folder = folder,
            Message::OpenFolder => {
                let dir = PathBuf::from(self.folder.trim());
                match MediaBundle::from_dir(&dir) {
                    Ok(bundle) => {
                        return Task::perform(read_bundle(bundle), |result| {
                            Message::Loaded(result.map_err(Arc::new))
                        });
                    }
                    Err(err) => self.viewer.report(&err),
                }
            }
            Message::Loaded(result) => match result {
                Ok(media) => {
                    self.viewer.load(media);
                    self.question.clear();
                    return operation::scroll_to(transcript_id(), AbsoluteOffset { x: 0.0, y: 0.0 });
                }
                Err(err) => self.viewer.report(&err),
            },
            Message::SearchChanged(term) => self.viewer.search(&term),
            Message::SegmentClicked(index) => {
                let nav = self.viewer.click_segment(index);
                return scroll_task(nav);
            }
            // The viewer never scrolls the pane before this first arrives.
            Message::TranscriptScrolled(viewport) => {
                self.viewer.set_viewport(Viewport {
                    offset: viewport.absolute_offset().y,
                    height: viewport.bounds().height,
                });
            }
            Message::TogglePlayback => {
                let playback = self.viewer.playback_mut();
                if playback.is_playing() {
                    playback.pause();
                } else {
                    playback.play();
                }
            }
            Message::QuestionChanged(question) => self.question = question,
            Message::Ask => {
                // Validation failures already landed in the status line.
                if let Ok(pending) = self.viewer.begin_ask(&self.question) {
                    let backend = self.backend.clone();
                    let config = self.config.clone();
                    return Task::perform(
                        async move { pending.send(&backend, &config).await },
                        |outcome| {
                            Message::Answered(outcome.generation, outcome.result.map_err(Arc::new))
                        },
                    );
                }
            }
            Message::Answered(generation, result) => {
                self.viewer
                    .apply_answer(generation, result.as_deref().map_err(|err| &**err));
            }
            Message::CitationClicked(fragment) => {
                let nav = self.viewer.click_citation(fragment);
                return scroll_task(nav);
            }
            Message::ToggleKeyPanel => self.key_panel_open = !self.key_panel_open,
            Message::ToggleKeyVisibility => self.key_visible = !self.key_visible,
            Message::KeyChanged(key) => self.key_input = key,
            Message::SaveKey => match &self.store {
                Some(store) => {
                    if self.viewer.save_credential(store, &self.key_input).is_ok() {
                        self.key_input = self.key_input.trim().to_string();
                        self.key_panel_open = false;
                    }
                }
                None => self.viewer.report(&ScrublineError::NoSettingsDir),
            },
        }
        Task::none()
    }

    fn view(&self) -> Element<'_, Message> {
        let header = row![
            text("Scrubline").size(24),
            text_input("Folder with a video and its transcript...", &self.folder)
                .on_input(Message::FolderChanged)
                .on_submit(Message::OpenFolder),
            button("Open").on_press(Message::OpenFolder),
            button(if self.key_panel_open { "Close" } else { "API key" })
                .style(button::secondary)
                .on_press(Message::ToggleKeyPanel),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let mut page = column![header].spacing(12).padding(20);
        if self.key_panel_open {
            page = page.push(self.key_panel());
        }

        let body = row![
            column![self.player(), self.questions()]
                .spacing(12)
                .width(Length::FillPortion(2)),
            self.transcript().width(Length::FillPortion(3)),
        ]
        .spacing(16)
        .height(Length::Fill);

        page.push(body).push(self.status_line()).into()
    }

    fn key_panel(&self) -> Element<'_, Message> {
        row![
            text_input("sk-...", &self.key_input)
                .secure(!self.key_visible)
                .on_input(Message::KeyChanged)
                .on_submit(Message::SaveKey),
            button(if self.key_visible { "Hide" } else { "Show" })
                .style(button::secondary)
                .on_press(Message::ToggleKeyVisibility),
            button("Save").on_press(Message::SaveKey),
        ]
        .spacing(8)
        .align_y(Alignment::Center)
        .into()
    }

    fn player(&self) -> Element<'_, Message> {
        let playback = self.viewer.playback();
        let title = playback
            .media()
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "No video loaded".to_string());

        let toggle = button(if playback.is_playing() { "Pause" } else { "Play" })
            .on_press_maybe(playback.media().map(|_| Message::TogglePlayback));

        container(
            column![
                text(title).size(16),
                row![
                    toggle,
                    text(format_position(playback.position(), playback.is_playing())).size(20),
                ]
                .spacing(12)
                .align_y(Alignment::Center),
            ]
            .spacing(8),
        )
        .padding(12)
        .width(Length::Fill)
        .style(container::rounded_box)
        .into()
    }

    fn questions(&self) -> Element<'_, Message> {
        let ask = button("Ask").on_press_maybe(self.viewer.can_ask().then_some(Message::Ask));

        let mut pane = column![
            row![
                text_input("Ask about the video...", &self.question)
                    .on_input(Message::QuestionChanged)
                    .on_submit(Message::Ask),
                ask,
            ]
            .spacing(8),
        ]
        .spacing(10);

        if let Some(answer) = self.viewer.answer() {
            pane = pane.push(
                container(answer_text(answer))
                    .padding(12)
                    .width(Length::Fill)
                    .style(container::rounded_box),
            );
        }
        pane.into()
    }

    fn transcript(&self) -> iced::widget::Column<'_, Message> {
        let active = self.viewer.view().active();
        let metrics = self.viewer.row_metrics();
        let rows: Vec<Element<'_, Message>> = self
            .viewer
            .view()
            .visible_rows()
            .map(|row| segment_row(row, active == Some(row.index), metrics))
            .collect();

        column![
            text_input("Search transcript...", self.viewer.search_term())
                .on_input(Message::SearchChanged),
            scrollable(column(rows).spacing(metrics.spacing))
                .id(transcript_id())
                .on_scroll(Message::TranscriptScrolled)
                .height(Length::Fill),
        ]
        .spacing(8)
    }

    fn status_line(&self) -> Element<'_, Message> {
        let status = self.viewer.status();
        let color = match status.kind {
            StatusKind::Error => Color::from_rgb(0.85, 0.25, 0.25),
            StatusKind::Success => Color::from_rgb(0.2, 0.65, 0.35),
            StatusKind::Loading => Color::from_rgb(0.45, 0.55, 0.85),
            StatusKind::None => Color::TRANSPARENT,
        };
        text(status.text.as_str()).color(color).into()
    }
}

fn scroll_task(nav: Navigation) -> Task<Message> {
    match nav.scroll_to {
        Some(y) => operation::scroll_to(transcript_id(), AbsoluteOffset { x: 0.0, y }),
        None => Task::none(),
    }
}

/// Rows are drawn at exactly `metrics.row_height` with unwrapped lines, so the
/// viewer's scroll offsets match what is on screen.
fn segment_row(
    row: &RenderedSegment,
    active: bool,
    metrics: RowMetrics,
) -> Element<'_, Message> {
    let label = if row.segment.timestamp_display.is_empty() {
        "--"
    } else {
        row.segment.timestamp_display.as_str()
    };

    let label = text(label)
        .size(12)
        .line_height(text::LineHeight::Absolute(Pixels(LABEL_LINE_HEIGHT)));

    button(column![label, inline_text(&row.inlines, metrics.line_height)].spacing(LABEL_GAP))
        .padding([ROW_PADDING, 10])
        .width(Length::Fill)
        .height(Length::Fixed(metrics.row_height(row.line_count())))
        .clip(true)
        .style(if active { button::primary } else { button::text })
        .on_press(Message::SegmentClicked(row.index))
        .into()
}

fn inline_text(inlines: &[Inline], line_height: f32) -> Element<'_, Message> {
    let mut lines: Vec<Element<'_, Message>> = Vec::new();
    let mut line: Vec<Element<'_, Message>> = Vec::new();

    for inline in inlines {
        match inline {
            Inline::Text { text: run, bold, italic } => {
                line.push(
                    text(run.as_str())
                        .font(font_for(*bold, *italic))
                        .line_height(text::LineHeight::Absolute(Pixels(line_height)))
                        .wrapping(text::Wrapping::None)
                        .into(),
                );
            }
            Inline::LineBreak => lines.push(row(std::mem::take(&mut line)).into()),
        }
    }
    lines.push(row(line).into());

    column(lines).into()
}

fn font_for(bold: bool, italic: bool) -> Font {
    Font {
        weight: if bold { font::Weight::Bold } else { font::Weight::Normal },
        style: if italic { font::Style::Italic } else { font::Style::Normal },
        ..Font::DEFAULT
    }
}

fn answer_text(answer: &[AnswerFragment]) -> Element<'_, Message> {
    let fragments: Vec<Element<'_, Message>> = answer
        .iter()
        .enumerate()
        .map(|(index, fragment)| match fragment {
            AnswerFragment::Text(content) => text(content.as_str()).into(),
            AnswerFragment::Citation { label, seconds, .. } => button(text(label.as_str()))
                .padding(0)
                .style(button::text)
                .on_press_maybe(seconds.map(|_| Message::CitationClicked(index)))
                .into(),
        })
        .collect();

    row(fragments).wrap().into()
}
