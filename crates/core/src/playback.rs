use std::path::{Path, PathBuf};

/// What the front-end's player should be doing.
///
/// Decoding and drawing frames happen elsewhere; this is the position and
/// play state the viewer asks for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Playback {
    media: Option<PathBuf>,
    position: f64,
    playing: bool,
}

impl Playback {
    pub fn open(media: PathBuf) -> Self {
        Self {
            media: Some(media),
            position: 0.0,
            playing: false,
        }
    }

    pub fn media(&self) -> Option<&Path> {
        self.media.as_deref()
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn seek(&mut self, seconds: f64) {
        self.position = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }
}
