use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::fs;
use tracing::debug;

use crate::{
    error::{Result, ScrublineError},
    types::TranscriptSource,
};

/// Whether `path` looks like a playable video (`.mp4` or `.webm`, any case).
pub fn is_video(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| matches!(ext.as_str(), "mp4" | "webm"))
}

/// Whether `path` looks like a transcript (`.json`).
pub fn is_transcript(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(".json"))
}

/// A video and its transcript, selected together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBundle {
    pub video: PathBuf,
    pub transcript: PathBuf,
}

impl MediaBundle {
    /// Pick the first video and the first transcript among `paths`.
    pub fn from_paths<I>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut video = None;
        let mut transcript = None;
        for path in paths {
            if video.is_none() && is_video(&path) {
                video = Some(path);
            } else if transcript.is_none() && is_transcript(&path) {
                transcript = Some(path);
            }
        }

        match (video, transcript) {
            (Some(video), Some(transcript)) => Ok(Self { video, transcript }),
            _ => Err(ScrublineError::MissingFiles),
        }
    }

    /// Scan one folder, in file name order.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir).map_err(|e| ScrublineError::io(dir, e))?;
        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        paths.sort();
        Self::from_paths(paths)
    }
}

/// Read and parse a transcript file.
pub async fn load_transcript(path: &Path) -> Result<TranscriptSource> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|e| ScrublineError::io(path, e))?;
    let source = TranscriptSource::from_json(&text).map_err(ScrublineError::parse)?;
    debug!(path = %path.display(), records = source.records().len(), "transcript loaded");
    Ok(source)
}

/// Write the `transcription` array of `input` to `output` as pretty JSON.
/// Documents without one produce `[]`. Returns the number of entries written.
pub async fn extract_transcription(input: &Path, output: &Path) -> Result<usize> {
    let text = fs::read_to_string(input)
        .await
        .map_err(|e| ScrublineError::io(input, e))?;
    let document: Value = serde_json::from_str(&text).map_err(ScrublineError::parse)?;

    let transcription = document
        .get("transcription")
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()));
    let count = transcription.as_array().map_or(0, Vec::len);

    let pretty = serde_json::to_string_pretty(&transcription)?;
    fs::write(output, pretty)
        .await
        .map_err(|e| ScrublineError::io(output, e))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_video_and_transcript() {
        let bundle = MediaBundle::from_paths([
            PathBuf::from("notes.txt"),
            PathBuf::from("talk.WEBM"),
            PathBuf::from("talk.json"),
            PathBuf::from("other.mp4"),
        ])
        .unwrap();
        assert_eq!(bundle.video, PathBuf::from("talk.WEBM"));
        assert_eq!(bundle.transcript, PathBuf::from("talk.json"));
    }

    #[test]
    fn both_files_are_required() {
        let err = MediaBundle::from_paths([PathBuf::from("talk.mp4")]).unwrap_err();
        assert!(matches!(err, ScrublineError::MissingFiles));
        assert_eq!(
            err.to_string(),
            "Please select a folder containing both video and transcript files"
        );
        assert!(MediaBundle::from_paths([PathBuf::from("talk.json")]).is_err());
    }

    #[test]
    fn scans_a_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.json"), "[]").unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"").unwrap();
        let bundle = MediaBundle::from_dir(dir.path()).unwrap();
        assert_eq!(bundle.video, dir.path().join("a.mp4"));
        assert_eq!(bundle.transcript, dir.path().join("b.json"));
    }

    #[tokio::test]
    async fn malformed_transcript_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ nope").unwrap();

        let err = load_transcript(&path).await.unwrap_err();
        assert!(matches!(err, ScrublineError::Parse { .. }));
        assert!(err.to_string().starts_with("Error loading transcript: "));
    }

    #[tokio::test]
    async fn extracts_transcription_array() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("whisper.json");
        let output = dir.path().join("segments.json");
        std::fs::write(
            &input,
            r#"{"model":"base","transcription":[{"text":"a"},{"text":"b"}]}"#,
        )
        .unwrap();

        assert_eq!(extract_transcription(&input, &output).await.unwrap(), 2);
        let written: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written, serde_json::json!([{"text":"a"},{"text":"b"}]));

        std::fs::write(&input, r#"{"model":"base"}"#).unwrap();
        assert_eq!(extract_transcription(&input, &output).await.unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "[]");
    }
}
