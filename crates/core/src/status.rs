use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusKind {
    #[default]
    None,
    Success,
    Error,
    Loading,
}

/// The single notification slot. Every update overwrites it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Error,
        }
    }

    pub fn loading(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Loading,
        }
    }

    pub fn clear() -> Self {
        Self::default()
    }

    /// Empty text hides the slot regardless of kind.
    pub fn is_visible(&self) -> bool {
        !self.text.is_empty()
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
