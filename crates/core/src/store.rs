use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    error::{Result, ScrublineError},
    provider::Provider,
};

/// Settings key the credential is stored under.
pub const CREDENTIAL_KEY: &str = "openai_api_key";

pub fn get_root_settings_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scrubline"))
}

pub fn get_settings_path(settings_dir: &Path) -> PathBuf {
    settings_dir.join("settings.json")
}

/// One persisted string: the completion API credential.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open_default() -> Result<Self> {
        let dir = get_root_settings_dir().ok_or(ScrublineError::NoSettingsDir)?;
        Ok(Self::new(get_settings_path(&dir)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<String>> {
        let settings = self.read()?;
        Ok(settings
            .get(CREDENTIAL_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|key| !key.is_empty()))
    }

    /// Store a trimmed credential and return it. Blank input is rejected.
    pub fn save(&self, credential: &str) -> Result<String> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(ScrublineError::EmptyCredential);
        }

        let mut settings = self.read()?;
        settings.insert(CREDENTIAL_KEY.to_string(), Value::from(credential));
        self.write(&settings)?;
        debug!(path = %self.path.display(), "credential saved");
        Ok(credential.to_string())
    }

    pub fn clear(&self) -> Result<()> {
        let mut settings = self.read()?;
        if settings.remove(CREDENTIAL_KEY).is_some() {
            self.write(&settings)?;
        }
        Ok(())
    }

    fn read(&self) -> Result<Map<String, Value>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(ScrublineError::io(&self.path, e)),
        };
        Ok(serde_json::from_str(&text)?)
    }

    fn write(&self, settings: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ScrublineError::io(parent, e))?;
        }
        let pretty = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, pretty).map_err(|e| ScrublineError::io(&self.path, e))
    }
}

/// Stored credential first, then the provider's environment variable.
pub fn resolve_credential(stored: Option<String>, provider: &Provider) -> Option<String> {
    stored.or_else(|| provider.env_credential())
}
