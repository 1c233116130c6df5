use crate::error::NarratorResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Source API
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub http_timeout_secs: u64,

    // Enhancement
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub gemini_timeout_secs: u64,

    // Speech
    pub tts_engine: String,
    pub google_tts_api_key: Option<String>,
    pub audio_format: String,
    pub language: String,
    pub max_chars: Option<usize>,

    // Output
    pub output_dir: PathBuf,
    pub auto_play: bool,

    // Meta
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            api_token: None,
            http_timeout_secs: 30,
            gemini_api_key: None,
            gemini_model: "gemini-1.5-pro".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            gemini_timeout_secs: 20,
            tts_engine: "gtts".to_string(),
            google_tts_api_key: None,
            audio_format: "mp3".to_string(),
            language: "en".to_string(),
            max_chars: None,
            output_dir: PathBuf::from("audio_output"),
            auto_play: true,
            log_file: Some(PathBuf::from("narrator.log")),
        }
    }
}

impl Config {
    /// Load config from the default location, or fall back to defaults
    pub fn load() -> NarratorResult<Self> {
        Self::load_from(&config_path())
    }

    /// Load config from an explicit path
    ///
    /// A missing file yields defaults. A corrupt file is moved aside to
    /// `*.json.corrupt` and defaults are used.
    pub fn load_from(path: &Path) -> NarratorResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                let backup_path = path.with_extension("json.corrupt");
                let _ = std::fs::rename(path, &backup_path);
                Ok(Self::default())
            }
        }
    }

    /// Save config to an explicit path
    pub fn save_to(&self, path: &Path) -> NarratorResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlay values from the process environment
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary variable source. Empty values are ignored.
    pub fn apply_vars<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("NEWS_API_BASE_URL") {
            self.api_base_url = Some(v);
        }
        if let Some(v) = get("NEWS_API_TOKEN") {
            self.api_token = Some(v);
        }
        if let Some(v) = get("GEMINI_API_KEY") {
            self.gemini_api_key = Some(v);
        }
        if let Some(v) = get("GEMINI_MODEL") {
            self.gemini_model = v;
        }
        if let Some(v) = get("GOOGLE_TTS_API_KEY") {
            self.google_tts_api_key = Some(v);
        }
        if let Some(v) = get("NARRATOR_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = get("NARRATOR_LOG") {
            self.log_file = Some(PathBuf::from(v));
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("narrator")
        .join("config.json")
}
