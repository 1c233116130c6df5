//! TTS (Text-to-Speech) Module
//!
//! Turns text into an audio file on disk. Backends produce MP3 bytes; the
//! [`Synthesizer`] handles truncation, naming, atomic writes, and conversion
//! to the requested [`AudioFormat`].

use crate::config::Config;
use crate::error::{NarratorError, NarratorResult};
use anyhow::Result;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub mod cloud;
pub mod convert;
pub mod gtts;

/// Trait for speech backends
#[async_trait]
pub trait SpeechBackend: Send + Sync + std::fmt::Debug {
    /// Generate MP3 audio for `text` in `language`
    async fn generate(&self, text: &str, language: &str, slow: bool) -> Result<Vec<u8>>;

    /// Get the backend name
    fn name(&self) -> &str;
}

/// Factory to create the configured speech backend
pub fn create_backend(config: &Config) -> Arc<dyn SpeechBackend> {
    info!("🛠️ Creating TTS backend: {}", config.tts_engine);
    let backend: Arc<dyn SpeechBackend> = match config.tts_engine.as_str() {
        "gtts" => Arc::new(gtts::GttsBackend::new()),
        "google-cloud" | "google_cloud" => match &config.google_tts_api_key {
            Some(key) => Arc::new(cloud::CloudTtsBackend::new(key.clone())),
            None => {
                warn!("  - google-cloud needs GOOGLE_TTS_API_KEY, falling back to gtts");
                Arc::new(gtts::GttsBackend::new())
            }
        },
        other => {
            warn!("  - Unknown engine '{}', falling back to gtts", other);
            Arc::new(gtts::GttsBackend::new())
        }
    };
    info!("✅ TTS backend '{}' initialized", backend.name());
    backend
}

/// Output audio container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    Ogg,
}

impl AudioFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
        }
    }

    /// Parse a format name, falling back to MP3 for anything unknown
    pub fn parse_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            warn!("⚠️ Audio format '{}' not supported, using mp3", name);
            Self::Mp3
        })
    }
}

impl FromStr for AudioFormat {
    type Err = NarratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "wav" => Ok(Self::Wav),
            "ogg" => Ok(Self::Ogg),
            other => Err(NarratorError::Config(format!(
                "unsupported audio format '{other}' (expected mp3, wav or ogg)"
            ))),
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// One text-to-speech job
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    pub language: String,
    /// File name without directory; defaults to `tts_output_<unix time>`
    pub filename: Option<String>,
    pub format: AudioFormat,
    pub slow: bool,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: "en".to_string(),
            filename: None,
            format: AudioFormat::Mp3,
            slow: false,
        }
    }
}

/// Writes speech for text into the output directory
#[derive(Debug, Clone)]
pub struct Synthesizer {
    backend: Arc<dyn SpeechBackend>,
    output_dir: PathBuf,
    max_chars: Option<usize>,
}

impl Synthesizer {
    pub fn new(backend: Arc<dyn SpeechBackend>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            output_dir: output_dir.into(),
            max_chars: None,
        }
    }

    /// Cut text longer than `max_chars` characters before synthesis
    pub fn with_max_chars(mut self, max_chars: Option<usize>) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Produce an audio file for the request, or `None` on any failure
    pub async fn synthesize(&self, request: &SynthesisRequest) -> Option<PathBuf> {
        match self.try_synthesize(request).await {
            Ok(path) => {
                info!("🔊 Speech saved as '{}'", path.display());
                Some(path)
            }
            Err(e) => {
                error!("❌ Text-to-speech failed: {}", e);
                None
            }
        }
    }

    async fn try_synthesize(&self, request: &SynthesisRequest) -> NarratorResult<PathBuf> {
        if request.text.trim().is_empty() {
            return Err(NarratorError::Synthesis("no text provided".to_string()));
        }

        let text = truncate_chars(&request.text, self.max_chars);
        let stem = output_stem(request.filename.as_deref());

        std::fs::create_dir_all(&self.output_dir)?;
        let target = self
            .output_dir
            .join(format!("{stem}.{}", request.format.extension()));

        debug!(
            "📢 {} speaking {} chars ({})",
            self.backend.name(),
            text.chars().count(),
            request.language
        );
        let audio = self
            .backend
            .generate(&text, &request.language, request.slow)
            .await
            .map_err(|e| NarratorError::Synthesis(format!("{}: {:#}", self.backend.name(), e)))?;

        if audio.is_empty() {
            return Err(NarratorError::Synthesis(format!(
                "{} returned no audio",
                self.backend.name()
            )));
        }

        match request.format {
            AudioFormat::Mp3 => write_atomic(&target, &audio)?,
            format => {
                let mp3 = self.output_dir.join(format!("{stem}.mp3"));
                write_atomic(&mp3, &audio)?;
                convert::convert(&mp3, &target, format).await?;
            }
        }

        Ok(target)
    }
}

/// Hard character cut; no word-boundary handling
pub fn truncate_chars(text: &str, max_chars: Option<usize>) -> String {
    match max_chars {
        Some(max) if text.chars().count() > max => {
            info!("✂️ Trimming text to {} characters", max);
            text.chars().take(max).collect()
        }
        _ => text.to_string(),
    }
}

/// File stem for an output; a trailing audio extension (`.mp3`, `.wav`, `.ogg`) is dropped
pub fn output_stem(filename: Option<&str>) -> String {
    match filename.map(str::trim).filter(|f| !f.is_empty()) {
        Some(name) => match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && ext.parse::<AudioFormat>().is_ok() => {
                stem.to_string()
            }
            _ => name.to_string(),
        },
        None => format!("tts_output_{}", chrono::Utc::now().timestamp()),
    }
}

/// Sibling path with a `.part` suffix used while a file is being written
pub(crate) fn part_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Write to a `.part` file, then rename into place
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> NarratorResult<()> {
    let part = part_path(path);
    if let Err(e) = std::fs::write(&part, bytes) {
        let _ = std::fs::remove_file(&part);
        return Err(e.into());
    }
    std::fs::rename(&part, path)?;
    Ok(())
}
