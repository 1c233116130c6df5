//! Pipeline Orchestrator
//!
//! Fetch → extract → (enhance) → synthesize → (play), strictly in sequence.
//! A failing stage stops the run. Enhancement and playback can never fail it.

use crate::config::Config;
use crate::enhance::{GeminiEnhancer, GeminiSettings};
use crate::extract::{find_key, lookup, text_of};
use crate::fetch::{FetchClient, FetchError, FetchRequest};
use crate::playback::AudioPlayer;
use crate::tts::{self, AudioFormat, SynthesisRequest, Synthesizer};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Why a pipeline run produced no artifact
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no data fetched from API: {0}")]
    Fetch(#[from] FetchError),

    #[error("field '{path}' not found in response")]
    FieldMissing { path: String },

    #[error("field '{path}' holds no speakable text")]
    EmptyText { path: String },

    #[error("speech synthesis produced no audio")]
    Synthesis,
}

/// Where to find the text in the fetched document
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Dotted path, e.g. `data.0.short_description`
    pub path: String,
    /// Used when the path misses. An empty default still stops the run.
    pub default: Value,
    /// For an undotted key, search nested mappings when it is not at the top
    pub search_nested: bool,
}

impl ExtractOptions {
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            default: Value::String(String::new()),
            search_nested: false,
        }
    }
}

/// How to speak the extracted text
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    pub language: String,
    pub filename: Option<String>,
    pub format: AudioFormat,
    pub slow: bool,
    pub auto_play: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            filename: None,
            format: AudioFormat::Mp3,
            slow: false,
            auto_play: true,
        }
    }
}

impl SynthesisOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            language: config.language.clone(),
            format: AudioFormat::parse_or_default(&config.audio_format),
            auto_play: config.auto_play,
            ..Self::default()
        }
    }

    fn request(&self, text: String) -> SynthesisRequest {
        SynthesisRequest {
            text,
            language: self.language.clone(),
            filename: self.filename.clone(),
            format: self.format,
            slow: self.slow,
        }
    }
}

/// Composes the stages; enhancement and playback are optional capabilities
#[derive(Debug)]
pub struct Pipeline {
    fetcher: FetchClient,
    synthesizer: Synthesizer,
    enhancer: Option<GeminiEnhancer>,
    player: Option<Arc<dyn AudioPlayer>>,
}

impl Pipeline {
    pub fn new(fetcher: FetchClient, synthesizer: Synthesizer) -> Self {
        Self {
            fetcher,
            synthesizer,
            enhancer: None,
            player: None,
        }
    }

    /// Wire every stage from configuration. Validates the Gemini key once.
    pub async fn from_config(
        config: &Config,
        enhance: bool,
        player: Option<Arc<dyn AudioPlayer>>,
    ) -> Self {
        let synthesizer = Synthesizer::new(tts::create_backend(config), &config.output_dir)
            .with_max_chars(config.max_chars);
        let mut pipeline = Self::new(FetchClient::from_config(config), synthesizer);

        if enhance {
            let enhancer = GeminiEnhancer::connect(GeminiSettings::from_config(config)).await;
            pipeline = pipeline.with_enhancer(enhancer);
        }
        if let Some(player) = player {
            pipeline = pipeline.with_player(player);
        }
        pipeline
    }

    pub fn with_enhancer(mut self, enhancer: GeminiEnhancer) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    pub fn with_player(mut self, player: Arc<dyn AudioPlayer>) -> Self {
        self.player = Some(player);
        self
    }

    pub fn enhancer(&self) -> Option<&GeminiEnhancer> {
        self.enhancer.as_ref()
    }

    pub fn enhancer_mut(&mut self) -> Option<&mut GeminiEnhancer> {
        self.enhancer.as_mut()
    }

    /// Run every stage, returning the artifact path or `None`
    pub async fn process_pipeline(
        &mut self,
        fetch: &FetchRequest,
        extract: &ExtractOptions,
        synth: &SynthesisOptions,
    ) -> Option<PathBuf> {
        match self.run(fetch, extract, synth).await {
            Ok(path) => Some(path),
            Err(e) => {
                error!("❌ Pipeline stopped: {}", e);
                None
            }
        }
    }

    /// Run every stage, reporting which one stopped the run
    pub async fn run(
        &mut self,
        fetch: &FetchRequest,
        extract: &ExtractOptions,
        synth: &SynthesisOptions,
    ) -> Result<PathBuf, PipelineError> {
        let document = self.fetcher.fetch(fetch).await?;
        let text = extract_text(&document, extract)?;

        if text.chars().count() > 100 {
            let preview: String = text.chars().take(100).collect();
            info!("📝 Extracted text: {}...", preview);
        } else {
            info!("📝 Extracted text: {}", text);
        }

        self.speak_text(text, synth)
            .await
            .ok_or(PipelineError::Synthesis)
    }

    /// Enhance, synthesize, and play caller-supplied text
    pub async fn speak(&mut self, text: &str, synth: &SynthesisOptions) -> Option<PathBuf> {
        self.speak_text(text.to_string(), synth).await
    }

    async fn speak_text(&mut self, text: String, synth: &SynthesisOptions) -> Option<PathBuf> {
        let text = match self.enhancer.as_mut() {
            Some(enhancer) => enhancer.enhance(&text).await,
            None => text,
        };

        let path = self.synthesizer.synthesize(&synth.request(text)).await?;

        if synth.auto_play {
            match &self.player {
                Some(player) => {
                    if let Err(e) = player.play(&path).await {
                        warn!("⚠️ Playback via {} failed: {}", player.name(), e);
                    }
                }
                None => warn!("⚠️ Auto-play requested but no audio player configured"),
            }
        }

        Some(path)
    }
}

/// Pull speakable text out of a fetched document
pub fn extract_text(document: &Value, options: &ExtractOptions) -> Result<String, PipelineError> {
    let found = lookup(document, &options.path).or_else(|| {
        if options.search_nested && !options.path.contains('.') {
            find_key(document, &options.path)
        } else {
            None
        }
    });

    let value = match found {
        Some(value) => value,
        None => {
            warn!(
                "⚠️ Could not find '{}' in response, using default",
                options.path
            );
            &options.default
        }
    };

    let text = text_of(value).unwrap_or_default();
    if !text.trim().is_empty() {
        return Ok(text);
    }

    if found.is_some() {
        Err(PipelineError::EmptyText {
            path: options.path.clone(),
        })
    } else {
        Err(PipelineError::FieldMissing {
            path: options.path.clone(),
        })
    }
}
