//! Audio playback
//!
//! Best-effort playback of a finished artifact. rodio is tried first; when no
//! output device can be opened, common command-line players are tried.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info, warn};

/// Trait for audio players
#[async_trait]
pub trait AudioPlayer: Send + Sync + std::fmt::Debug {
    /// Play the file and wait until it finishes
    async fn play(&self, path: &Path) -> Result<()>;

    /// Get the player name
    fn name(&self) -> &str;
}

fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Audio file not found: {}", path.display());
    }
    Ok(())
}

/// Plays through the default output device with rodio
#[derive(Debug, Default)]
pub struct RodioPlayer;

impl RodioPlayer {
    fn play_blocking(path: &Path) -> Result<()> {
        let (_stream, stream_handle) = rodio::OutputStream::try_default()
            .map_err(|e| anyhow::anyhow!("No audio output device: {}", e))?;
        let sink = rodio::Sink::try_new(&stream_handle)?;
        let file = std::fs::File::open(path)?;
        let source = rodio::Decoder::new(std::io::BufReader::new(file))?;
        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }
}

#[async_trait]
impl AudioPlayer for RodioPlayer {
    async fn play(&self, path: &Path) -> Result<()> {
        ensure_exists(path)?;
        info!("🔊 Playing audio: {}", path.display());

        // rodio's stream is not Send, so it lives entirely on a blocking thread
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::play_blocking(&path))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))??;
        Ok(())
    }

    fn name(&self) -> &str {
        "rodio"
    }
}

/// Command-line players tried in order
const SYSTEM_PLAYERS: &[(&str, &[&str])] = &[
    ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"]),
    ("mpv", &["--no-video", "--really-quiet"]),
    ("play", &["-q"]),
];

/// Shells out to the first available command-line player
#[derive(Debug, Default)]
pub struct SystemPlayer;

#[async_trait]
impl AudioPlayer for SystemPlayer {
    async fn play(&self, path: &Path) -> Result<()> {
        ensure_exists(path)?;

        for (program, args) in SYSTEM_PLAYERS {
            let status = tokio::process::Command::new(program)
                .args(*args)
                .arg(path)
                .status()
                .await;
            match status {
                Ok(s) if s.success() => {
                    debug!("Played {} with {}", path.display(), program);
                    return Ok(());
                }
                Ok(s) => anyhow::bail!("{} exited with {}", program, s),
                Err(_) => continue,
            }
        }

        Err(anyhow::anyhow!(
            "No system audio player found (tried ffplay, mpv, play)"
        ))
    }

    fn name(&self) -> &str {
        "system"
    }
}

/// rodio first, command-line players second
#[derive(Debug, Default)]
pub struct FallbackPlayer {
    primary: RodioPlayer,
    secondary: SystemPlayer,
}

#[async_trait]
impl AudioPlayer for FallbackPlayer {
    async fn play(&self, path: &Path) -> Result<()> {
        match self.primary.play(path).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("⚠️ rodio playback failed ({}), trying system players", e);
                self.secondary.play(path).await
            }
        }
    }

    fn name(&self) -> &str {
        "fallback"
    }
}
