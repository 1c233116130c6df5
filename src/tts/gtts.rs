//! Google Translate TTS backend
//!
//! The endpoint only accepts short inputs, so text is split into chunks of at
//! most [`MAX_CHUNK_CHARS`] characters and the returned MP3 segments are
//! concatenated.

use super::SpeechBackend;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

pub const GTTS_URL: &str = "https://translate.google.com/translate_tts";

/// Longest text the endpoint accepts per request
pub const MAX_CHUNK_CHARS: usize = 100;

#[derive(Debug)]
pub struct GttsBackend {
    client: Client,
    url: String,
}

impl Default for GttsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GttsBackend {
    pub fn new() -> Self {
        Self::with_url(GTTS_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        language: &str,
        slow: bool,
        idx: usize,
        total: usize,
    ) -> Result<Vec<u8>> {
        let speed = if slow { "0.24" } else { "1" };
        let idx = idx.to_string();
        let total = total.to_string();
        let textlen = chunk.chars().count().to_string();
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("q", chunk),
                ("tl", language),
                ("ttsspeed", speed),
                ("idx", idx.as_str()),
                ("total", total.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .context("gtts request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("gtts returned {}: {}", status, body);
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl SpeechBackend for GttsBackend {
    async fn generate(&self, text: &str, language: &str, slow: bool) -> Result<Vec<u8>> {
        let chunks = split_chunks(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            anyhow::bail!("nothing to speak");
        }

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            debug!("gtts chunk {}/{}: {} chars", idx + 1, chunks.len(), chunk.chars().count());
            let bytes = self
                .fetch_chunk(chunk, language, slow, idx, chunks.len())
                .await?;
            audio.extend_from_slice(&bytes);
        }
        Ok(audio)
    }

    fn name(&self) -> &str {
        "gtts"
    }
}

/// Split on whitespace into chunks of at most `max` characters.
///
/// A single word longer than `max` is cut hard.
pub fn split_chunks(text: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current_len > 0 && current_len + 1 + word_len > max {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if word_len > max {
            let chars: Vec<char> = word.chars().collect();
            let mut pieces: Vec<String> = chars.chunks(max).map(|c| c.iter().collect()).collect();
            // Keep the tail open so following words can join it
            if let Some(tail) = pieces.pop() {
                chunks.extend(pieces);
                current_len = tail.chars().count();
                current = tail;
            }
            continue;
        }

        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
