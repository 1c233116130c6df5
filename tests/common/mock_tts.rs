//! Mock speech backend for testing
//!
//! Records all synthesized text for verification.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Bytes every mock synthesis returns
pub const MOCK_AUDIO: &[u8] = b"ID3mock-audio";

/// Mock backend that records synthesized text
#[derive(Debug, Clone)]
pub struct MockBackend {
    /// All text that was "spoken"
    pub spoken: Arc<Mutex<Vec<String>>>,
    /// Simulate failure on every generate
    pub should_fail: Arc<Mutex<bool>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            spoken: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn failing() -> Self {
        let mock = Self::new();
        *mock.should_fail.lock().unwrap() = true;
        mock
    }

    /// Get all spoken phrases
    pub fn get_spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl narrator::tts::SpeechBackend for MockBackend {
    async fn generate(&self, text: &str, _language: &str, _slow: bool) -> Result<Vec<u8>> {
        if *self.should_fail.lock().unwrap() {
            return Err(anyhow::anyhow!("Mock TTS failure"));
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(MOCK_AUDIO.to_vec())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
