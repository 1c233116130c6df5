//! Mock audio player for testing

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Records every file it was asked to play
#[derive(Debug, Clone, Default)]
pub struct MockPlayer {
    pub played: Arc<Mutex<Vec<PathBuf>>>,
    pub should_fail: bool,
}

impl MockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn get_played(&self) -> Vec<PathBuf> {
        self.played.lock().unwrap().clone()
    }
}

#[async_trait]
impl narrator::playback::AudioPlayer for MockPlayer {
    async fn play(&self, path: &Path) -> Result<()> {
        self.played.lock().unwrap().push(path.to_path_buf());
        if self.should_fail {
            return Err(anyhow::anyhow!("Mock playback failure"));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
