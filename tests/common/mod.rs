#![allow(dead_code)]

pub mod mock_player;
pub mod mock_tts;

use mock_player::MockPlayer;
use mock_tts::MockBackend;
use narrator::fetch::FetchClient;
use narrator::pipeline::Pipeline;
use narrator::tts::Synthesizer;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

/// A pipeline wired to mocks, writing into a temporary directory
pub struct TestContext {
    pub temp_dir: TempDir,
    pub server: MockServer,
    pub backend: MockBackend,
    pub player: MockPlayer,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with(MockBackend::new(), MockPlayer::new()).await
    }

    pub async fn with(backend: MockBackend, player: MockPlayer) -> Self {
        Self {
            temp_dir: tempfile::tempdir().expect("Failed to create temp dir"),
            server: MockServer::start().await,
            backend,
            player,
        }
    }

    pub fn output_dir(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("audio_output")
    }

    /// Pipeline with no enhancer; the source API is the mock server
    pub fn pipeline(&self) -> Pipeline {
        let fetcher = FetchClient::new(Some(self.server.uri()), Duration::from_secs(5));
        let synthesizer = Synthesizer::new(Arc::new(self.backend.clone()), self.output_dir());
        Pipeline::new(fetcher, synthesizer).with_player(Arc::new(self.player.clone()))
    }
}
