//! Google Cloud Text-to-Speech backend
//!
//! Calls `text:synthesize` with an API key and decodes the base64
//! `audioContent` field into MP3 bytes.

use super::SpeechBackend;
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

pub const CLOUD_TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
    #[serde(rename = "audioContent")]
    audio_content: String,
}

#[derive(Debug)]
pub struct CloudTtsBackend {
    client: Client,
    api_key: String,
    url: String,
}

impl CloudTtsBackend {
    pub fn new(api_key: String) -> Self {
        Self::with_url(api_key, CLOUD_TTS_URL)
    }

    pub fn with_url(api_key: String, url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            url: url.into(),
        }
    }
}

#[async_trait]
impl SpeechBackend for CloudTtsBackend {
    async fn generate(&self, text: &str, language: &str, slow: bool) -> Result<Vec<u8>> {
        let speaking_rate = if slow { 0.75 } else { 1.0 };
        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&serde_json::json!({
                "input": { "text": text },
                "voice": { "languageCode": language },
                "audioConfig": { "audioEncoding": "MP3", "speakingRate": speaking_rate }
            }))
            .send()
            .await
            .context("Cloud TTS request failed")?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            anyhow::bail!("Cloud TTS returned {}: {}", status, body);
        }

        let parsed: SynthesizeResponse =
            serde_json::from_str(&body).context("malformed Cloud TTS response")?;
        let audio = base64::engine::general_purpose::STANDARD
            .decode(parsed.audio_content)
            .context("failed to decode base64 audio")?;
        debug!("Cloud TTS returned {} bytes", audio.len());
        Ok(audio)
    }

    fn name(&self) -> &str {
        "google-cloud"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_decodes_audio_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-goog-api-key", "key"))
            .and(body_partial_json(json!({
                "input": { "text": "Hello World" },
                "voice": { "languageCode": "en-GB" }
            })))
            // "SGVsbG8gV29ybGQ=" is base64 for "Hello World"
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"audioContent": "SGVsbG8gV29ybGQ="})),
            )
            .mount(&server)
            .await;

        let backend = CloudTtsBackend::with_url("key".to_string(), server.uri());
        let audio = backend.generate("Hello World", "en-GB", false).await.unwrap();
        assert_eq!(audio, b"Hello World");
    }

    #[tokio::test]
    async fn test_bad_base64_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"audioContent": "%%%"})))
            .mount(&server)
            .await;

        let backend = CloudTtsBackend::with_url("key".to_string(), server.uri());
        assert!(backend.generate("hi", "en", false).await.is_err());
    }

    #[tokio::test]
    async fn test_forbidden_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;

        let backend = CloudTtsBackend::with_url("key".to_string(), server.uri());
        let err = backend.generate("hi", "en", false).await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
