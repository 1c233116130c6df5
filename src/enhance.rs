//! Gemini Text Enhancement
//!
//! Optionally rewrites text through the Gemini generative-language API before
//! it is spoken. The enhancer is strictly best-effort: every failure turns it
//! into a pass-through and the caller only ever sees text.
//!
//! State is per instance. A missing key leaves the enhancer `Disabled`; a
//! failed probe or request leaves it `Failed` until [`GeminiEnhancer::revalidate`]
//! is called explicitly.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Prompt sent on construction to prove the key works
const PROBE_PROMPT: &str = "Test";

/// Lifecycle of the enhancer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhancerState {
    /// No credential configured
    Disabled,
    /// Probe call in flight
    Validating,
    /// Probe succeeded, requests are sent
    Enabled,
    /// Probe or a later request failed; sticky until `revalidate`
    Failed,
}

/// What we know about the configured credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    Unchecked,
    Valid,
    Invalid,
}

/// Why `enhance` returned its input unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    Disabled,
    Failed,
}

/// Settings for the Gemini client
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Language named in the framing prompt
    pub language: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-pro".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout: Duration::from_secs(20),
            language: "en".to_string(),
        }
    }
}

impl GeminiSettings {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.clone(),
            timeout: Duration::from_secs(config.gemini_timeout_secs),
            language: config.language.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if it has any
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

/// Gemini-backed text enhancer with sticky failure
#[derive(Debug)]
pub struct GeminiEnhancer {
    client: Client,
    settings: GeminiSettings,
    state: EnhancerState,
    credential: CredentialState,
    last_fallback: Option<FallbackReason>,
}

impl GeminiEnhancer {
    /// Build the enhancer and validate the key once
    pub async fn connect(settings: GeminiSettings) -> Self {
        let mut enhancer = Self {
            client: Client::new(),
            settings,
            state: EnhancerState::Disabled,
            credential: CredentialState::Unchecked,
            last_fallback: None,
        };
        enhancer.validate().await;
        enhancer
    }

    pub fn state(&self) -> EnhancerState {
        self.state
    }

    pub fn credential(&self) -> CredentialState {
        self.credential
    }

    pub fn is_enabled(&self) -> bool {
        self.state == EnhancerState::Enabled
    }

    /// Reason recorded by the most recent pass-through, if any
    pub fn last_fallback(&self) -> Option<FallbackReason> {
        self.last_fallback
    }

    /// Re-run the key probe. Only ever called explicitly.
    pub async fn revalidate(&mut self) -> EnhancerState {
        info!("🔁 Revalidating Gemini API key");
        self.validate().await;
        self.state
    }

    async fn validate(&mut self) {
        if self.settings.api_key.is_none() {
            warn!("⚠️ No Gemini API key provided, enhancement disabled");
            self.state = EnhancerState::Disabled;
            return;
        }

        self.state = EnhancerState::Validating;
        match self.generate(PROBE_PROMPT).await {
            Ok(_) => {
                info!("✅ Gemini API key validated ({})", self.settings.model);
                self.state = EnhancerState::Enabled;
                self.credential = CredentialState::Valid;
            }
            Err(e) => {
                error!("❌ Gemini API key validation failed: {:#}", e);
                warn!("⚠️ Falling back to plain text-to-speech");
                self.state = EnhancerState::Failed;
                self.credential = CredentialState::Invalid;
            }
        }
    }

    /// Rewrite `text` for narration, or return it unchanged on any failure
    pub async fn enhance(&mut self, text: &str) -> String {
        match self.state {
            EnhancerState::Enabled => {}
            EnhancerState::Disabled | EnhancerState::Validating => {
                debug!("Gemini enhancement disabled, passing text through");
                self.last_fallback = Some(FallbackReason::Disabled);
                return text.to_string();
            }
            EnhancerState::Failed => {
                warn!("⚠️ Gemini unavailable (earlier failure), passing text through");
                self.last_fallback = Some(FallbackReason::Failed);
                return text.to_string();
            }
        }

        let prompt = self.build_prompt(text);
        match self.generate(&prompt).await {
            Ok(enhanced) => {
                info!("🧠 Gemini enhanced text ({} chars)", enhanced.chars().count());
                self.last_fallback = None;
                enhanced
            }
            Err(e) => {
                error!("❌ Gemini request failed, disabling enhancement: {:#}", e);
                self.state = EnhancerState::Failed;
                self.last_fallback = Some(FallbackReason::Failed);
                text.to_string()
            }
        }
    }

    fn build_prompt(&self, text: &str) -> String {
        format!(
            "Convert the following text to a natural-sounding text-to-speech voice narration, \
             optimizing for clarity and natural intonation. Use {} language: {}",
            self.settings.language, text
        )
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no API key"))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&serde_json::json!({
                "contents": [{ "parts": [{ "text": prompt }] }]
            }))
            .timeout(self.settings.timeout)
            .send()
            .await?;

        let status = response.status();
        let body_text = response.text().await?;

        if !status.is_success() {
            anyhow::bail!("Gemini API error ({}): {}", status, body_text);
        }

        let parsed: GenerateResponse = serde_json::from_str(&body_text)
            .map_err(|e| anyhow::anyhow!("malformed Gemini response: {}", e))?;

        parsed
            .text()
            .ok_or_else(|| anyhow::anyhow!("Gemini response contained no text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-pro:generateContent";

    fn reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        }))
    }

    fn settings(server: &MockServer, key: Option<&str>) -> GeminiSettings {
        GeminiSettings {
            api_key: key.map(str::to_string),
            base_url: server.uri(),
            timeout: Duration::from_secs(2),
            ..GeminiSettings::default()
        }
    }

    #[tokio::test]
    async fn test_no_key_is_disabled_and_makes_no_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(reply("should not happen"))
            .expect(0)
            .mount(&server)
            .await;

        let mut enhancer = GeminiEnhancer::connect(settings(&server, None)).await;
        assert_eq!(enhancer.state(), EnhancerState::Disabled);
        assert_eq!(enhancer.credential(), CredentialState::Unchecked);
        assert_eq!(enhancer.enhance("Hello").await, "Hello");
        assert_eq!(enhancer.last_fallback(), Some(FallbackReason::Disabled));
    }

    #[tokio::test]
    async fn test_valid_key_enhances_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(header("x-goog-api-key", "good"))
            .and(body_string_contains("Test"))
            .respond_with(reply("ok"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(body_string_contains("Use en language: breaking news"))
            .respond_with(reply("  Breaking news, narrated.  "))
            .mount(&server)
            .await;

        let mut enhancer = GeminiEnhancer::connect(settings(&server, Some("good"))).await;
        assert!(enhancer.is_enabled());
        assert_eq!(enhancer.credential(), CredentialState::Valid);
        assert_eq!(
            enhancer.enhance("breaking news").await,
            "Breaking news, narrated."
        );
        assert_eq!(enhancer.last_fallback(), None);
    }

    #[tokio::test]
    async fn test_invalid_key_is_sticky() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
            .expect(1)
            .mount(&server)
            .await;

        let mut enhancer = GeminiEnhancer::connect(settings(&server, Some("bad"))).await;
        assert_eq!(enhancer.state(), EnhancerState::Failed);
        assert_eq!(enhancer.credential(), CredentialState::Invalid);

        for _ in 0..3 {
            assert_eq!(enhancer.enhance("X").await, "X");
        }
        assert_eq!(enhancer.state(), EnhancerState::Failed);
        assert_eq!(enhancer.last_fallback(), Some(FallbackReason::Failed));
    }

    #[tokio::test]
    async fn test_request_failure_after_validation_fails_over() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("Test"))
            .respond_with(reply("ok"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("narration"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .expect(1)
            .mount(&server)
            .await;

        let mut enhancer = GeminiEnhancer::connect(settings(&server, Some("good"))).await;
        assert!(enhancer.is_enabled());

        assert_eq!(enhancer.enhance("first").await, "first");
        assert_eq!(enhancer.state(), EnhancerState::Failed);
        // No second request goes out once failed
        assert_eq!(enhancer.enhance("second").await, "second");
    }

    #[tokio::test]
    async fn test_malformed_response_fails_validation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let enhancer = GeminiEnhancer::connect(settings(&server, Some("good"))).await;
        assert_eq!(enhancer.state(), EnhancerState::Failed);
    }

    #[tokio::test]
    async fn test_timeout_fails_validation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(reply("slow").set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let mut cfg = settings(&server, Some("good"));
        cfg.timeout = Duration::from_millis(50);
        let enhancer = GeminiEnhancer::connect(cfg).await;
        assert_eq!(enhancer.state(), EnhancerState::Failed);
    }

    #[tokio::test]
    async fn test_revalidate_recovers_explicitly() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(reply("ok"))
            .mount(&server)
            .await;

        let mut enhancer = GeminiEnhancer::connect(settings(&server, Some("good"))).await;
        assert_eq!(enhancer.state(), EnhancerState::Failed);
        assert_eq!(enhancer.revalidate().await, EnhancerState::Enabled);
        assert_eq!(enhancer.credential(), CredentialState::Valid);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let parsed: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hello " }, { "text": "there" }] } }]
        }))
        .unwrap();
        assert_eq!(parsed.text().as_deref(), Some("Hello there"));
    }
}
