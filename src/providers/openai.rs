//! OpenAI speech synthesis provider.

use async_trait::async_trait;

use super::{
    audio_chunk_stream, check_stream_status, merge_extra, read_audio_response, AudioStream,
    SynthesisOptions, TtsProvider,
};
use crate::audio::{AudioData, EncodedFormat};
use crate::transport;
use crate::{Error, ErrorContext, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const SPEECH_PATH: &str = "/v1/audio/speech";

/// OpenAI text-to-speech client (`/v1/audio/speech`).
///
/// Output is fixed at 24000 Hz regardless of format.
pub struct OpenAiTts {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    voice: String,
}

impl OpenAiTts {
    pub const SAMPLE_RATE: u32 = 24000;

    pub fn builder() -> OpenAiTtsBuilder {
        OpenAiTtsBuilder::new()
    }

    fn request_body(&self, text: &str, options: &SynthesisOptions, format: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": options.model.as_deref().unwrap_or(&self.model),
            "input": text,
            "voice": options.voice.as_deref().unwrap_or(&self.voice),
            "response_format": format,
        });
        if let Some(speed) = options.speed {
            body["speed"] = serde_json::json!(speed);
        }
        merge_extra(&mut body, &options.extra);
        body
    }

    async fn send(&self, body: &serde_json::Value) -> Result<reqwest::Response> {
        let endpoint = format!("{}{}", self.base_url.trim_end_matches('/'), SPEECH_PATH);
        self.http_client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                Error::network_with_context(
                    format!("synthesis request failed: {e}"),
                    ErrorContext::new().with_source("openai"),
                )
            })
    }
}

#[async_trait]
impl TtsProvider for OpenAiTts {
    fn provider_id(&self) -> &str {
        "openai"
    }

    fn sample_rate(&self) -> u32 {
        Self::SAMPLE_RATE
    }

    async fn synthesize(&self, text: &str, options: &SynthesisOptions) -> Result<AudioData> {
        let format_str = options.response_format.as_deref().unwrap_or("pcm");
        let format: EncodedFormat = format_str.parse()?;

        let body = self.request_body(text, options, format_str);
        let response = self.send(&body).await?;
        let bytes = read_audio_response(response, "openai").await?;
        AudioData::from_bytes(bytes, Self::SAMPLE_RATE, format)
    }

    async fn synthesize_stream(
        &self,
        text: &str,
        options: &SynthesisOptions,
    ) -> Result<AudioStream> {
        let format_str = options.response_format.as_deref().unwrap_or("pcm");
        let format: EncodedFormat = format_str.parse()?;

        let body = self.request_body(text, options, format_str);
        let response = check_stream_status(self.send(&body).await?, "openai").await?;
        Ok(audio_chunk_stream(
            response,
            Self::SAMPLE_RATE,
            format,
            format == EncodedFormat::Pcm,
        ))
    }
}

/// Builder for [`OpenAiTts`].
pub struct OpenAiTtsBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: String,
    voice: String,
    timeout_secs: u64,
}

impl OpenAiTtsBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            timeout_secs: 60,
        }
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Default model (`tts-1`, `tts-1-hd`, `gpt-4o-mini-tts`).
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Default voice (`alloy`, `ash`, `coral`, `echo`, `fable`, `onyx`,
    /// `nova`, `sage`, `shimmer`, ...).
    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<OpenAiTts> {
        let api_key = self
            .api_key
            .or_else(|| transport::resolve_api_key("openai"))
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "OpenAI API key is required",
                    ErrorContext::new()
                        .with_field_path("api_key")
                        .with_details("pass api_key() or set OPENAI_API_KEY"),
                )
            })?;
        Ok(OpenAiTts {
            http_client: transport::build_client(self.timeout_secs)?,
            api_key,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: self.model,
            voice: self.voice,
        })
    }
}

impl Default for OpenAiTtsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAiTts {
        OpenAiTts::builder().api_key("test-key").build().unwrap()
    }

    #[test]
    fn body_uses_builder_defaults() {
        let body = client().request_body("hi", &SynthesisOptions::default(), "pcm");
        assert_eq!(body["model"], "tts-1");
        assert_eq!(body["voice"], "alloy");
        assert_eq!(body["input"], "hi");
        assert_eq!(body["response_format"], "pcm");
        assert!(body.get("speed").is_none());
    }

    #[test]
    fn options_override_defaults_and_merge_extra() {
        let options = SynthesisOptions::new()
            .with_voice("nova")
            .with_model("tts-1-hd")
            .with_speed(1.25)
            .with_extra("instructions", serde_json::json!("whisper"));
        let body = client().request_body("hi", &options, "mp3");
        assert_eq!(body["model"], "tts-1-hd");
        assert_eq!(body["voice"], "nova");
        assert_eq!(body["speed"], 1.25);
        assert_eq!(body["instructions"], "whisper");
    }

    #[test]
    fn unsupported_format_is_a_validation_error() {
        let client = client();
        let options = SynthesisOptions::new().with_response_format("opus");
        let err = tokio_test::block_on(client.synthesize("hi", &options)).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
