//! Kokoro local runtime provider.
//!
//! Kokoro runs as a local OpenAI-compatible speech server (default
//! `http://localhost:8880`); this client targets its `/v1/audio/speech`
//! endpoint. No credentials are involved.

use async_trait::async_trait;

use super::{
    audio_chunk_stream, check_stream_status, merge_extra, read_audio_response, AudioStream,
    SynthesisOptions, TtsProvider,
};
use crate::audio::{AudioData, EncodedFormat};
use crate::transport;
use crate::{Error, ErrorContext, Result};

const DEFAULT_BASE_URL: &str = "http://localhost:8880";
const SPEECH_PATH: &str = "/v1/audio/speech";

/// Kokoro text-to-speech client against a local runtime server.
///
/// Output is fixed at 24000 Hz. Voices can be blended by passing a
/// comma-separated list (`"af_heart, af_bella"`).
#[derive(Debug)]
pub struct KokoroTts {
    http_client: reqwest::Client,
    base_url: String,
    voice: String,
}

impl KokoroTts {
    pub const SAMPLE_RATE: u32 = 24000;

    pub fn builder() -> KokoroTtsBuilder {
        KokoroTtsBuilder::new()
    }

    fn request_body(&self, text: &str, options: &SynthesisOptions, format: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": options.model.as_deref().unwrap_or("kokoro"),
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
            .json(body)
            .send()
            .await
            .map_err(|e| {
                Error::network_with_context(
                    format!("synthesis request failed (is the Kokoro server running?): {e}"),
                    ErrorContext::new().with_source("kokoro"),
                )
            })
    }
}

#[async_trait]
impl TtsProvider for KokoroTts {
    fn provider_id(&self) -> &str {
        "kokoro"
    }

    fn sample_rate(&self) -> u32 {
        Self::SAMPLE_RATE
    }

    async fn synthesize(&self, text: &str, options: &SynthesisOptions) -> Result<AudioData> {
        let format_str = options.response_format.as_deref().unwrap_or("pcm");
        let format: EncodedFormat = format_str.parse()?;

        let body = self.request_body(text, options, format_str);
        let response = self.send(&body).await?;
        let bytes = read_audio_response(response, "kokoro").await?;
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
        let response = check_stream_status(self.send(&body).await?, "kokoro").await?;
        // Same wire shape as the OpenAI endpoint, same PCM realignment.
        Ok(audio_chunk_stream(
            response,
            Self::SAMPLE_RATE,
            format,
            format == EncodedFormat::Pcm,
        ))
    }
}

/// Builder for [`KokoroTts`].
pub struct KokoroTtsBuilder {
    base_url: Option<String>,
    voice: String,
    timeout_secs: u64,
}

impl KokoroTtsBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            voice: "af_heart".to_string(),
            timeout_secs: 120,
        }
    }

    /// Runtime server address (default `http://localhost:8880`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Default voice (`af_heart`, `af_bella`, `am_adam`, ...; blend with a
    /// comma-separated list).
    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<KokoroTts> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        url::Url::parse(&base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid Kokoro base URL: {e}"),
                ErrorContext::new().with_field_path("base_url"),
            )
        })?;
        Ok(KokoroTts {
            http_client: transport::build_client(self.timeout_secs)?,
            base_url,
            voice: self.voice,
        })
    }
}

impl Default for KokoroTtsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_defaults_to_kokoro_model_and_heart_voice() {
        let client = KokoroTts::builder().build().unwrap();
        let body = client.request_body("hi", &SynthesisOptions::default(), "pcm");
        assert_eq!(body["model"], "kokoro");
        assert_eq!(body["voice"], "af_heart");
    }

    #[test]
    fn invalid_base_url_is_a_configuration_error() {
        let err = KokoroTts::builder().base_url("not a url").build().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
