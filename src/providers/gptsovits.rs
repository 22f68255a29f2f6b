//! GPT-SoVITS local runtime provider.
//!
//! Targets the GPT-SoVITS v2 inference server (default
//! `http://localhost:9880`). One-shot synthesis asks for a WAV container;
//! streaming flips the server into fragment mode, which emits raw PCM.

use async_trait::async_trait;

use super::{
    audio_chunk_stream, check_stream_status, merge_extra, read_audio_response, AudioStream,
    SynthesisOptions, TtsProvider,
};
use crate::audio::{AudioData, EncodedFormat};
use crate::transport;
use crate::{Error, ErrorContext, Result};

const DEFAULT_BASE_URL: &str = "http://localhost:9880";
const TTS_PATH: &str = "/tts";

/// GPT-SoVITS text-to-speech client against a local inference server.
///
/// The model family emits 32000 Hz audio; override with
/// [`GptSovitsTtsBuilder::sample_rate`] when serving a model that differs.
pub struct GptSovitsTts {
    http_client: reqwest::Client,
    base_url: String,
    text_lang: String,
    prompt_lang: String,
    ref_audio_path: Option<String>,
    sample_rate: u32,
}

impl GptSovitsTts {
    pub fn builder() -> GptSovitsTtsBuilder {
        GptSovitsTtsBuilder::new()
    }

    fn request_body(
        &self,
        text: &str,
        options: &SynthesisOptions,
        media_type: &str,
        streaming: bool,
    ) -> serde_json::Value {
        let mut body = serde_json::json!({
            "text": text,
            "text_lang": &self.text_lang,
            "prompt_lang": &self.prompt_lang,
            "media_type": media_type,
            "streaming_mode": streaming,
        });
        if let Some(path) = &self.ref_audio_path {
            body["ref_audio_path"] = serde_json::json!(path);
        }
        if let Some(speed) = options.speed {
            body["speed_factor"] = serde_json::json!(speed);
        }
        merge_extra(&mut body, &options.extra);
        body
    }

    async fn send(&self, body: &serde_json::Value) -> Result<reqwest::Response> {
        let endpoint = format!("{}{}", self.base_url.trim_end_matches('/'), TTS_PATH);
        self.http_client
            .post(&endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                Error::network_with_context(
                    format!("synthesis request failed (is the GPT-SoVITS server running?): {e}"),
                    ErrorContext::new().with_source("gptsovits"),
                )
            })
    }
}

#[async_trait]
impl TtsProvider for GptSovitsTts {
    fn provider_id(&self) -> &str {
        "gptsovits"
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    async fn synthesize(&self, text: &str, options: &SynthesisOptions) -> Result<AudioData> {
        let format_str = options.response_format.as_deref().unwrap_or("wav");
        let format: EncodedFormat = format_str.parse()?;

        let body = self.request_body(text, options, format_str, false);
        let response = self.send(&body).await?;
        let bytes = read_audio_response(response, "gptsovits").await?;
        AudioData::from_bytes(bytes, self.sample_rate, format)
    }

    async fn synthesize_stream(
        &self,
        text: &str,
        options: &SynthesisOptions,
    ) -> Result<AudioStream> {
        // Fragment mode emits raw PCM regardless of the one-shot default.
        let format_str = options.response_format.as_deref().unwrap_or("raw");
        let format = if format_str == "raw" {
            EncodedFormat::Pcm
        } else {
            format_str.parse()?
        };

        let body = self.request_body(text, options, format_str, true);
        let response = check_stream_status(self.send(&body).await?, "gptsovits").await?;
        Ok(audio_chunk_stream(
            response,
            self.sample_rate,
            format,
            format == EncodedFormat::Pcm,
        ))
    }
}

/// Builder for [`GptSovitsTts`].
pub struct GptSovitsTtsBuilder {
    base_url: Option<String>,
    text_lang: String,
    prompt_lang: String,
    ref_audio_path: Option<String>,
    sample_rate: u32,
    timeout_secs: u64,
}

impl GptSovitsTtsBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            text_lang: "en".to_string(),
            prompt_lang: "en".to_string(),
            ref_audio_path: None,
            sample_rate: 32000,
            timeout_secs: 300,
        }
    }

    /// Inference server address (default `http://localhost:9880`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Language of the text to synthesize (`en`, `zh`, `ja`, `ko`, ...).
    pub fn text_lang(mut self, lang: impl Into<String>) -> Self {
        self.text_lang = lang.into();
        self
    }

    /// Language of the reference audio prompt.
    pub fn prompt_lang(mut self, lang: impl Into<String>) -> Self {
        self.prompt_lang = lang.into();
        self
    }

    /// Server-side path to the reference audio for voice cloning
    /// (3-10 seconds of clear speech).
    pub fn ref_audio_path(mut self, path: impl Into<String>) -> Self {
        self.ref_audio_path = Some(path.into());
        self
    }

    /// Output rate of the served model.
    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<GptSovitsTts> {
        if self.sample_rate == 0 {
            return Err(Error::configuration_with_context(
                "sample rate must be greater than 0",
                ErrorContext::new().with_field_path("sample_rate"),
            ));
        }
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        url::Url::parse(&base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid GPT-SoVITS base URL: {e}"),
                ErrorContext::new().with_field_path("base_url"),
            )
        })?;
        Ok(GptSovitsTts {
            http_client: transport::build_client(self.timeout_secs)?,
            base_url,
            text_lang: self.text_lang,
            prompt_lang: self.prompt_lang,
            ref_audio_path: self.ref_audio_path,
            sample_rate: self.sample_rate,
        })
    }
}

impl Default for GptSovitsTtsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
