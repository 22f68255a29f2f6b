//! Fish Audio speech synthesis provider.

use async_trait::async_trait;

use super::{
    audio_chunk_stream, check_stream_status, merge_extra, read_audio_response, AudioStream,
    SynthesisOptions, TtsProvider,
};
use crate::audio::{AudioData, EncodedFormat};
use crate::transport;
use crate::{Error, ErrorContext, Result};

const DEFAULT_BASE_URL: &str = "https://api.fish.audio";
const TTS_PATH: &str = "/v1/tts";

/// Fish Audio text-to-speech client (`/v1/tts`).
///
/// Output is fixed at 44100 Hz. The `voice` option carries the reference
/// voice id used for cloning; prosody is assembled from the `speed` option
/// and a `volume` extra, so callers never build a prosody object themselves.
pub struct FishAudioTts {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    reference_id: Option<String>,
}

impl FishAudioTts {
    pub const SAMPLE_RATE: u32 = 44100;

    pub fn builder() -> FishAudioTtsBuilder {
        FishAudioTtsBuilder::new()
    }

    fn request_body(&self, text: &str, options: &SynthesisOptions, format: &str) -> serde_json::Value {
        let mut extra = options.extra.clone();
        let volume = extra
            .remove("volume")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        let speed = options.speed.unwrap_or(1.0);

        let mut body = serde_json::json!({
            "text": text,
            "format": format,
            "prosody": { "speed": speed, "volume": volume },
        });
        let reference_id = options.voice.as_deref().or(self.reference_id.as_deref());
        if let Some(id) = reference_id {
            body["reference_id"] = serde_json::json!(id);
        }
        merge_extra(&mut body, &extra);
        body
    }

    async fn send(&self, body: &serde_json::Value) -> Result<reqwest::Response> {
        let endpoint = format!("{}{}", self.base_url.trim_end_matches('/'), TTS_PATH);
        self.http_client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                Error::network_with_context(
                    format!("synthesis request failed: {e}"),
                    ErrorContext::new().with_source("fishaudio"),
                )
            })
    }
}

#[async_trait]
impl TtsProvider for FishAudioTts {
    fn provider_id(&self) -> &str {
        "fishaudio"
    }

    fn sample_rate(&self) -> u32 {
        Self::SAMPLE_RATE
    }

    async fn synthesize(&self, text: &str, options: &SynthesisOptions) -> Result<AudioData> {
        let format_str = options.response_format.as_deref().unwrap_or("pcm");
        let format: EncodedFormat = format_str.parse()?;

        let body = self.request_body(text, options, format_str);
        let response = self.send(&body).await?;
        let bytes = read_audio_response(response, "fishaudio").await?;
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
        let response = check_stream_status(self.send(&body).await?, "fishaudio").await?;
        Ok(audio_chunk_stream(
            response,
            Self::SAMPLE_RATE,
            format,
            format == EncodedFormat::Pcm,
        ))
    }
}

/// Builder for [`FishAudioTts`].
pub struct FishAudioTtsBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    reference_id: Option<String>,
    timeout_secs: u64,
}

impl FishAudioTtsBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            reference_id: None,
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

    /// Default reference voice id for cloning (from the Fish Audio
    /// dashboard).
    pub fn reference_id(mut self, id: impl Into<String>) -> Self {
        self.reference_id = Some(id.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<FishAudioTts> {
        let api_key = self
            .api_key
            .or_else(|| transport::resolve_api_key("fishaudio"))
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "Fish Audio API key is required",
                    ErrorContext::new()
                        .with_field_path("api_key")
                        .with_details("pass api_key() or set FISHAUDIO_API_KEY"),
                )
            })?;
        Ok(FishAudioTts {
            http_client: transport::build_client(self.timeout_secs)?,
            api_key,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            reference_id: self.reference_id,
        })
    }
}

impl Default for FishAudioTtsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
