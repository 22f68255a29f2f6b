//! ElevenLabs speech synthesis provider.

use async_trait::async_trait;

use super::{
    audio_chunk_stream, check_stream_status, merge_extra, read_audio_response, AudioStream,
    SynthesisOptions, TtsProvider,
};
use crate::audio::{AudioData, EncodedFormat};
use crate::transport;
use crate::{Error, ErrorContext, Result};

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
const DEFAULT_VOICE_ID: &str = "JBFqnCBsd6RMkjVDRZzb";
const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";
const DEFAULT_OUTPUT_FORMAT: &str = "pcm_22050";

/// ElevenLabs text-to-speech client (`/v1/text-to-speech/{voice_id}`).
///
/// The output sample rate is carried in the wire format string
/// (`pcm_22050`, `mp3_44100_192`, ...), so it varies per request.
pub struct ElevenLabsTts {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    voice_id: String,
    model_id: String,
    output_format: String,
}

impl ElevenLabsTts {
    pub const DEFAULT_SAMPLE_RATE: u32 = 22050;

    pub fn builder() -> ElevenLabsTtsBuilder {
        ElevenLabsTtsBuilder::new()
    }

    /// Parse a wire format string `codec_rate[_bitrate]` into an encoded
    /// format and a sample rate. Codecs outside pcm/wav/mp3 (ulaw, opus...)
    /// are rejected up front.
    fn parse_output_format(format: &str) -> Result<(EncodedFormat, u32)> {
        let mut parts = format.split('_');
        let codec = parts.next().unwrap_or_default();
        let encoded: EncodedFormat = codec.parse().map_err(|_| {
            Error::validation_with_context(
                format!("unsupported ElevenLabs output format: {format}"),
                ErrorContext::new()
                    .with_field_path("response_format")
                    .with_details("expected codec_rate with codec pcm or mp3"),
            )
        })?;
        let sample_rate = match parts.next() {
            Some(rate) => rate.parse::<u32>().map_err(|_| {
                Error::validation_with_context(
                    format!("invalid sample rate in output format: {format}"),
                    ErrorContext::new().with_field_path("response_format"),
                )
            })?,
            None => Self::DEFAULT_SAMPLE_RATE,
        };
        Ok((encoded, sample_rate))
    }

    fn request_body(&self, text: &str, options: &SynthesisOptions) -> serde_json::Value {
        let mut body = serde_json::json!({
            "text": text,
            "model_id": options.model.as_deref().unwrap_or(&self.model_id),
        });
        merge_extra(&mut body, &options.extra);
        body
    }

    async fn send(
        &self,
        path: &str,
        output_format: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response> {
        let endpoint = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        self.http_client
            .post(&endpoint)
            .header("xi-api-key", &self.api_key)
            .query(&[("output_format", output_format)])
            .json(body)
            .send()
            .await
            .map_err(|e| {
                Error::network_with_context(
                    format!("synthesis request failed: {e}"),
                    ErrorContext::new().with_source("elevenlabs"),
                )
            })
    }

    fn voice_path(&self, options: &SynthesisOptions, streaming: bool) -> String {
        let voice_id = options.voice.as_deref().unwrap_or(&self.voice_id);
        if streaming {
            format!("/v1/text-to-speech/{voice_id}/stream")
        } else {
            format!("/v1/text-to-speech/{voice_id}")
        }
    }
}

#[async_trait]
impl TtsProvider for ElevenLabsTts {
    fn provider_id(&self) -> &str {
        "elevenlabs"
    }

    /// Rate parsed from the configured output format.
    fn sample_rate(&self) -> u32 {
        Self::parse_output_format(&self.output_format)
            .map(|(_, rate)| rate)
            .unwrap_or(Self::DEFAULT_SAMPLE_RATE)
    }

    async fn synthesize(&self, text: &str, options: &SynthesisOptions) -> Result<AudioData> {
        let format_str = options
            .response_format
            .as_deref()
            .unwrap_or(&self.output_format);
        let (format, sample_rate) = Self::parse_output_format(format_str)?;

        let body = self.request_body(text, options);
        let response = self
            .send(&self.voice_path(options, false), format_str, &body)
            .await?;
        let bytes = read_audio_response(response, "elevenlabs").await?;
        AudioData::from_bytes(bytes, sample_rate, format)
    }

    async fn synthesize_stream(
        &self,
        text: &str,
        options: &SynthesisOptions,
    ) -> Result<AudioStream> {
        let format_str = options
            .response_format
            .as_deref()
            .unwrap_or(&self.output_format);
        let (format, sample_rate) = Self::parse_output_format(format_str)?;

        let body = self.request_body(text, options);
        let response = self
            .send(&self.voice_path(options, true), format_str, &body)
            .await?;
        let response = check_stream_status(response, "elevenlabs").await?;
        // Provider chunks pass through one-to-one.
        Ok(audio_chunk_stream(response, sample_rate, format, false))
    }
}

/// Builder for [`ElevenLabsTts`].
pub struct ElevenLabsTtsBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    voice_id: String,
    model_id: String,
    output_format: String,
    timeout_secs: u64,
}

impl ElevenLabsTtsBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
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

    /// Default voice id (from the ElevenLabs dashboard).
    pub fn voice_id(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = voice_id.into();
        self
    }

    /// Default model (`eleven_multilingual_v2`, `eleven_turbo_v2`, ...).
    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Default wire format, `codec_rate[_bitrate]` (e.g. `pcm_44100`,
    /// `mp3_22050_32`).
    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = format.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<ElevenLabsTts> {
        let api_key = self
            .api_key
            .or_else(|| transport::resolve_api_key("elevenlabs"))
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "ElevenLabs API key is required",
                    ErrorContext::new()
                        .with_field_path("api_key")
                        .with_details("pass api_key() or set ELEVENLABS_API_KEY"),
                )
            })?;
        // Reject an unusable default format at build time, not per request.
        ElevenLabsTts::parse_output_format(&self.output_format)?;
        Ok(ElevenLabsTts {
            http_client: transport::build_client(self.timeout_secs)?,
            api_key,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            voice_id: self.voice_id,
            model_id: self.model_id,
            output_format: self.output_format,
        })
    }
}

impl Default for ElevenLabsTtsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parses_codec_and_rate() {
        assert_eq!(
            ElevenLabsTts::parse_output_format("pcm_22050").unwrap(),
            (EncodedFormat::Pcm, 22050)
        );
        assert_eq!(
            ElevenLabsTts::parse_output_format("pcm_44100").unwrap(),
            (EncodedFormat::Pcm, 44100)
        );
        assert_eq!(
            ElevenLabsTts::parse_output_format("mp3_44100_192").unwrap(),
            (EncodedFormat::Mp3, 44100)
        );
    }

    #[test]
    fn bare_codec_falls_back_to_default_rate() {
        assert_eq!(
            ElevenLabsTts::parse_output_format("pcm").unwrap(),
            (EncodedFormat::Pcm, ElevenLabsTts::DEFAULT_SAMPLE_RATE)
        );
    }

    #[test]
    fn telephony_codecs_are_rejected() {
        assert!(ElevenLabsTts::parse_output_format("ulaw_8000").is_err());
        assert!(ElevenLabsTts::parse_output_format("opus_48000").is_err());
    }

    #[test]
    fn builder_rejects_bad_default_format() {
        let result = ElevenLabsTts::builder()
            .api_key("key")
            .output_format("ulaw_8000")
            .build();
        assert!(result.is_err());
    }
}
