//! Provider 抽象层 — 通过 trait 实现多厂商 TTS 适配的动态分发
//!
//! Provider abstraction layer. Uses `Box<dyn TtsProvider>` for runtime
//! polymorphism, enabling the same call sites to work with OpenAI,
//! ElevenLabs, Fish Audio, and the local Kokoro / GPT-SoVITS runtimes.
//! Swapping providers is swapping one constructor call.

pub mod elevenlabs;
pub mod fishaudio;
pub mod gptsovits;
pub mod kokoro;
pub mod openai;

mod stream;

pub use elevenlabs::{ElevenLabsTts, ElevenLabsTtsBuilder};
pub use fishaudio::{FishAudioTts, FishAudioTtsBuilder};
pub use gptsovits::{GptSovitsTts, GptSovitsTtsBuilder};
pub use kokoro::{KokoroTts, KokoroTtsBuilder};
pub use openai::{OpenAiTts, OpenAiTtsBuilder};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::audio::{AudioData, EncodedFormat};
use crate::transport::TransportError;
use crate::{BoxStream, Error, ErrorContext, Result};

/// A stream of synthesized audio chunks.
pub type AudioStream = BoxStream<'static, AudioData>;

/// The seam every provider implements.
///
/// `synthesize` produces the whole utterance in one [`AudioData`];
/// `synthesize_stream` yields chunks as the provider produces them.
#[async_trait]
pub trait TtsProvider: Send + Sync {
    /// Stable provider identifier (e.g. "openai").
    fn provider_id(&self) -> &str;

    /// Native sample rate of this provider's output in Hz.
    fn sample_rate(&self) -> u32;

    /// Generate speech from text in a single request.
    async fn synthesize(&self, text: &str, options: &SynthesisOptions) -> Result<AudioData>;

    /// Generate speech from text in streaming mode.
    async fn synthesize_stream(
        &self,
        text: &str,
        options: &SynthesisOptions,
    ) -> Result<AudioStream>;
}

/// Per-request options, shared by every provider.
///
/// Unset fields fall back to the defaults configured on the provider's
/// builder. `extra` is merged verbatim into the provider request body for
/// provider-specific parameters the common shape does not model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthesisOptions {
    /// Voice identifier (provider-specific naming).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Model identifier, for providers that version their models.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Wire format string understood by the provider
    /// (e.g. "pcm", "mp3", ElevenLabs' "pcm_22050").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<String>,
    /// Speech speed multiplier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    /// Provider-specific body parameters, merged into the request.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SynthesisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_response_format(mut self, format: impl Into<String>) -> Self {
        self.response_format = Some(format.into());
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Built-in provider identifiers, for registries and diagnostics.
///
/// This does not replace constructing a concrete client; it helps code that
/// routes by provider id do so without stringly-typed matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    ElevenLabs,
    FishAudio,
    Kokoro,
    GptSovits,
    /// Arbitrary provider id (matches a custom `TtsProvider` impl).
    Custom(String),
}

impl ProviderKind {
    pub fn id(&self) -> &str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::ElevenLabs => "elevenlabs",
            ProviderKind::FishAudio => "fishaudio",
            ProviderKind::Kokoro => "kokoro",
            ProviderKind::GptSovits => "gptsovits",
            ProviderKind::Custom(s) => s.as_str(),
        }
    }

    /// Whether this provider runs on the local machine (no credentials).
    pub fn is_local(&self) -> bool {
        matches!(self, ProviderKind::Kokoro | ProviderKind::GptSovits)
    }

    /// Environment variable consulted for this provider's API key.
    pub fn api_key_env(&self) -> String {
        format!("{}_API_KEY", self.id().to_uppercase())
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Merge `extra` request parameters into a JSON request body.
pub(crate) fn merge_extra(
    body: &mut serde_json::Value,
    extra: &serde_json::Map<String, serde_json::Value>,
) {
    if let Some(obj) = body.as_object_mut() {
        for (k, v) in extra {
            obj.insert(k.clone(), v.clone());
        }
    }
}

/// Read a whole-body audio response, mapping non-2xx to `Error::Remote`.
pub(crate) async fn read_audio_response(
    response: reqwest::Response,
    source: &str,
) -> Result<Bytes> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(|e| {
        Error::network_with_context(
            format!("failed to read synthesis response: {e}"),
            ErrorContext::new().with_source(source),
        )
    })?;
    if !status.is_success() {
        let body = String::from_utf8_lossy(&bytes);
        return Err(Error::remote(
            status.as_u16(),
            format!("{source} synthesis failed: {body}"),
        ));
    }
    tracing::debug!(provider = source, bytes = bytes.len(), "synthesis complete");
    Ok(bytes)
}

/// Fail early on a non-2xx streaming response.
pub(crate) async fn check_stream_status(
    response: reqwest::Response,
    source: &str,
) -> Result<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::remote(
            status.as_u16(),
            format!("{source} synthesis failed: {body}"),
        ));
    }
    Ok(response)
}

/// Turn a streaming response body into an `AudioStream`.
///
/// With `align_frames`, chunks are realigned to 16-bit PCM frame boundaries
/// before wrapping; empty chunks are dropped either way.
pub(crate) fn audio_chunk_stream(
    response: reqwest::Response,
    sample_rate: u32,
    format: EncodedFormat,
    align_frames: bool,
) -> AudioStream {
    let bytes = response
        .bytes_stream()
        .map(|r| r.map_err(|e| Error::Transport(TransportError::Http(e))));

    let chunks: BoxStream<'static, Bytes> = if align_frames {
        Box::pin(stream::FrameAligned::new(Box::pin(bytes)))
    } else {
        Box::pin(bytes)
    };

    Box::pin(chunks.filter_map(move |res| {
        futures::future::ready(match res {
            Ok(chunk) if chunk.is_empty() => None,
            Ok(chunk) => Some(AudioData::from_bytes(chunk, sample_rate, format)),
            Err(e) => Some(Err(e)),
        })
    }))
}
