//! # tts-lib-rust
//!
//! 统一的多厂商语音合成客户端：一套请求/响应接口适配云端与本地 TTS 服务。
//!
//! Unified TTS runtime - one client surface over cloud and local
//! speech synthesis providers.
//!
//! ## Overview
//!
//! This library exposes a single request/response shape across independent
//! text-to-speech providers. Calling code picks a provider by constructing a
//! different client; everything downstream of the constructor - options,
//! synthesis calls, streaming, audio handling - stays identical.
//!
//! Cloud APIs (OpenAI, ElevenLabs, Fish Audio) and local model runtimes
//! (Kokoro, GPT-SoVITS) all return [`AudioData`]: a container that normalizes
//! raw PCM bytes, encoded WAV/MP3 payloads, and typed sample buffers into one
//! object with lossless, invertible format and sample-type conversion.
//!
//! ## Core Philosophy
//!
//! - **Provider-Agnostic**: one [`TtsProvider`] trait across every backend
//! - **One Audio Shape**: heterogeneous provider outputs normalize to [`AudioData`]
//! - **Streaming-First**: chunked synthesis as a typed `Stream` everywhere
//! - **Type-Safe**: formats and sample types are enums, not strings
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tts_lib_rust::{providers::OpenAiTts, SynthesisOptions, TtsProvider};
//!
//! #[tokio::main]
//! async fn main() -> tts_lib_rust::Result<()> {
//!     let tts = OpenAiTts::builder()
//!         .api_key("your-api-key")
//!         .build()?;
//!
//!     let audio = tts.synthesize("Hello, world!", &SynthesisOptions::default()).await?;
//!
//!     let wav_bytes = audio.as_bytes(tts_lib_rust::EncodedFormat::Wav)?;
//!     let samples = audio.as_samples(tts_lib_rust::SampleType::F32)?;
//!     println!("{} ({} samples decoded)", audio, samples.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! Swapping providers is a one-line change at the constructor:
//!
//! ```rust,no_run
//! # use tts_lib_rust::providers::{ElevenLabsTts, KokoroTts};
//! # fn main() -> tts_lib_rust::Result<()> {
//! let cloud = ElevenLabsTts::builder().api_key("key").build()?;
//! let local = KokoroTts::builder().build()?; // local runtime, no credentials
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`audio`] | `AudioData` container, formats, sample types, codec engine |
//! | [`providers`] | `TtsProvider` trait and the built-in provider clients |
//! | [`transport`] | Shared HTTP client factory and credential resolution |

pub mod audio;
pub mod providers;
pub mod transport;

// Re-export main types for convenience
pub use audio::{AudioData, AudioFormat, EncodedFormat, SampleType, Samples};
pub use providers::{AudioStream, ProviderKind, SynthesisOptions, TtsProvider};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
