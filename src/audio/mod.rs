//! 音频数据模块：把各厂商异构的音频输出归一化为统一的 `AudioData` 容器。
//!
//! Audio normalization layer. Providers emit raw PCM bytes, WAV/MP3
//! containers, or decoded sample buffers at differing rates and numeric
//! types; everything lands in one [`AudioData`] container with lossless,
//! invertible conversion between formats and sample types.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`AudioData`] | The unified container (bytes or samples + rate) |
//! | [`AudioFormat`] / [`EncodedFormat`] | Payload format identifiers |
//! | [`Samples`] / [`SampleType`] | Typed sample buffers |
//! | [`codec`] | Encode/decode engine (PCM, WAV via `hound`, MP3 via `symphonia`/LAME) |

pub mod codec;
mod data;
mod format;
mod samples;

pub use codec::CodecError;
pub use data::AudioData;
pub use format::{AudioFormat, EncodedFormat};
pub use samples::{SampleType, Samples};
