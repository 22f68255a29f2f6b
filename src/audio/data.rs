//! The unified audio container.

use bytes::Bytes;
use once_cell::sync::OnceCell;

use super::codec;
use super::format::{AudioFormat, EncodedFormat};
use super::samples::{SampleType, Samples};
use crate::{Error, ErrorContext, Result};

#[derive(Debug, Clone)]
enum Payload {
    /// Encoded bytes in a known byte format.
    Encoded { data: Bytes, format: EncodedFormat },
    /// Decoded samples ("raw").
    Samples(Samples),
}

/// Container for audio data with metadata and conversion utilities.
///
/// Every provider returns this type regardless of what its API emits: raw
/// PCM bytes, a WAV or MP3 container, or already-decoded sample buffers.
/// The payload is either encoded bytes tagged with an [`EncodedFormat`] or a
/// typed [`Samples`] buffer; the byte-format/sample-payload pairing that the
/// original data model policed at runtime is enforced here by construction.
///
/// Conversions are invertible: converting to the payload's own format
/// returns the payload unchanged, byte for byte.
///
/// ```rust
/// use tts_lib_rust::{AudioData, EncodedFormat, SampleType};
///
/// # fn main() -> tts_lib_rust::Result<()> {
/// let audio = AudioData::from_bytes(vec![0u8; 48000], 24000, EncodedFormat::Pcm)?;
/// assert_eq!(audio.duration()?, 1.0);
///
/// let wav = audio.as_bytes(EncodedFormat::Wav)?;
/// let floats = audio.as_samples(SampleType::F32)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AudioData {
    payload: Payload,
    sample_rate: u32,
    duration: OnceCell<f64>,
}

impl AudioData {
    /// Wrap an encoded byte payload.
    ///
    /// Rejects empty payloads and a zero sample rate.
    pub fn from_bytes(
        data: impl Into<Bytes>,
        sample_rate: u32,
        format: EncodedFormat,
    ) -> Result<Self> {
        let data = data.into();
        if data.is_empty() {
            return Err(Error::validation_with_context(
                "audio payload must not be empty",
                ErrorContext::new().with_field_path("data"),
            ));
        }
        Self::check_sample_rate(sample_rate)?;
        Ok(Self {
            payload: Payload::Encoded { data, format },
            sample_rate,
            duration: OnceCell::new(),
        })
    }

    /// Wrap a decoded sample buffer (format `raw`).
    pub fn from_samples(samples: impl Into<Samples>, sample_rate: u32) -> Result<Self> {
        let samples = samples.into();
        if samples.is_empty() {
            return Err(Error::validation_with_context(
                "audio payload must not be empty",
                ErrorContext::new().with_field_path("data"),
            ));
        }
        Self::check_sample_rate(sample_rate)?;
        Ok(Self {
            payload: Payload::Samples(samples),
            sample_rate,
            duration: OnceCell::new(),
        })
    }

    fn check_sample_rate(sample_rate: u32) -> Result<()> {
        if sample_rate == 0 {
            return Err(Error::validation_with_context(
                "sample rate must be greater than 0",
                ErrorContext::new().with_field_path("sample_rate"),
            ));
        }
        Ok(())
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Format of the payload; `Raw` for sample buffers.
    pub fn format(&self) -> AudioFormat {
        match &self.payload {
            Payload::Encoded { format, .. } => (*format).into(),
            Payload::Samples(_) => AudioFormat::Raw,
        }
    }

    /// Sample type of the payload, or `None` for encoded bytes.
    pub fn sample_type(&self) -> Option<SampleType> {
        match &self.payload {
            Payload::Encoded { .. } => None,
            Payload::Samples(s) => Some(s.sample_type()),
        }
    }

    pub fn is_bytes(&self) -> bool {
        matches!(self.payload, Payload::Encoded { .. })
    }

    pub fn is_samples(&self) -> bool {
        matches!(self.payload, Payload::Samples(_))
    }

    /// Size of the payload in bytes.
    pub fn byte_len(&self) -> usize {
        match &self.payload {
            Payload::Encoded { data, .. } => data.len(),
            Payload::Samples(s) => s.len() * s.sample_type().width(),
        }
    }

    /// Audio duration in seconds. Computed on first call, then cached.
    ///
    /// `Raw` and `Pcm` payloads are arithmetic; `Wav` reads the container
    /// header; `Mp3` reads stream metadata and falls back to a decode pass.
    pub fn duration(&self) -> Result<f64> {
        if let Some(d) = self.duration.get() {
            return Ok(*d);
        }
        let d = self.compute_duration()?;
        Ok(*self.duration.get_or_init(|| d))
    }

    fn compute_duration(&self) -> Result<f64> {
        let rate = self.sample_rate as f64;
        match &self.payload {
            Payload::Samples(s) => Ok(s.len() as f64 / rate),
            Payload::Encoded { data, format } => match format {
                // 16-bit mono wire format
                EncodedFormat::Pcm => Ok(data.len() as f64 / 2.0 / rate),
                EncodedFormat::Wav => Ok(codec::wav_duration(data)?),
                #[cfg(feature = "mp3")]
                EncodedFormat::Mp3 => Ok(codec::mp3_duration(data)?),
                #[cfg(not(feature = "mp3"))]
                EncodedFormat::Mp3 => Err(super::CodecError::Mp3Disabled.into()),
            },
        }
    }

    /// Convert the payload to bytes in the requested format.
    ///
    /// A byte payload already in `output` format is returned as-is;
    /// everything else goes through the i16 intermediate and is re-encoded.
    pub fn as_bytes(&self, output: EncodedFormat) -> Result<Vec<u8>> {
        let intermediate = match &self.payload {
            Payload::Encoded { data, format } => {
                if *format == output {
                    return Ok(data.to_vec());
                }
                codec::decode_to_i16(data, *format)?
            }
            Payload::Samples(s) => codec::samples_to_i16(s),
        };
        Ok(codec::encode_from_i16(&intermediate, self.sample_rate, output)?)
    }

    /// Convert the payload to a sample buffer of the requested type.
    ///
    /// Encoded payloads are decoded first; sample payloads are rescaled
    /// between integer and float ranges as needed.
    pub fn as_samples(&self, target: SampleType) -> Result<Samples> {
        match &self.payload {
            Payload::Samples(s) if s.sample_type() == target => Ok(s.clone()),
            Payload::Samples(s) => Ok(codec::convert_samples(s, target)),
            Payload::Encoded { data, format } => {
                let decoded = Samples::I16(codec::decode_to_i16(data, *format)?);
                if target == SampleType::I16 {
                    Ok(decoded)
                } else {
                    Ok(codec::convert_samples(&decoded, target))
                }
            }
        }
    }
}

impl std::fmt::Display for AudioData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let preview = match &self.payload {
            Payload::Encoded { data, .. } => format!("<{} bytes>", data.len()),
            Payload::Samples(s) => format!("<{} samples>", s.len()),
        };
        let sample_type = self
            .sample_type()
            .map_or_else(|| "none".to_string(), |t| t.to_string());
        let duration = self
            .duration()
            .map_or_else(|_| "?".to_string(), |d| format!("{d:.2}s"));
        write!(
            f,
            "AudioData(data={}, sample_rate={}, format={}, sample_type={}, duration={})",
            preview,
            self.sample_rate,
            self.format(),
            sample_type,
            duration
        )
    }
}
