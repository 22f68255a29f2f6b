//! Audio format identifiers.

use crate::{Error, ErrorContext};

/// Format of an [`AudioData`](super::AudioData) payload.
///
/// `Raw` is the format of decoded sample buffers; the remaining variants are
/// encoded byte formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Pcm,
    Wav,
    Mp3,
    Raw,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pcm => "pcm",
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Raw => "raw",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pcm => "audio/pcm",
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
            Self::Raw => "audio/pcm",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The encoded byte subset of [`AudioFormat`]: valid formats for byte
/// payloads and valid `as_bytes` targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodedFormat {
    Pcm,
    Wav,
    Mp3,
}

impl EncodedFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pcm => "pcm",
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        AudioFormat::from(*self).mime_type()
    }
}

impl From<EncodedFormat> for AudioFormat {
    fn from(f: EncodedFormat) -> Self {
        match f {
            EncodedFormat::Pcm => AudioFormat::Pcm,
            EncodedFormat::Wav => AudioFormat::Wav,
            EncodedFormat::Mp3 => AudioFormat::Mp3,
        }
    }
}

impl std::str::FromStr for EncodedFormat {
    type Err = Error;

    /// Parse a provider wire string. Unknown codecs (opus, aac, flac, ulaw...)
    /// are rejected here instead of surfacing later as undecodable payloads.
    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "pcm" => Ok(Self::Pcm),
            "wav" => Ok(Self::Wav),
            "mp3" => Ok(Self::Mp3),
            other => Err(Error::validation_with_context(
                format!("unsupported audio format: {other}"),
                ErrorContext::new()
                    .with_field_path("response_format")
                    .with_details("valid formats are: pcm, wav, mp3"),
            )),
        }
    }
}

impl std::fmt::Display for EncodedFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
