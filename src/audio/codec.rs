//! Encoding, decoding and sample-type conversion.
//!
//! All conversions go through a single intermediate representation: 16-bit
//! little-endian mono PCM. Byte formats decode to it, sample buffers
//! normalize to it, and every encoded output is produced from it. This keeps
//! the conversion graph a star instead of an N x N matrix.

use thiserror::Error;

use super::format::EncodedFormat;
use super::samples::{SampleType, Samples};

/// Integer ratio between the i32 and i16 sample ranges.
const I32_I16_SCALE: i32 = i32::MAX / (i16::MAX as i32);

/// Errors from the audio codec layer.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("empty audio payload")]
    EmptyData,

    #[error("PCM payload has odd byte length ({0}); expected 16-bit frames")]
    OddPcmLength(usize),

    #[error("WAV codec error: {0}")]
    Wav(#[from] hound::Error),

    #[cfg(feature = "mp3")]
    #[error("MP3 decode error: {0}")]
    Mp3Decode(#[from] symphonia::core::errors::Error),

    #[cfg(feature = "mp3")]
    #[error("MP3 encode error: {0}")]
    Mp3Encode(String),

    #[error("MP3 support is not enabled; rebuild with the `mp3` feature")]
    Mp3Disabled,

    #[error("no audio track in container")]
    NoAudioTrack,

    #[error("cannot determine audio duration")]
    UnknownDuration,
}

/// Decode an encoded byte payload to the i16 intermediate representation.
pub fn decode_to_i16(data: &[u8], format: EncodedFormat) -> Result<Vec<i16>, CodecError> {
    if data.is_empty() {
        return Err(CodecError::EmptyData);
    }
    match format {
        EncodedFormat::Pcm => decode_pcm(data),
        EncodedFormat::Wav => decode_wav(data),
        #[cfg(feature = "mp3")]
        EncodedFormat::Mp3 => Ok(decode_mp3(data)?.samples),
        #[cfg(not(feature = "mp3"))]
        EncodedFormat::Mp3 => Err(CodecError::Mp3Disabled),
    }
}

/// Encode i16 samples into the requested byte format.
pub fn encode_from_i16(
    samples: &[i16],
    sample_rate: u32,
    output: EncodedFormat,
) -> Result<Vec<u8>, CodecError> {
    if samples.is_empty() {
        return Err(CodecError::EmptyData);
    }
    match output {
        EncodedFormat::Pcm => Ok(encode_pcm(samples)),
        EncodedFormat::Wav => encode_wav(samples, sample_rate),
        #[cfg(feature = "mp3")]
        EncodedFormat::Mp3 => encode_mp3(samples, sample_rate),
        #[cfg(not(feature = "mp3"))]
        EncodedFormat::Mp3 => Err(CodecError::Mp3Disabled),
    }
}

/// Normalize a sample buffer to the i16 intermediate representation.
pub fn samples_to_i16(samples: &Samples) -> Vec<i16> {
    match samples {
        Samples::I16(v) => v.clone(),
        Samples::I32(v) => v.iter().map(|&s| (s / I32_I16_SCALE) as i16).collect(),
        Samples::F32(v) => v.iter().map(|&s| (s * i16::MAX as f32) as i16).collect(),
    }
}

/// Convert a sample buffer to the target sample type with proper scaling.
///
/// Float <-> int conversions scale by the integer max; int <-> int
/// conversions scale by the integer ratio of the two ranges.
pub fn convert_samples(samples: &Samples, target: SampleType) -> Samples {
    match (samples, target) {
        (Samples::I16(v), SampleType::I16) => Samples::I16(v.clone()),
        (Samples::I32(v), SampleType::I32) => Samples::I32(v.clone()),
        (Samples::F32(v), SampleType::F32) => Samples::F32(v.clone()),

        (Samples::I16(v), SampleType::I32) => Samples::I32(
            // saturating: i16::MIN * scale would land one past i32::MIN
            v.iter()
                .map(|&s| (s as i32).saturating_mul(I32_I16_SCALE))
                .collect(),
        ),
        (Samples::I32(v), SampleType::I16) => {
            Samples::I16(v.iter().map(|&s| (s / I32_I16_SCALE) as i16).collect())
        }

        (Samples::I16(v), SampleType::F32) => {
            Samples::F32(v.iter().map(|&s| s as f32 / i16::MAX as f32).collect())
        }
        (Samples::I32(v), SampleType::F32) => {
            Samples::F32(v.iter().map(|&s| s as f32 / i32::MAX as f32).collect())
        }

        (Samples::F32(v), SampleType::I16) => {
            Samples::I16(v.iter().map(|&s| (s * i16::MAX as f32) as i16).collect())
        }
        (Samples::F32(v), SampleType::I32) => {
            Samples::I32(v.iter().map(|&s| (s as f64 * i32::MAX as f64) as i32).collect())
        }
    }
}

fn decode_pcm(data: &[u8]) -> Result<Vec<i16>, CodecError> {
    if data.len() % 2 != 0 {
        return Err(CodecError::OddPcmLength(data.len()));
    }
    Ok(data
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect())
}

fn encode_pcm(samples: &[i16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}

/// Decode a WAV container to i16 samples.
///
/// 16-bit int is the wire format providers actually emit, but wider int
/// widths and float WAVs are scaled down rather than rejected.
fn decode_wav(data: &[u8]) -> Result<Vec<i16>, CodecError> {
    let mut reader = hound::WavReader::new(std::io::Cursor::new(data))?;
    let spec = reader.spec();
    match spec.sample_format {
        hound::SampleFormat::Int => {
            if spec.bits_per_sample <= 16 {
                reader
                    .samples::<i16>()
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(CodecError::from)
            } else {
                let shift = spec.bits_per_sample - 16;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| (s >> shift) as i16))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(CodecError::from)
            }
        }
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|s| (s * i16::MAX as f32) as i16))
            .collect::<Result<Vec<_>, _>>()
            .map_err(CodecError::from),
    }
}

fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, CodecError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &s in samples {
            writer.write_sample(s)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Duration of a WAV payload in seconds, read from the container header.
pub(crate) fn wav_duration(data: &[u8]) -> Result<f64, CodecError> {
    let reader = hound::WavReader::new(std::io::Cursor::new(data))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(CodecError::UnknownDuration);
    }
    Ok(reader.duration() as f64 / spec.sample_rate as f64)
}

#[cfg(feature = "mp3")]
pub(crate) struct Mp3Audio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: usize,
}

#[cfg(feature = "mp3")]
fn mp3_reader(
    data: &[u8],
) -> Result<Box<dyn symphonia::core::formats::FormatReader>, CodecError> {
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let mss = MediaSourceStream::new(
        Box::new(std::io::Cursor::new(data.to_vec())),
        Default::default(),
    );
    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    Ok(probed.format)
}

#[cfg(feature = "mp3")]
pub(crate) fn decode_mp3(data: &[u8]) -> Result<Mp3Audio, CodecError> {
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
    use symphonia::core::errors::Error as SymphoniaError;

    let mut reader = mp3_reader(data)?;
    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(CodecError::NoAudioTrack)?;
    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples: Vec<i16> = Vec::new();
    loop {
        let packet = match reader.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }
        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let mut buf = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buf.samples());
            }
            // Malformed frame; the decoder is in a recoverable state.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        }
    }

    if samples.is_empty() {
        return Err(CodecError::NoAudioTrack);
    }

    Ok(Mp3Audio {
        samples,
        sample_rate,
        channels: channels.max(1),
    })
}

/// Duration of an MP3 payload in seconds.
///
/// The probed stream metadata (Xing/LAME header) usually carries a frame
/// count; only headerless streams pay for a full decode.
#[cfg(feature = "mp3")]
pub(crate) fn mp3_duration(data: &[u8]) -> Result<f64, CodecError> {
    use symphonia::core::codecs::CODEC_TYPE_NULL;

    let reader = mp3_reader(data)?;
    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(CodecError::NoAudioTrack)?;
    if let (Some(n_frames), Some(rate)) =
        (track.codec_params.n_frames, track.codec_params.sample_rate)
    {
        if rate > 0 {
            return Ok(n_frames as f64 / rate as f64);
        }
    }

    tracing::debug!("MP3 stream carries no frame count; decoding for duration");
    let audio = decode_mp3(data)?;
    if audio.sample_rate == 0 {
        return Err(CodecError::UnknownDuration);
    }
    Ok(audio.samples.len() as f64 / audio.channels as f64 / audio.sample_rate as f64)
}

#[cfg(feature = "mp3")]
fn encode_mp3(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, CodecError> {
    use mp3lame_encoder::{Builder, FlushNoGap, MonoPcm};

    let mut builder = Builder::new()
        .ok_or_else(|| CodecError::Mp3Encode("failed to allocate LAME encoder".into()))?;
    builder
        .set_num_channels(1)
        .map_err(|e| CodecError::Mp3Encode(format!("channels: {e:?}")))?;
    builder
        .set_sample_rate(sample_rate)
        .map_err(|e| CodecError::Mp3Encode(format!("sample rate: {e:?}")))?;
    builder
        .set_brate(mp3lame_encoder::Bitrate::Kbps128)
        .map_err(|e| CodecError::Mp3Encode(format!("bitrate: {e:?}")))?;
    builder
        .set_quality(mp3lame_encoder::Quality::Good)
        .map_err(|e| CodecError::Mp3Encode(format!("quality: {e:?}")))?;
    let mut encoder = builder
        .build()
        .map_err(|e| CodecError::Mp3Encode(format!("{e:?}")))?;

    let mut out: Vec<u8> = Vec::new();
    out.reserve(mp3lame_encoder::max_required_buffer_size(samples.len()));
    let encoded = encoder
        .encode(MonoPcm(samples), out.spare_capacity_mut())
        .map_err(|e| CodecError::Mp3Encode(format!("{e:?}")))?;
    // SAFETY: `encode` initialized `encoded` bytes of the spare capacity.
    unsafe { out.set_len(out.len() + encoded) };
    let flushed = encoder
        .flush::<FlushNoGap>(out.spare_capacity_mut())
        .map_err(|e| CodecError::Mp3Encode(format!("{e:?}")))?;
    // SAFETY: `flush` initialized `flushed` bytes of the spare capacity.
    unsafe { out.set_len(out.len() + flushed) };
    Ok(out)
}
