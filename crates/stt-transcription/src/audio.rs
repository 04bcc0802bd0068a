//! Audio decoding and resampling to 16kHz mono f32.
//!
//! The model expects 16kHz mono input. Files in that format pass straight
//! through; anything symphonia can decode is mixed down and resampled.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::types::{ResultExt, TranscriptionError};

/// Sample rate the model was trained on.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Decoded mono samples at [`TARGET_SAMPLE_RATE`].
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Mono f32 samples in `[-1, 1]`.
    pub samples: Vec<f32>,
    /// Sample rate of the source before resampling.
    pub source_rate: u32,
    /// Channel count of the source before mixing.
    pub source_channels: usize,
}

impl DecodedAudio {
    /// Length in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / f64::from(TARGET_SAMPLE_RATE)
    }
}

/// Decode an audio file from disk.
///
/// The file extension, when present, is passed to the format probe as a hint.
pub fn decode_file(path: &Path) -> Result<DecodedAudio, TranscriptionError> {
    let file = File::open(path)?;
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        let _ = hint.with_extension(ext);
    }
    debug!(path = %path.display(), "decoding audio file");

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .audio_decode("probe failed")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| TranscriptionError::AudioDecode("no audio track found".into()))?;

    let codec_params = track.codec_params.clone();
    let track_id = track.id;
    let source_rate = codec_params.sample_rate.unwrap_or(TARGET_SAMPLE_RATE);
    let channels = codec_params.channels.map_or(1, |c| c.count()).max(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .audio_decode("codec init failed")?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(TranscriptionError::AudioDecode(format!("packet read: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("skipping corrupt packet: {e}");
                continue;
            }
            Err(e) => return Err(TranscriptionError::AudioDecode(format!("decode: {e}"))),
        };

        let spec = *decoded.spec();
        let n_frames = decoded.capacity();
        let mut sample_buf = SampleBuffer::<f32>::new(n_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        mix_to_mono(sample_buf.samples(), channels, &mut samples);
    }

    if samples.is_empty() {
        return Err(TranscriptionError::AudioDecode(
            "no audio samples decoded".into(),
        ));
    }

    if source_rate != TARGET_SAMPLE_RATE {
        debug!(source_rate, "resampling to {TARGET_SAMPLE_RATE}Hz");
        samples = resample(&samples, source_rate, TARGET_SAMPLE_RATE)?;
    }

    Ok(DecodedAudio {
        samples,
        source_rate,
        source_channels: channels,
    })
}

/// Average interleaved frames into `out`.
#[allow(clippy::cast_precision_loss)]
fn mix_to_mono(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.extend(
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}

/// Resample mono audio from `from_rate` to `to_rate` using rubato.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, TranscriptionError> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let chunk_size = 1024;
    let expected_len = (samples.len() as f64 * ratio).round() as usize;

    let mut resampler =
        SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1).resample("init")?;

    // The sinc filter delays its output; that many leading samples are dropped.
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(delay + expected_len + chunk_size);

    let mut chunks = samples.chunks(chunk_size);
    while output.len() < delay + expected_len {
        // Past the end of the input, zero chunks flush the filter tail.
        let mut input = chunks.next().map(<[f32]>::to_vec).unwrap_or_default();
        input.resize(chunk_size, 0.0);

        let resampled = resampler.process(&[input], None).resample("process")?;
        match resampled.first() {
            Some(channel) if !channel.is_empty() => output.extend_from_slice(channel),
            _ => break,
        }
    }

    let _ = output.drain(..delay.min(output.len()));
    output.truncate(expected_len);
    Ok(output)
}
