//! Audio decoding and resampling to 16kHz mono f32.

use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::types::{AudioBuffer, TranscriptionError};

/// Target sample rate for the recognition model.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// What the client told us about the upload. Both fields are optional; the
/// probe falls back to sniffing the container.
#[derive(Debug, Clone, Default)]
pub struct MediaHint {
    /// `Content-Type` of the multipart field.
    pub mime_type: Option<String>,
    /// Original file name of the upload.
    pub file_name: Option<String>,
}

impl MediaHint {
    fn extension(&self) -> Option<String> {
        let from_name = self
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        if from_name.is_some() {
            return from_name;
        }
        let ext = match self.mime_type.as_deref()? {
            "audio/wav" | "audio/wave" | "audio/x-wav" => "wav",
            "audio/m4a" | "audio/mp4" | "audio/x-m4a" | "audio/aac" => "m4a",
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/flac" | "audio/x-flac" => "flac",
            "audio/ogg" => "ogg",
            _ => return None,
        };
        Some(ext.to_string())
    }
}

/// Decode audio bytes into 16kHz mono f32 samples.
///
/// Supports WAV, M4A/AAC, MP3, FLAC and Ogg Vorbis via symphonia.
/// Multi-channel input is averaged to mono, then resampled if needed.
pub fn decode_audio(data: &[u8], hint: &MediaHint) -> Result<AudioBuffer, TranscriptionError> {
    if data.is_empty() {
        return Err(TranscriptionError::AudioDecode("empty upload".into()));
    }

    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut probe_hint = Hint::new();
    if let Some(ext) = hint.extension() {
        let _ = probe_hint.with_extension(&ext);
    }
    if let Some(mime) = hint.mime_type.as_deref() {
        let _ = probe_hint.mime_type(mime);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &probe_hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| TranscriptionError::AudioDecode(format!("probe failed: {e}")))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| TranscriptionError::AudioDecode("no audio track found".into()))?;

    let codec_params = track.codec_params.clone();
    let track_id = track.id;
    let mut source_rate = codec_params.sample_rate.unwrap_or(TARGET_SAMPLE_RATE);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| TranscriptionError::AudioDecode(format!("codec init failed: {e}")))?;

    let mut all_samples: Vec<f32> = Vec::new();
    let mut channels = 1;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(TranscriptionError::AudioDecode(format!("packet read: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| TranscriptionError::AudioDecode(format!("decode: {e}")))?;

        let spec = *decoded.spec();
        source_rate = spec.rate;
        channels = spec.channels.count().max(1);
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        mix_to_mono(sample_buf.samples(), channels, &mut all_samples);
    }

    if all_samples.is_empty() {
        return Err(TranscriptionError::AudioDecode(
            "no audio samples decoded".into(),
        ));
    }

    debug!(
        source_rate,
        channels,
        frames = all_samples.len(),
        "decoded upload"
    );

    if source_rate != TARGET_SAMPLE_RATE {
        all_samples = resample(&all_samples, source_rate, TARGET_SAMPLE_RATE)?;
    }

    Ok(AudioBuffer {
        samples: all_samples,
        source_rate,
    })
}

/// Average interleaved frames of `channels` samples into `out`.
///
/// The channel count must come from the decoded buffer; containers may leave
/// it unset in their codec parameters.
pub fn mix_to_mono(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    #[allow(clippy::cast_precision_loss)]
    let scale = channels as f32;
    out.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / scale),
    );
}

/// Split a waveform into consecutive non-overlapping segments of at most
/// `chunk_secs` seconds. The last segment may be shorter.
pub fn split_chunks(samples: &[f32], chunk_secs: u32) -> impl Iterator<Item = &[f32]> {
    let len = (TARGET_SAMPLE_RATE as usize) * (chunk_secs.max(1) as usize);
    samples.chunks(len)
}

/// Resample mono audio from `from_rate` to `to_rate` using rubato.
#[allow(clippy::cast_possible_truncation)]
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

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1)
        .map_err(|e| TranscriptionError::Resample(format!("init: {e}")))?;

    let expected = (samples.len() as u64 * u64::from(to_rate)).div_ceil(u64::from(from_rate)) as usize;
    let mut output = Vec::with_capacity(expected + chunk_size);

    for chunk in samples.chunks(chunk_size) {
        let mut block = chunk.to_vec();
        // Zero-pad the tail block to the fixed input size
        block.resize(chunk_size, 0.0);
        let input = vec![block];

        let resampled = resampler
            .process(&input, None)
            .map_err(|e| TranscriptionError::Resample(format!("process: {e}")))?;

        if let Some(channel) = resampled.first() {
            output.extend_from_slice(channel);
        }
    }

    output.truncate(expected);
    Ok(output)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn wav_hint() -> MediaHint {
        MediaHint {
            mime_type: Some("audio/wav".into()),
            file_name: None,
        }
    }

    #[test]
    fn decode_invalid_audio_returns_error() {
        let err = decode_audio(b"not audio data", &wav_hint()).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn decode_empty_returns_error() {
        let err = decode_audio(b"", &wav_hint()).unwrap_err();
        assert!(err.to_string().contains("empty upload"));
    }

    #[test]
    fn mix_to_mono_averages_frames() {
        let mut out = Vec::new();
        mix_to_mono(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2, &mut out);
        assert_eq!(out, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn mix_to_mono_appends() {
        let mut out = vec![0.25];
        mix_to_mono(&[0.1, 0.2], 1, &mut out);
        mix_to_mono(&[0.3, 0.3, 0.3], 3, &mut out);
        assert_eq!(out.len(), 4);
        assert!((out[3] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn mix_to_mono_drops_partial_frame() {
        let mut out = Vec::new();
        mix_to_mono(&[1.0, 1.0, 1.0], 2, &mut out);
        assert_eq!(out, vec![1.0]);
    }

    #[test]
    fn hint_prefers_file_extension() {
        let hint = MediaHint {
            mime_type: Some("application/octet-stream".into()),
            file_name: Some("Recording.M4A".into()),
        };
        assert_eq!(hint.extension().as_deref(), Some("m4a"));
    }

    #[test]
    fn hint_falls_back_to_mime() {
        let hint = MediaHint {
            mime_type: Some("audio/mpeg".into()),
            file_name: Some("upload".into()),
        };
        assert_eq!(hint.extension().as_deref(), Some("mp3"));
        assert_eq!(MediaHint::default().extension(), None);
    }

    #[test]
    fn resample_identity() {
        let samples: Vec<f32> = (0..16000).map(|i| (i as f32 / 16000.0).sin()).collect();
        let result = resample(&samples, 16000, 16000).unwrap();
        assert_eq!(result.len(), samples.len());
    }

    #[test]
    fn resample_downsample() {
        // 48kHz → 16kHz should produce 1/3 the samples
        let samples: Vec<f32> = (0..48000).map(|i| (i as f32 / 48000.0).sin()).collect();
        let result = resample(&samples, 48000, 16000).unwrap();
        assert_eq!(result.len(), 16000);
    }

    #[test]
    fn decode_wav_synthetic() {
        let wav = generate_test_wav(16000, 1, 1600);
        let buf = decode_audio(&wav, &wav_hint()).unwrap();
        assert_eq!(buf.source_rate, 16000);
        assert_eq!(buf.samples.len(), 1600);
        assert!(buf.samples.iter().all(|&s| (-1.0..=1.0).contains(&s)));
    }

    #[test]
    fn decode_wav_without_hint() {
        let wav = generate_test_wav(16000, 1, 800);
        let buf = decode_audio(&wav, &MediaHint::default()).unwrap();
        assert_eq!(buf.samples.len(), 800);
    }

    #[test]
    fn decode_wav_44khz_stereo_resamples_to_16khz_mono() {
        let wav = generate_test_wav(44100, 2, 22050);
        let buf = decode_audio(&wav, &wav_hint()).unwrap();
        assert_eq!(buf.source_rate, 44100);
        // 0.5s at 16kHz = 8000 mono samples
        assert_eq!(buf.samples.len(), 8000);
        assert!((buf.duration_seconds() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn split_chunks_covers_every_sample() {
        let samples = vec![0.0f32; 16_000 * 65];
        let lens: Vec<usize> = split_chunks(&samples, 30).map(<[f32]>::len).collect();
        assert_eq!(lens, vec![480_000, 480_000, 80_000]);
    }

    #[test]
    fn split_chunks_short_audio_is_one_chunk() {
        let samples = vec![0.0f32; 100];
        assert_eq!(split_chunks(&samples, 30).count(), 1);
    }

    /// Generate a minimal valid 16-bit PCM WAV file of silence.
    pub(crate) fn generate_test_wav(sample_rate: u32, channels: u16, num_samples: u32) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let byte_rate = sample_rate * u32::from(channels) * u32::from(bits_per_sample) / 8;
        let block_align = channels * bits_per_sample / 8;
        let data_size = num_samples * u32::from(channels) * u32::from(bits_per_sample) / 8;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(file_size as usize + 8);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&sample_rate.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        buf.resize(buf.len() + data_size as usize, 0);
        buf
    }
}
