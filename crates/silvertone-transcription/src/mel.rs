//! Whisper log-mel front end.
//!
//! Every segment is padded or trimmed to 30 s, framed with a 25 ms periodic
//! Hann window at a 10 ms hop, projected onto 80 Slaney-normalised mel bands
//! and compressed to the `[-1, 1]`-ish range the encoder was trained on.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use std::f32::consts::PI;
use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

use crate::audio::TARGET_SAMPLE_RATE;
use crate::types::TranscriptionError;

/// FFT size (25 ms at 16 kHz).
pub const N_FFT: usize = 400;
/// Hop between frames (10 ms).
pub const HOP_LENGTH: usize = 160;
/// Mel bands expected by `whisper-large-v2`.
pub const N_MELS: usize = 80;
/// Samples in one encoder window.
pub const N_SAMPLES: usize = 30 * TARGET_SAMPLE_RATE as usize;
/// Frames in one encoder window.
pub const N_FRAMES: usize = N_SAMPLES / HOP_LENGTH;

const N_BINS: usize = N_FFT / 2 + 1;

/// Log-mel extractor with a planned FFT and precomputed filterbank.
pub struct LogMelExtractor {
    fft: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    filters: Vec<Vec<f32>>,
}

impl LogMelExtractor {
    /// Plan the FFT and build the filterbank.
    pub fn new() -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(N_FFT);
        let window = (0..N_FFT)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / N_FFT as f32).cos()))
            .collect();
        let filters = slaney_filterbank(N_MELS, TARGET_SAMPLE_RATE as f32);
        Self {
            fft,
            window,
            filters,
        }
    }

    /// Compute features for one segment of at most 30 s.
    ///
    /// Returns `N_MELS * N_FRAMES` values in row-major `[mel, frame]` order,
    /// ready to be shaped as `[1, 80, 3000]`.
    pub fn compute(&self, samples: &[f32]) -> Result<Vec<f32>, TranscriptionError> {
        let mut audio = samples[..samples.len().min(N_SAMPLES)].to_vec();
        audio.resize(N_SAMPLES, 0.0);
        let padded = reflect_pad(&audio, N_FFT / 2);

        let mut input = self.fft.make_input_vec();
        let mut spectrum: Vec<Complex<f32>> = self.fft.make_output_vec();
        let mut power = vec![0.0f32; N_BINS];
        let mut mel = vec![0.0f32; N_MELS * N_FRAMES];

        // The centred STFT yields N_FRAMES + 1 frames; the last one is dropped
        for frame in 0..N_FRAMES {
            let start = frame * HOP_LENGTH;
            for ((dst, &src), &w) in input
                .iter_mut()
                .zip(&padded[start..start + N_FFT])
                .zip(&self.window)
            {
                *dst = src * w;
            }

            self.fft
                .process(&mut input, &mut spectrum)
                .map_err(|e| TranscriptionError::Inference(format!("fft: {e}")))?;

            for (p, c) in power.iter_mut().zip(&spectrum) {
                *p = c.norm_sqr();
            }

            for (band, filter) in self.filters.iter().enumerate() {
                let energy: f32 = filter.iter().zip(&power).map(|(f, p)| f * p).sum();
                mel[band * N_FRAMES + frame] = energy.max(1e-10).log10();
            }
        }

        let peak = mel.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let floor = peak - 8.0;
        for v in &mut mel {
            *v = (v.max(floor) + 4.0) / 4.0;
        }
        Ok(mel)
    }
}

impl Default for LogMelExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Mirror `pad` samples at each edge, excluding the edge sample itself.
fn reflect_pad(samples: &[f32], pad: usize) -> Vec<f32> {
    let n = samples.len();
    let mut out = Vec::with_capacity(n + 2 * pad);
    out.extend((1..=pad).rev().map(|i| samples[i.min(n - 1)]));
    out.extend_from_slice(samples);
    out.extend((1..=pad).map(|i| samples[n.saturating_sub(1 + i)]));
    out
}

// Slaney mel scale: linear below 1 kHz, logarithmic above.
const F_SP: f32 = 200.0 / 3.0;
const MIN_LOG_HZ: f32 = 1000.0;
const MIN_LOG_MEL: f32 = MIN_LOG_HZ / F_SP;

fn log_step() -> f32 {
    6.4f32.ln() / 27.0
}

fn hz_to_mel(hz: f32) -> f32 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

fn mel_to_hz(mel: f32) -> f32 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        mel * F_SP
    }
}

/// Triangular filters over `[0, sr/2]` with area normalisation.
fn slaney_filterbank(n_mels: usize, sample_rate: f32) -> Vec<Vec<f32>> {
    let nyquist = sample_rate / 2.0;
    let mel_max = hz_to_mel(nyquist);
    let mel_f: Vec<f32> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_max * i as f32 / (n_mels + 1) as f32))
        .collect();
    let fft_freqs: Vec<f32> = (0..N_BINS)
        .map(|i| nyquist * i as f32 / (N_BINS - 1) as f32)
        .collect();

    (0..n_mels)
        .map(|m| {
            let (left, center, right) = (mel_f[m], mel_f[m + 1], mel_f[m + 2]);
            let enorm = 2.0 / (right - left);
            fft_freqs
                .iter()
                .map(|&f| {
                    let lower = (f - left) / (center - left);
                    let upper = (right - f) / (right - center);
                    lower.min(upper).max(0.0) * enorm
                })
                .collect()
        })
        .collect()
}
