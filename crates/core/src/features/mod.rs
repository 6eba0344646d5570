//! Per-frame audio feature snapshots and helpers around them.
//!
//! The analysis that fills [`AudioFeatures`] lives in the host. This module
//! only defines the snapshot, a deterministic [`FeatureSynth`] used to drive
//! plugins without an audio stack, and the [`SpectrumWatchdog`] fallback for
//! spectra that stop updating.

use std::f32::consts::TAU;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{config::SynthConfig, timeline::FrameClock};

/// Representation of the audio analysis for a single rendered frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub time_seconds: f64,
    /// Normalised magnitudes, low frequencies first.
    pub spectrum: Vec<f32>,
    /// Time-domain samples in `[-1, 1]`.
    pub waveform: Vec<f32>,
    pub energy: f32,
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub volume: f32,
    pub rms: f32,
    pub beat: bool,
    pub bpm: f32,
}

impl AudioFeatures {
    /// Zero-filled snapshot with empty buffers.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Spectrum value at `index`, or 0.0 when out of range.
    pub fn spectrum_at(&self, index: usize) -> f32 {
        self.spectrum.get(index).copied().unwrap_or(0.0)
    }

    /// Waveform sample at `index`, or 0.0 when out of range.
    pub fn waveform_at(&self, index: usize) -> f32 {
        self.waveform.get(index).copied().unwrap_or(0.0)
    }

    /// Mean of the spectrum slice between the normalised positions `low` and
    /// `high` (both in `[0, 1]`). Empty spectra and empty slices yield 0.0.
    pub fn band_average(&self, low: f32, high: f32) -> f32 {
        band_average(&self.spectrum, low, high)
    }
}

/// Mean of `spectrum` between the normalised positions `low` and `high`.
pub fn band_average(spectrum: &[f32], low: f32, high: f32) -> f32 {
    if spectrum.is_empty() {
        return 0.0;
    }

    let len = spectrum.len();
    let start = ((low.clamp(0.0, 1.0) * len as f32) as usize).min(len - 1);
    let end = ((high.clamp(0.0, 1.0) * len as f32).ceil() as usize).clamp(start + 1, len);
    let slice = &spectrum[start..end];
    slice.iter().sum::<f32>() / slice.len() as f32
}

/// Samples `values` at the normalised position `t` with linear interpolation.
pub fn sample_linear(values: &[f32], t: f32) -> f32 {
    match values.len() {
        0 => 0.0,
        1 => values[0],
        len => {
            let scaled = t.clamp(0.0, 1.0) * (len - 1) as f32;
            let index = (scaled.floor() as usize).min(len - 2);
            let frac = scaled - index as f32;
            values[index] + (values[index + 1] - values[index]) * frac
        }
    }
}

const WAVEFORM_SAMPLE_RATE: f32 = 44_100.0;

/// Deterministic generator of plausible feature frames at a fixed tempo.
///
/// This is procedural test data, not analysis: bass follows a kick envelope
/// that restarts on each beat, mids drift slowly and treble carries seeded
/// noise with off-beat hats.
#[derive(Debug)]
pub struct FeatureSynth {
    config: SynthConfig,
    clock: FrameClock,
    rng: StdRng,
    last_beat_index: Option<u64>,
}

impl FeatureSynth {
    pub fn new(config: SynthConfig, fps: u32) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            clock: FrameClock::new(fps),
            rng,
            last_beat_index: None,
        }
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Produces the features for the current frame and advances the clock.
    pub fn next_frame(&mut self) -> AudioFeatures {
        let time = self.clock.time_seconds();
        let bpm = self.config.bpm.max(1.0);
        let period = 60.0 / bpm as f64;
        let beat_position = time / period;
        let beat_index = beat_position.floor() as u64;
        let phase = beat_position.fract() as f32;

        let beat = self.last_beat_index != Some(beat_index);
        self.last_beat_index = Some(beat_index);

        let t = time as f32;
        let kick = (-phase * 8.0).exp();
        let off_beat = (-((phase - 0.5).abs()) * 30.0).exp();
        let bass = (0.15 + 0.85 * kick).clamp(0.0, 1.0);
        let mid = (0.35 + 0.2 * (t * 1.7).sin() + 0.1 * (t * 0.31).cos()).clamp(0.0, 1.0);
        let noise: f32 = self.rng.gen_range(0.0..1.0);
        let treble = (0.15 + 0.1 * noise + 0.5 * off_beat).clamp(0.0, 1.0);

        let bins = self.config.spectrum_bins;
        let spectrum: Vec<f32> = (0..bins)
            .map(|i| {
                let f = i as f32 / bins.max(1) as f32;
                let low = bass * (-f * 10.0).exp();
                let middle = mid * (-((f - 0.35) / 0.15).powi(2)).exp();
                let high = treble * (-((f - 0.75) / 0.2).powi(2)).exp();
                let jitter = self.rng.gen_range(0.0..0.04);
                (low + middle + high + jitter).clamp(0.0, 1.0)
            })
            .collect();

        let samples = self.config.waveform_samples;
        let waveform: Vec<f32> = (0..samples)
            .map(|j| {
                let ts = t + j as f32 / WAVEFORM_SAMPLE_RATE;
                let value = bass * (TAU * 55.0 * ts).sin()
                    + 0.5 * mid * (TAU * 440.0 * ts).sin()
                    + 0.2 * treble * self.rng.gen_range(-1.0..1.0);
                value.clamp(-1.0, 1.0)
            })
            .collect();

        let energy = if spectrum.is_empty() {
            0.0
        } else {
            spectrum.iter().sum::<f32>() / spectrum.len() as f32
        };
        let rms = if waveform.is_empty() {
            0.0
        } else {
            (waveform.iter().map(|s| s * s).sum::<f32>() / waveform.len() as f32).sqrt()
        };

        self.clock.tick();

        AudioFeatures {
            time_seconds: time,
            spectrum,
            waveform,
            energy,
            bass,
            mid,
            treble,
            volume: (bass + mid + treble) / 3.0,
            rms,
            beat,
            bpm,
        }
    }
}

const STUCK_EPSILON: f32 = 1e-6;
const DEFAULT_FALLBACK_BINS: usize = 64;

/// Detects spectra that stopped updating and substitutes animated data.
#[derive(Debug, Clone)]
pub struct SpectrumWatchdog {
    stale_frames: usize,
    unchanged: usize,
    last: Vec<f32>,
    fallback: Vec<f32>,
    stale: bool,
}

impl SpectrumWatchdog {
    /// `stale_frames` consecutive stuck frames switch to fallback data.
    pub fn new(stale_frames: usize) -> Self {
        Self {
            stale_frames: stale_frames.max(1),
            unchanged: 0,
            last: Vec::new(),
            fallback: Vec::new(),
            stale: false,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn reset(&mut self) {
        self.unchanged = 0;
        self.last.clear();
        self.stale = false;
    }

    /// Inspects this frame's spectrum and returns the data to render from:
    /// the input itself, or a synthetic spectrum while the input is stuck.
    pub fn observe<'a>(&'a mut self, spectrum: &'a [f32], time_seconds: f64) -> &'a [f32] {
        let silent = spectrum.iter().all(|v| v.abs() <= STUCK_EPSILON);
        let repeated = !spectrum.is_empty()
            && spectrum.len() == self.last.len()
            && spectrum
                .iter()
                .zip(&self.last)
                .all(|(a, b)| (a - b).abs() <= STUCK_EPSILON);

        if silent || repeated {
            self.unchanged = self.unchanged.saturating_add(1);
        } else {
            self.unchanged = 0;
        }
        self.last.clear();
        self.last.extend_from_slice(spectrum);

        let stale = self.unchanged >= self.stale_frames;
        if stale != self.stale {
            tracing::debug!(stale, frames = self.unchanged, "spectrum watchdog changed state");
            self.stale = stale;
        }

        if !stale {
            return spectrum;
        }

        let bins = if spectrum.is_empty() {
            DEFAULT_FALLBACK_BINS
        } else {
            spectrum.len()
        };
        let t = time_seconds as f32;
        self.fallback.clear();
        self.fallback.extend((0..bins).map(|i| {
            let f = i as f32 / bins as f32;
            let wave = 0.5 + 0.5 * (t * 2.0 + f * 9.0).sin();
            (wave * (1.0 - f * 0.7) * 0.6).clamp(0.0, 1.0)
        }));
        &self.fallback
    }
}
