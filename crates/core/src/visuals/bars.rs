use crate::{
    canvas::{Canvas, Rect},
    color::{hsv_to_rgb, Rgba},
    features::{band_average, SpectrumWatchdog},
    plugin::{Surface, Visualizer},
    AudioFeatures, Result,
};

const BARS: usize = 64;
/// Frames of unchanged spectrum before the fallback animation kicks in.
const STALE_FRAMES: usize = 90;
const RISE: f32 = 0.6;
const FALL: f32 = 0.08;
const PEAK_HOLD_FRAMES: u32 = 20;
const PEAK_FALL: f32 = 0.01;
/// Bands are spaced on a power curve so low frequencies get more bars.
const BAND_CURVE: f32 = 1.6;

#[derive(Debug, Clone, Copy, Default)]
struct Peak {
    level: f32,
    hold: u32,
}

/// Spectrum bars with peak-hold caps.
///
/// Falls back to a synthetic spectrum when the input stops moving, which
/// keeps the display alive while the host's analysis is stalled.
#[derive(Debug)]
pub struct BarsVisualizer {
    surface: Surface,
    watchdog: SpectrumWatchdog,
    targets: Vec<f32>,
    levels: Vec<f32>,
    peaks: Vec<Peak>,
}

impl Default for BarsVisualizer {
    fn default() -> Self {
        Self {
            surface: Surface::default(),
            watchdog: SpectrumWatchdog::new(STALE_FRAMES),
            targets: Vec::with_capacity(BARS),
            levels: vec![0.0; BARS],
            peaks: vec![Peak::default(); BARS],
        }
    }
}

impl BarsVisualizer {
    pub const ID: &'static str = "bars";
    pub const NAME: &'static str = "Spectrum Bars";

    /// Whether the last frame was drawn from fallback data.
    pub fn using_fallback(&self) -> bool {
        self.watchdog.is_stale()
    }

    fn update(&mut self, features: &AudioFeatures) {
        let spectrum = self.watchdog.observe(&features.spectrum, features.time_seconds);
        self.targets.clear();
        self.targets.extend((0..BARS).map(|bar| {
            let low = (bar as f32 / BARS as f32).powf(BAND_CURVE);
            let high = ((bar + 1) as f32 / BARS as f32).powf(BAND_CURVE);
            band_average(spectrum, low, high).clamp(0.0, 1.0)
        }));

        for ((level, peak), target) in self
            .levels
            .iter_mut()
            .zip(self.peaks.iter_mut())
            .zip(&self.targets)
        {
            if *target > *level {
                *level += (*target - *level) * RISE;
            } else {
                *level = (*level - FALL).max(*target);
            }

            if *level >= peak.level {
                peak.level = *level;
                peak.hold = PEAK_HOLD_FRAMES;
            } else if peak.hold > 0 {
                peak.hold -= 1;
            } else {
                peak.level = (peak.level - PEAK_FALL).max(*level);
            }
        }
    }

    fn draw(&self, canvas: &mut dyn Canvas, width: f32, height: f32) {
        canvas.clear(Rgba::BLACK);

        let slot = width / BARS as f32;
        let bar_width = (slot * 0.8).max(1.0);
        let cap = (height * 0.01).max(1.0);

        for (bar, (level, peak)) in self.levels.iter().zip(&self.peaks).enumerate() {
            let x = bar as f32 * slot;
            let bar_height = level * height * 0.9;
            let color = hsv_to_rgb(240.0 - 240.0 * level, 0.9, 0.4 + 0.6 * level);
            canvas.fill_rect(Rect::new(x, height - bar_height, bar_width, bar_height), color);

            let peak_y = height - peak.level * height * 0.9 - cap;
            canvas.fill_rect(Rect::new(x, peak_y, bar_width, cap), Rgba::WHITE.with_alpha(0.8));
        }
    }
}

impl Visualizer for BarsVisualizer {
    fn id(&self) -> &str {
        Self::ID
    }

    fn display_name(&self) -> &str {
        Self::NAME
    }

    fn initialize(&mut self, width: u32, height: u32) -> Result<()> {
        self.surface.initialize(Self::ID, width, height)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.surface.resize(Self::ID, width, height)
    }

    fn render_frame(&mut self, features: &AudioFeatures, canvas: &mut dyn Canvas) -> Result<()> {
        let (width, height) = self.surface.dimensions(Self::ID)?;
        self.update(features);
        self.draw(canvas, width, height);
        Ok(())
    }

    fn dispose(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordingCanvas;

    fn render(plugin: &mut BarsVisualizer, features: &AudioFeatures) {
        let mut canvas = RecordingCanvas::new(320.0, 200.0);
        plugin.render_frame(features, &mut canvas).unwrap();
    }

    #[test]
    fn bars_rise_towards_spectrum() {
        let mut plugin = BarsVisualizer::default();
        plugin.initialize(320, 200).unwrap();
        let features = AudioFeatures {
            spectrum: vec![1.0; 128],
            ..AudioFeatures::silent()
        };
        for _ in 0..10 {
            render(&mut plugin, &features);
        }
        assert!(plugin.levels.iter().all(|level| *level > 0.95));
    }

    #[test]
    fn peaks_hold_then_fall() {
        let mut plugin = BarsVisualizer::default();
        plugin.initialize(320, 200).unwrap();
        let loud = AudioFeatures {
            spectrum: vec![1.0; 128],
            ..AudioFeatures::silent()
        };
        for _ in 0..10 {
            render(&mut plugin, &loud);
        }
        let held = plugin.peaks[0].level;

        let quiet = AudioFeatures {
            spectrum: vec![0.05; 128],
            ..AudioFeatures::silent()
        };
        render(&mut plugin, &quiet);
        assert_eq!(plugin.peaks[0].level, held);
        for _ in 0..(PEAK_HOLD_FRAMES + 10) {
            render(&mut plugin, &quiet);
        }
        assert!(plugin.peaks[0].level < held);
        assert!(plugin.peaks[0].level >= plugin.levels[0]);
    }

    #[test]
    fn stuck_spectrum_switches_to_fallback() {
        let mut plugin = BarsVisualizer::default();
        plugin.initialize(320, 200).unwrap();
        for _ in 0..=STALE_FRAMES {
            render(&mut plugin, &AudioFeatures::silent());
        }
        assert!(plugin.using_fallback());
        assert!(plugin.levels.iter().any(|level| *level > 0.0));
    }
}
