use std::f32::consts::{PI, TAU};

use crate::{
    canvas::{Canvas, Point, Rect},
    color::{hsv_to_rgb, Rgba},
    features::sample_linear,
    plugin::{Surface, Visualizer},
    AudioFeatures, Result,
};

const POINTS: usize = 512;
/// Frequency ratios cycled on each beat.
const RATIOS: [(f32, f32); 4] = [(1.0, 2.0), (3.0, 2.0), (3.0, 4.0), (5.0, 4.0)];
const FALLBACK_BPM: f32 = 120.0;
const JITTER: f32 = 0.04;

/// Lissajous figure whose phase completes one turn per bar of four beats.
#[derive(Debug)]
pub struct LissajousScope {
    surface: Surface,
    ratio: usize,
    phase: f32,
    hue: f32,
    points: Vec<Point>,
}

impl Default for LissajousScope {
    fn default() -> Self {
        Self {
            surface: Surface::default(),
            ratio: 0,
            phase: 0.0,
            hue: 180.0,
            points: Vec::with_capacity(POINTS),
        }
    }
}

impl LissajousScope {
    pub const ID: &'static str = "lissajous";
    pub const NAME: &'static str = "Lissajous Scope";

    /// Current `(a, b)` frequency ratio.
    pub fn ratio(&self) -> (f32, f32) {
        RATIOS[self.ratio]
    }

    /// Phase in radians for `time` at `bpm`; one full turn every four beats.
    pub fn phase_at(time_seconds: f64, bpm: f32) -> f32 {
        let bpm = if bpm.is_finite() && bpm > 0.0 {
            bpm
        } else {
            FALLBACK_BPM
        };
        let bars = time_seconds * f64::from(bpm) / 60.0 / 4.0;
        (bars.fract() as f32) * TAU
    }

    fn update(&mut self, features: &AudioFeatures) {
        if features.beat {
            self.ratio = (self.ratio + 1) % RATIOS.len();
        }
        self.phase = Self::phase_at(features.time_seconds, features.bpm);
        self.hue = (self.hue + 0.5 + 4.0 * features.treble.clamp(0.0, 1.0)).rem_euclid(360.0);
    }

    fn draw(&mut self, features: &AudioFeatures, canvas: &mut dyn Canvas, width: f32, height: f32) {
        canvas.fill_rect(Rect::full(width, height), Rgba::BLACK.with_alpha(0.15));

        let (a, b) = self.ratio();
        let center = Point::new(width * 0.5, height * 0.5);
        let radius = width.min(height) * (0.3 + 0.15 * features.volume.clamp(0.0, 1.0));

        self.points.clear();
        self.points.extend((0..POINTS).map(|i| {
            let t = i as f32 / POINTS as f32;
            let jitter = 1.0 + JITTER * sample_linear(&features.waveform, t);
            let angle = t * TAU;
            Point::new(
                center.x + radius * jitter * (a * angle + self.phase + PI * 0.5).sin(),
                center.y + radius * jitter * (b * angle).sin(),
            )
        }));

        canvas.set_line_width(1.5 + 2.0 * features.bass.clamp(0.0, 1.0));
        canvas.draw_lines(&self.points, hsv_to_rgb(self.hue, 0.8, 1.0), true);
    }
}

impl Visualizer for LissajousScope {
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
        self.draw(features, canvas, width, height);
        Ok(())
    }

    fn dispose(&mut self) {
        *self = Self::default();
    }
}
