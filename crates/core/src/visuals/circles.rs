use crate::{
    canvas::{Canvas, Point},
    color::{hsv_to_rgb, Rgba},
    plugin::{Surface, Visualizer},
    AudioFeatures, Result,
};

use super::FrameTimer;

const RINGS: usize = 8;
const RING_DECAY: f32 = 0.85;
const PULSE_DECAY_PER_SECOND: f32 = 4.0;

/// Concentric rings, one per spectrum band, that pulse on beats.
#[derive(Debug, Default)]
pub struct PulseCircles {
    surface: Surface,
    timer: FrameTimer,
    levels: [f32; RINGS],
    pulse: f32,
}

impl PulseCircles {
    pub const ID: &'static str = "circles";
    pub const NAME: &'static str = "Pulse Circles";

    fn update(&mut self, features: &AudioFeatures) {
        let dt = self.timer.delta(features.time_seconds);

        for (ring, level) in self.levels.iter_mut().enumerate() {
            let target = if features.spectrum.is_empty() {
                features.volume
            } else {
                features.band_average(ring as f32 / RINGS as f32, (ring + 1) as f32 / RINGS as f32)
            };
            *level = target.clamp(0.0, 1.0).max(*level * RING_DECAY);
        }

        if features.beat {
            self.pulse = 1.0;
        } else {
            self.pulse = (self.pulse - PULSE_DECAY_PER_SECOND * dt).max(0.0);
        }
    }

    fn draw(&self, features: &AudioFeatures, canvas: &mut dyn Canvas, width: f32, height: f32) {
        canvas.clear(Rgba::rgb(0.02, 0.02, 0.05));

        let center = Point::new(width * 0.5, height * 0.5);
        let max_radius = width.min(height) * 0.45;
        let time = features.time_seconds as f32;

        for (ring, level) in self.levels.iter().enumerate() {
            let base = (ring + 1) as f32 / RINGS as f32;
            let radius = max_radius * base * (0.6 + 0.4 * level) * (1.0 + 0.1 * self.pulse);
            let color = hsv_to_rgb(ring as f32 * 45.0 + time * 30.0, 0.8, 0.5 + 0.5 * level);
            canvas.set_line_width(1.0 + 3.0 * level);
            canvas.draw_circle(center, radius, color);
        }

        let core = max_radius * 0.05 * (1.0 + self.pulse);
        canvas.fill_circle(center, core, Rgba::WHITE.with_alpha(0.4 + 0.6 * self.pulse));

        if features.bpm > 0.0 {
            canvas.draw_text(
                &format!("{:.0} BPM", features.bpm),
                Point::new(8.0, 8.0),
                14.0,
                Rgba::WHITE.with_alpha(0.7),
            );
        }
    }
}

impl Visualizer for PulseCircles {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DrawCommand, RecordingCanvas};

    #[test]
    fn draws_one_ring_per_band() {
        let mut plugin = PulseCircles::default();
        plugin.initialize(200, 200).unwrap();
        let mut canvas = RecordingCanvas::new(200.0, 200.0);
        plugin
            .render_frame(&AudioFeatures::silent(), &mut canvas)
            .unwrap();
        let rings = canvas
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { .. }))
            .count();
        assert_eq!(rings, RINGS);
    }

    #[test]
    fn beat_pulse_decays() {
        let mut plugin = PulseCircles::default();
        plugin.initialize(100, 100).unwrap();
        let mut canvas = RecordingCanvas::new(100.0, 100.0);

        let beat = AudioFeatures {
            beat: true,
            ..AudioFeatures::silent()
        };
        plugin.render_frame(&beat, &mut canvas).unwrap();
        assert_eq!(plugin.pulse, 1.0);

        for frame in 1..30 {
            let quiet = AudioFeatures {
                time_seconds: frame as f64 / 60.0,
                ..AudioFeatures::silent()
            };
            plugin.render_frame(&quiet, &mut canvas).unwrap();
        }
        assert_eq!(plugin.pulse, 0.0);
    }

    #[test]
    fn labels_tempo_when_known() {
        let mut plugin = PulseCircles::default();
        plugin.initialize(100, 100).unwrap();
        let mut canvas = RecordingCanvas::new(100.0, 100.0);
        let features = AudioFeatures {
            bpm: 128.0,
            ..AudioFeatures::silent()
        };
        plugin.render_frame(&features, &mut canvas).unwrap();
        assert!(canvas
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::Text { text, .. } if text == "128 BPM")));
    }
}
