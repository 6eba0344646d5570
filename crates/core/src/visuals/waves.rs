use crate::{
    canvas::{Canvas, Point},
    color::{Palette, Rgba},
    plugin::{Surface, Visualizer},
    AudioFeatures, Result,
};

use super::FrameTimer;

const COLUMNS: usize = 96;

/// One row of the phase table: spatial frequency, drift speed and the
/// spectrum band that sets the amplitude.
#[derive(Debug, Clone, Copy)]
struct WaveLayer {
    frequency: f32,
    speed: f32,
    band: (f32, f32),
}

const LAYERS: [WaveLayer; 5] = [
    WaveLayer { frequency: 1.0, speed: 0.6, band: (0.0, 0.08) },
    WaveLayer { frequency: 1.7, speed: -0.9, band: (0.08, 0.2) },
    WaveLayer { frequency: 2.6, speed: 1.3, band: (0.2, 0.4) },
    WaveLayer { frequency: 3.8, speed: -1.8, band: (0.4, 0.7) },
    WaveLayer { frequency: 5.5, speed: 2.4, band: (0.7, 1.0) },
];

/// Stacked sine waves, one per spectrum band, drifting at their own speeds.
#[derive(Debug)]
pub struct WaveField {
    surface: Surface,
    timer: FrameTimer,
    phases: [f32; LAYERS.len()],
    amplitudes: [f32; LAYERS.len()],
    palette: Palette,
    points: Vec<Point>,
}

impl Default for WaveField {
    fn default() -> Self {
        Self {
            surface: Surface::default(),
            timer: FrameTimer::default(),
            phases: [0.0; LAYERS.len()],
            amplitudes: [0.0; LAYERS.len()],
            palette: Palette::ocean(),
            points: Vec::with_capacity(COLUMNS + 1),
        }
    }
}

impl WaveField {
    pub const ID: &'static str = "waves";
    pub const NAME: &'static str = "Wave Field";

    fn update(&mut self, features: &AudioFeatures) {
        let dt = self.timer.delta(features.time_seconds);
        let drive = 1.0 + features.bass.clamp(0.0, 1.0);

        for ((phase, amplitude), layer) in self
            .phases
            .iter_mut()
            .zip(self.amplitudes.iter_mut())
            .zip(&LAYERS)
        {
            *phase = (*phase + layer.speed * dt * drive).rem_euclid(std::f32::consts::TAU);
            // Quiet layers keep a small swell so the field never goes flat.
            let target = 0.1 + features.band_average(layer.band.0, layer.band.1).clamp(0.0, 1.0);
            *amplitude += (target - *amplitude) * 0.25;
        }
    }

    fn draw(&mut self, canvas: &mut dyn Canvas, width: f32, height: f32) {
        canvas.clear(Rgba::BLACK);

        let layers = LAYERS.len() as f32;
        for (index, ((layer, phase), amplitude)) in LAYERS
            .iter()
            .zip(&self.phases)
            .zip(&self.amplitudes)
            .enumerate()
        {
            let depth = (index as f32 + 1.0) / (layers + 1.0);
            let baseline = height * depth;
            let swing = height / (layers + 1.0) * amplitude;

            self.points.clear();
            self.points.extend((0..=COLUMNS).map(|column| {
                let t = column as f32 / COLUMNS as f32;
                let angle = t * layer.frequency * std::f32::consts::TAU + phase;
                Point::new(t * width, baseline + swing * angle.sin())
            }));

            let color = self.palette.sample(depth).with_alpha(0.4 + 0.6 * amplitude.min(1.0));
            canvas.set_line_width(1.0 + 3.0 * amplitude);
            canvas.draw_lines(&self.points, color, false);
        }
    }
}

impl Visualizer for WaveField {
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
    use crate::record::{DrawCommand, RecordingCanvas};

    #[test]
    fn one_polyline_per_layer() {
        let mut plugin = WaveField::default();
        plugin.initialize(300, 200).unwrap();
        let mut canvas = RecordingCanvas::new(300.0, 200.0);
        plugin
            .render_frame(&AudioFeatures::silent(), &mut canvas)
            .unwrap();

        let lines = canvas
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Lines { .. }))
            .count();
        assert_eq!(lines, LAYERS.len());
    }

    #[test]
    fn loud_bands_raise_amplitude() {
        let mut plugin = WaveField::default();
        plugin.initialize(300, 200).unwrap();
        let mut canvas = RecordingCanvas::new(300.0, 200.0);
        let mut spectrum = vec![0.0; 100];
        spectrum[..10].iter_mut().for_each(|v| *v = 1.0);
        let features = AudioFeatures {
            spectrum,
            ..AudioFeatures::silent()
        };
        for _ in 0..30 {
            plugin.render_frame(&features, &mut canvas).unwrap();
        }
        assert!(plugin.amplitudes[0] > 1.0);
        assert!(plugin.amplitudes[4] < 0.2);
    }

    #[test]
    fn bass_speeds_up_drift() {
        let mut calm = WaveField::default();
        let mut driven = WaveField::default();
        calm.update(&AudioFeatures::silent());
        driven.update(&AudioFeatures {
            bass: 1.0,
            ..AudioFeatures::silent()
        });
        assert!((driven.phases[0] - 2.0 * calm.phases[0]).abs() < 1e-6);
    }
}
