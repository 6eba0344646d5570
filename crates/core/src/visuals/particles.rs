use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    canvas::{Canvas, Point, Rect},
    color::{Palette, Rgba},
    plugin::{Surface, Visualizer},
    AudioFeatures, Result,
};

use super::FrameTimer;

/// Upper bound on live particles.
pub const MAX_PARTICLES: usize = 512;
const BEAT_BURST: usize = 40;
const GRAVITY: f32 = 420.0;
const LIFETIME: f32 = 2.5;

#[derive(Debug, Clone)]
struct Spark {
    position: Point,
    velocity: Point,
    age: f32,
}

/// Bass-driven particle fountain rising from the bottom edge.
#[derive(Debug)]
pub struct ParticleFountain {
    surface: Surface,
    timer: FrameTimer,
    rng: StdRng,
    sparks: Vec<Spark>,
    palette: Palette,
}

impl Default for ParticleFountain {
    fn default() -> Self {
        Self {
            surface: Surface::default(),
            timer: FrameTimer::default(),
            rng: StdRng::seed_from_u64(0xf0_f0),
            sparks: Vec::with_capacity(MAX_PARTICLES),
            palette: Palette::ember(),
        }
    }
}

impl ParticleFountain {
    pub const ID: &'static str = "particles";
    pub const NAME: &'static str = "Particle Fountain";

    /// Number of live particles.
    pub fn len(&self) -> usize {
        self.sparks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sparks.is_empty()
    }

    fn update(&mut self, features: &AudioFeatures, width: f32, height: f32) {
        let dt = self.timer.delta(features.time_seconds);

        for spark in &mut self.sparks {
            spark.velocity.y += GRAVITY * dt;
            spark.position.x += spark.velocity.x * dt;
            spark.position.y += spark.velocity.y * dt;
            spark.age += dt;
        }
        self.sparks
            .retain(|s| s.age < LIFETIME && s.position.y <= height + 8.0);

        let mut wanted = (features.bass.clamp(0.0, 1.0) * 8.0).round() as usize;
        if features.beat {
            wanted += BEAT_BURST;
        }
        let wanted = wanted.min(MAX_PARTICLES - self.sparks.len());

        let spread = 60.0 + 240.0 * features.treble.clamp(0.0, 1.0);
        let lift = height * (0.9 + 0.8 * features.bass.clamp(0.0, 1.0));
        let origin = Point::new(width * 0.5, height);
        for _ in 0..wanted {
            let velocity = Point::new(
                self.rng.gen_range(-1.0..1.0) * spread,
                -lift * self.rng.gen_range(0.6..1.0),
            );
            self.sparks.push(Spark {
                position: origin,
                velocity,
                age: 0.0,
            });
        }
    }

    fn draw(&self, canvas: &mut dyn Canvas, width: f32, height: f32) {
        canvas.fill_rect(Rect::full(width, height), Rgba::BLACK.with_alpha(0.25));
        for spark in &self.sparks {
            let life = 1.0 - spark.age / LIFETIME;
            let color = self.palette.sample(life).with_alpha(life);
            canvas.fill_circle(spark.position, 1.5 + 2.5 * life, color);
        }
    }
}

impl Visualizer for ParticleFountain {
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
        self.surface.resize(Self::ID, width, height)?;
        self.sparks.clear();
        Ok(())
    }

    fn render_frame(&mut self, features: &AudioFeatures, canvas: &mut dyn Canvas) -> Result<()> {
        let (width, height) = self.surface.dimensions(Self::ID)?;
        self.update(features, width, height);
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

    #[test]
    fn pool_never_exceeds_maximum() {
        let mut plugin = ParticleFountain::default();
        plugin.initialize(400, 4000).unwrap();
        let mut canvas = RecordingCanvas::new(400.0, 4000.0);
        for frame in 0..200 {
            let features = AudioFeatures {
                time_seconds: frame as f64 / 60.0,
                beat: true,
                bass: 1.0,
                treble: 1.0,
                ..AudioFeatures::silent()
            };
            plugin.render_frame(&features, &mut canvas).unwrap();
            assert!(plugin.len() <= MAX_PARTICLES);
            canvas.take_commands();
        }
        assert_eq!(plugin.len(), MAX_PARTICLES);
    }

    #[test]
    fn silence_spawns_nothing() {
        let mut plugin = ParticleFountain::default();
        plugin.initialize(100, 100).unwrap();
        let mut canvas = RecordingCanvas::new(100.0, 100.0);
        plugin
            .render_frame(&AudioFeatures::silent(), &mut canvas)
            .unwrap();
        assert!(plugin.is_empty());
    }

    #[test]
    fn sparks_die_of_old_age() {
        let mut plugin = ParticleFountain::default();
        plugin.initialize(100, 100_000).unwrap();
        let mut canvas = RecordingCanvas::new(100.0, 100_000.0);
        let burst = AudioFeatures {
            beat: true,
            ..AudioFeatures::silent()
        };
        plugin.render_frame(&burst, &mut canvas).unwrap();
        assert_eq!(plugin.len(), BEAT_BURST);

        for frame in 1..=40 {
            let quiet = AudioFeatures {
                time_seconds: frame as f64 * 0.1,
                ..AudioFeatures::silent()
            };
            plugin.render_frame(&quiet, &mut canvas).unwrap();
        }
        assert!(plugin.is_empty());
    }
}
