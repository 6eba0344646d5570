use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    canvas::{Canvas, Rect},
    color::{Palette, Rgba},
    plugin::{Surface, Visualizer},
    AudioFeatures, Result,
};

const MIN_POINTS: usize = 600;
/// Upper bound on points plotted per frame.
pub const MAX_POINTS: usize = 2_000;
/// Iterations discarded before plotting so the orbit settles on the attractor.
const WARMUP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variation {
    Linear,
    Sinusoidal,
    Spherical,
    Swirl,
}

impl Variation {
    fn apply(self, x: f32, y: f32) -> (f32, f32) {
        match self {
            Variation::Linear => (x, y),
            Variation::Sinusoidal => (x.sin(), y.sin()),
            Variation::Spherical => {
                let r2 = (x * x + y * y).max(1e-4);
                (x / r2, y / r2)
            }
            Variation::Swirl => {
                let r2 = x * x + y * y;
                let (s, c) = r2.sin_cos();
                (x * s - y * c, x * c + y * s)
            }
        }
    }
}

/// Affine map `(a x + b y + c, d x + e y + f)` followed by a variation.
#[derive(Debug, Clone, Copy)]
struct FlameMap {
    coefficients: [f32; 6],
    variation: Variation,
    color: f32,
}

impl FlameMap {
    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.coefficients;
        self.variation.apply(a * x + b * y + c, d * x + e * y + f)
    }
}

/// Toy fractal flame drawn with the chaos game.
#[derive(Debug)]
pub struct FractalFlame {
    surface: Surface,
    rng: StdRng,
    maps: [FlameMap; 3],
    point: (f32, f32),
    color: f32,
    palette: Palette,
}

impl Default for FractalFlame {
    fn default() -> Self {
        Self {
            surface: Surface::default(),
            rng: StdRng::seed_from_u64(0xf1a3e),
            maps: Self::base_maps(),
            point: (0.1, 0.1),
            color: 0.5,
            palette: Palette::ember(),
        }
    }
}

impl FractalFlame {
    pub const ID: &'static str = "flame";
    pub const NAME: &'static str = "Fractal Flame";

    fn base_maps() -> [FlameMap; 3] {
        [
            FlameMap {
                coefficients: [0.5, 0.0, -0.5, 0.0, 0.5, -0.5],
                variation: Variation::Sinusoidal,
                color: 0.0,
            },
            FlameMap {
                coefficients: [0.5, 0.0, 0.5, 0.0, 0.5, -0.5],
                variation: Variation::Spherical,
                color: 0.5,
            },
            FlameMap {
                coefficients: [0.5, 0.0, 0.0, 0.0, 0.5, 0.5],
                variation: Variation::Swirl,
                color: 1.0,
            },
        ]
    }

    /// Points plotted for a frame at `volume`.
    pub fn points_for(volume: f32) -> usize {
        (MIN_POINTS + (volume.clamp(0.0, 1.0) * 1_400.0) as usize).min(MAX_POINTS)
    }

    fn update(&mut self, features: &AudioFeatures) {
        let time = features.time_seconds as f32;
        let bass = features.bass.clamp(0.0, 1.0);
        let mid = features.mid.clamp(0.0, 1.0);

        for (index, (map, base)) in self.maps.iter_mut().zip(Self::base_maps()).enumerate() {
            let phase = time * (0.2 + 0.1 * index as f32);
            let (s, c) = phase.sin_cos();
            let scale = 0.9 + 0.3 * bass;
            let [a, b, _, d, e, _] = base.coefficients;
            map.coefficients[0] = (a * c - b * s) * scale;
            map.coefficients[1] = (a * s + b * c) * scale + 0.2 * mid;
            map.coefficients[3] = (d * c - e * s) * scale - 0.2 * mid;
            map.coefficients[4] = (d * s + e * c) * scale;
        }
    }

    fn draw(&mut self, features: &AudioFeatures, canvas: &mut dyn Canvas, width: f32, height: f32) {
        canvas.fill_rect(Rect::full(width, height), Rgba::BLACK.with_alpha(0.2));

        let scale = width.min(height) / 3.0;
        let (cx, cy) = (width * 0.5, height * 0.5);
        let dot = (scale / 150.0).clamp(1.0, 3.0);
        let total = Self::points_for(features.volume);

        for iteration in 0..total + WARMUP {
            let map = self.maps[self.rng.gen_range(0..self.maps.len())];
            let (x, y) = map.apply(self.point.0, self.point.1);
            self.point = if x.is_finite() && y.is_finite() && x.abs() < 1e3 && y.abs() < 1e3 {
                (x, y)
            } else {
                (self.rng.gen_range(-1.0..1.0), self.rng.gen_range(-1.0..1.0))
            };
            self.color = (self.color + map.color) * 0.5;

            if iteration < WARMUP {
                continue;
            }
            let px = cx + self.point.0 * scale;
            let py = cy + self.point.1 * scale;
            if px < 0.0 || py < 0.0 || px > width || py > height {
                continue;
            }
            let color = self.palette.sample(self.color).with_alpha(0.5);
            canvas.fill_rect(Rect::new(px, py, dot, dot), color);
        }
    }
}

impl Visualizer for FractalFlame {
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
