use std::f32::consts::TAU;

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{EffectNode, NodeParams, RenderContext};
use crate::{
    canvas::Point,
    color::{hsv_to_rgb, Rgba},
    Result,
};

const DEFAULT_SEED: u64 = 0x5eed;
const MAX_POOL: usize = 65_536;

#[derive(Debug, Clone)]
struct Particle {
    position: Point,
    velocity: Point,
    life: u32,
    max_life: u32,
    hue: f32,
}

/// Beat-triggered particle bursts with gravity.
///
/// Parameters: `max_particles` (256, at most 65536), `spawn_per_beat` (24),
/// `rate` (particles per frame scaled by volume, 0), `gravity` (0.15),
/// `speed` (4.0), `life` (60 frames), optional `color` (hue cycles when
/// unset) and `seed`.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    params: NodeParams,
    particles: Vec<Particle>,
    rng: StdRng,
    seeded_with: u64,
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self {
            params: NodeParams::new(),
            particles: Vec::new(),
            rng: StdRng::seed_from_u64(DEFAULT_SEED),
            seeded_with: DEFAULT_SEED,
        }
    }
}

impl ParticleSystem {
    /// Number of live particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    fn spawn(&mut self, count: usize, origin: Point, speed: f32, life: u32, energy: f32, time: f64) {
        for _ in 0..count {
            let angle = self.rng.gen_range(0.0..TAU);
            let magnitude = speed * self.rng.gen_range(0.5..1.5) * (1.0 + energy);
            let jitter = self.rng.gen_range(0.0..60.0);
            self.particles.push(Particle {
                position: origin,
                velocity: Point::new(angle.cos() * magnitude, angle.sin() * magnitude),
                life,
                max_life: life,
                hue: (time as f32 * 40.0 + jitter) % 360.0,
            });
        }
    }

    fn step(&mut self, gravity: f32, width: f32, height: f32) {
        let margin = 32.0;
        for particle in &mut self.particles {
            particle.velocity.y += gravity;
            particle.position.x += particle.velocity.x;
            particle.position.y += particle.velocity.y;
            particle.life = particle.life.saturating_sub(1);
        }
        self.particles.retain(|p| {
            p.life > 0
                && p.position.x > -margin
                && p.position.x < width + margin
                && p.position.y > -margin
                && p.position.y < height + margin
        });
    }
}

impl EffectNode for ParticleSystem {
    fn name(&self) -> &'static str {
        "ParticleSystem"
    }

    fn params(&self) -> &NodeParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut NodeParams {
        &mut self.params
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let max_particles = self.params.count_up_to("max_particles", 256, MAX_POOL)?;
        let per_beat = self.params.count("spawn_per_beat", 24)?;
        let rate = self.params.float("rate", 0.0)?.max(0.0);
        let gravity = self.params.float("gravity", 0.15)?;
        let speed = self.params.float("speed", 4.0)?;
        let life = u32::try_from(self.params.count("life", 60)?)
            .unwrap_or(u32::MAX)
            .max(1);
        let fixed_color = if self.params.contains("color") {
            Some(self.params.color("color", Rgba::WHITE)?)
        } else {
            None
        };
        let seed = self.params.count("seed", DEFAULT_SEED as usize)? as u64;
        if seed != self.seeded_with {
            self.rng = StdRng::seed_from_u64(seed);
            self.seeded_with = seed;
        }

        self.step(gravity, ctx.width, ctx.height);
        self.particles.truncate(max_particles);

        let mut wanted = (rate * ctx.volume).round() as usize;
        if ctx.beat {
            wanted = wanted.saturating_add(per_beat);
        }
        let room = max_particles.saturating_sub(self.particles.len());
        self.spawn(wanted.min(room), ctx.center(), speed, life, ctx.bass, ctx.time);

        for particle in &self.particles {
            let fade = particle.life as f32 / particle.max_life as f32;
            let color = fixed_color
                .unwrap_or_else(|| hsv_to_rgb(particle.hue, 0.8, 1.0))
                .with_alpha(fade);
            ctx.canvas
                .fill_circle(particle.position, 1.0 + 3.0 * fade, color);
        }

        Ok(())
    }

    fn reset(&mut self) {
        self.particles.clear();
        self.rng = StdRng::seed_from_u64(self.seeded_with);
    }
}
