//! Standalone visualizers that draw directly against the canvas.
//!
//! Each visualizer owns its state and splits every frame into an update step
//! (advance particles, phases, cameras) and a draw step.

mod bars;
mod bezier;
mod circles;
mod flame;
mod lissajous;
mod maze;
mod particles;
mod waves;

pub use bars::BarsVisualizer;
pub use bezier::{cubic_bezier, BezierRibbons};
pub use circles::PulseCircles;
pub use flame::FractalFlame;
pub use lissajous::LissajousScope;
pub use maze::{Maze, MazeRunner};
pub use particles::ParticleFountain;
pub use waves::WaveField;

use crate::plugin::{Visualizer, VisualizerConstructor};

/// `(id, display name, constructor)` for every standalone visualizer.
pub fn builtins() -> Vec<(&'static str, &'static str, VisualizerConstructor)> {
    let mut entries: Vec<(&'static str, &'static str, VisualizerConstructor)> = Vec::new();
    entries.push((PulseCircles::ID, PulseCircles::NAME, boxed::<PulseCircles>));
    entries.push((BarsVisualizer::ID, BarsVisualizer::NAME, boxed::<BarsVisualizer>));
    entries.push((ParticleFountain::ID, ParticleFountain::NAME, boxed::<ParticleFountain>));
    entries.push((FractalFlame::ID, FractalFlame::NAME, boxed::<FractalFlame>));
    entries.push((MazeRunner::ID, MazeRunner::NAME, boxed::<MazeRunner>));
    entries.push((BezierRibbons::ID, BezierRibbons::NAME, boxed::<BezierRibbons>));
    entries.push((LissajousScope::ID, LissajousScope::NAME, boxed::<LissajousScope>));
    entries.push((WaveField::ID, WaveField::NAME, boxed::<WaveField>));
    entries
}

fn boxed<V: Visualizer + Default + 'static>() -> Box<dyn Visualizer> {
    Box::new(V::default())
}

const DEFAULT_FRAME_DELTA: f32 = 1.0 / 60.0;
const MAX_FRAME_DELTA: f32 = 0.1;

/// Derives per-frame time steps from feature timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FrameTimer {
    last: Option<f64>,
}

impl FrameTimer {
    /// Seconds since the previous frame, clamped so pauses and seeks do not
    /// make animations jump.
    pub(crate) fn delta(&mut self, now: f64) -> f32 {
        let delta = match self.last {
            Some(last) if now > last => ((now - last) as f32).min(MAX_FRAME_DELTA),
            _ => DEFAULT_FRAME_DELTA,
        };
        self.last = Some(now);
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_clamps_deltas() {
        let mut timer = FrameTimer::default();
        assert_eq!(timer.delta(5.0), DEFAULT_FRAME_DELTA);
        assert!((timer.delta(5.05) - 0.05).abs() < 1e-5);
        assert_eq!(timer.delta(9.0), MAX_FRAME_DELTA);
        assert_eq!(timer.delta(1.0), DEFAULT_FRAME_DELTA);
    }

    #[test]
    fn builtin_ids_are_unique() {
        let mut ids: Vec<&str> = builtins().into_iter().map(|(id, _, _)| id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }
}
