//! Effect nodes: small configurable draw routines composed into pipelines.
//!
//! A node owns its [`NodeParams`] and whatever scratch state it needs between
//! frames. Nodes are created by name through the [`EffectRegistry`] and
//! configured with [`EffectNodeExt::with`]:
//!
//! ```
//! use audioviz_core::node::{EffectNodeExt, EffectRegistry};
//!
//! let registry = EffectRegistry::with_builtins();
//! let node = registry.create("Trails").unwrap().with("fade", 0.2);
//! assert_eq!(node.name(), "Trails");
//! ```

mod basic;
mod geometry;
mod params;
mod particles;
mod registry;
mod spectrum;

pub use basic::{BeatDetect, ClearFrame, Trails};
pub use geometry::{Glow, Kaleidoscope, ScopeShape, Superscope};
pub use params::{NodeParams, ParamValue};
pub use particles::ParticleSystem;
pub use registry::{EffectRegistry, NodeConstructor};
pub use spectrum::{Oscilloscope, SpectrumBars};

use crate::{
    canvas::{Canvas, Point},
    features::AudioFeatures,
    Result,
};

/// Everything a node needs to draw one frame.
///
/// The context is shared mutably along the pipeline, so upstream nodes may
/// adjust it (for instance `BeatDetect` raising `beat`) for the nodes after
/// them.
pub struct RenderContext<'a> {
    pub width: f32,
    pub height: f32,
    pub waveform: &'a [f32],
    pub spectrum: &'a [f32],
    pub time: f64,
    pub beat: bool,
    pub volume: f32,
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub bpm: f32,
    pub canvas: &'a mut dyn Canvas,
}

impl<'a> RenderContext<'a> {
    pub fn new(features: &'a AudioFeatures, canvas: &'a mut dyn Canvas) -> Self {
        let width = canvas.width();
        let height = canvas.height();
        Self {
            width,
            height,
            waveform: &features.waveform,
            spectrum: &features.spectrum,
            time: features.time_seconds,
            beat: features.beat,
            volume: features.volume,
            bass: features.bass,
            mid: features.mid,
            treble: features.treble,
            bpm: features.bpm,
            canvas,
        }
    }

    /// Overrides the surface size, for hosts whose canvas reports a
    /// different size than the plugin was initialized with.
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn center(&self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn min_dimension(&self) -> f32 {
        self.width.min(self.height)
    }
}

/// Single-entry draw contract implemented by every effect node.
pub trait EffectNode: Send {
    /// Registry name of the node.
    fn name(&self) -> &'static str;

    fn params(&self) -> &NodeParams;

    fn params_mut(&mut self) -> &mut NodeParams;

    /// Draws the effect for the current frame.
    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<()>;

    /// Drops per-frame scratch state, keeping parameters.
    fn reset(&mut self) {}
}

/// Fluent configuration for boxed nodes.
pub trait EffectNodeExt {
    /// Stores `value` under `key` and returns the node for chaining.
    fn with(self, key: &str, value: impl Into<ParamValue>) -> Self;
}

impl<N: EffectNode + ?Sized> EffectNodeExt for Box<N> {
    fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.params_mut().set(key, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordingCanvas;

    #[test]
    fn context_copies_features() {
        let features = AudioFeatures {
            spectrum: vec![0.5; 8],
            waveform: vec![0.1; 4],
            beat: true,
            bass: 0.7,
            time_seconds: 2.5,
            ..AudioFeatures::silent()
        };
        let mut canvas = RecordingCanvas::new(320.0, 200.0);
        let ctx = RenderContext::new(&features, &mut canvas);

        assert_eq!(ctx.width, 320.0);
        assert_eq!(ctx.spectrum.len(), 8);
        assert_eq!(ctx.waveform.len(), 4);
        assert!(ctx.beat);
        assert_eq!(ctx.min_dimension(), 200.0);
        assert_eq!(ctx.center(), Point::new(160.0, 100.0));
    }

    #[test]
    fn with_chains_parameters() {
        let node: Box<dyn EffectNode> = Box::new(SpectrumBars::default());
        let node = node.with("bars", 12).with("gain", 2.0_f32);
        assert_eq!(node.params().count("bars", 0).unwrap(), 12);
        assert_eq!(node.params().float("gain", 0.0).unwrap(), 2.0);
    }
}
