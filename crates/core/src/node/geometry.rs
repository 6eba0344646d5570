use std::f32::consts::{PI, TAU};

use super::{EffectNode, NodeParams, RenderContext};
use crate::{
    canvas::Point,
    color::{hsv_to_rgb, Rgba},
    features::sample_linear,
    Result, VizError,
};

const MAX_SEGMENTS: usize = 64;
const MAX_MOTIF_POINTS: usize = 1024;
const MAX_GLOW_LAYERS: usize = 64;
const MAX_SCOPE_POINTS: usize = 4096;

/// Mirrors a spectrum-driven polyline into rotated, reflected segments.
///
/// Parameters: `segments` (6), `radius` (fraction of the short side, 0.45),
/// `speed` (radians per second, 0.3), `points` (32) and `line_width` (1.5).
#[derive(Debug, Clone, Default)]
pub struct Kaleidoscope {
    params: NodeParams,
    shape: Vec<(f32, f32)>,
    scratch: Vec<Point>,
}

impl EffectNode for Kaleidoscope {
    fn name(&self) -> &'static str {
        "Kaleidoscope"
    }

    fn params(&self) -> &NodeParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut NodeParams {
        &mut self.params
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let segments = self.params.count_up_to("segments", 6, MAX_SEGMENTS)?.max(1);
        let radius = self.params.float("radius", 0.45)? * ctx.min_dimension();
        let speed = self.params.float("speed", 0.3)?;
        let points = self.params.count_up_to("points", 32, MAX_MOTIF_POINTS)?.max(2);
        let line_width = self.params.float("line_width", 1.5)?;

        let segment_angle = TAU / segments as f32;
        let rotation = (ctx.time as f32 * speed).rem_euclid(TAU);
        let pulse = if ctx.beat { 1.15 } else { 1.0 };

        // (distance, angle inside the segment) for each point of the motif
        self.shape.clear();
        self.shape.extend((0..points).map(|i| {
            let t = i as f32 / (points - 1) as f32;
            let level = sample_linear(ctx.spectrum, t);
            let distance = radius * pulse * (0.15 + 0.85 * t);
            let local = segment_angle * 0.5 * (0.2 + 0.8 * level).min(1.0);
            (distance, local)
        }));

        let center = ctx.center();
        ctx.canvas.set_line_width(line_width);
        for segment in 0..segments {
            let base = segment as f32 * segment_angle + rotation;
            let hue = segment as f32 * 360.0 / segments as f32 + ctx.time as f32 * 20.0;
            let color = hsv_to_rgb(hue, 0.8, 0.6 + 0.4 * ctx.volume.clamp(0.0, 1.0));

            self.scratch.clear();
            self.scratch.extend(
                self.shape
                    .iter()
                    .map(|&(distance, local)| center.polar(distance, base + local)),
            );
            ctx.canvas.draw_lines(&self.scratch, color, false);

            self.scratch.clear();
            self.scratch.extend(self.shape.iter().map(|&(distance, local)| {
                center.polar(distance, base + segment_angle - local)
            }));
            ctx.canvas.draw_lines(&self.scratch, color, false);
        }

        Ok(())
    }
}

/// Concentric translucent circles that swell with volume and beats.
///
/// Parameters: `layers` (6, at most 64), `radius` (fraction of the short
/// side, 0.2) and `color` (warm white).
#[derive(Debug, Clone, Default)]
pub struct Glow {
    params: NodeParams,
}

impl EffectNode for Glow {
    fn name(&self) -> &'static str {
        "Glow"
    }

    fn params(&self) -> &NodeParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut NodeParams {
        &mut self.params
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let layers = self.params.count_up_to("layers", 6, MAX_GLOW_LAYERS)?;
        let radius = self.params.float("radius", 0.2)? * ctx.min_dimension();
        let color = self.params.color("color", Rgba::rgb(1.0, 0.9, 0.7))?;

        let intensity = 0.5 + 0.5 * ctx.volume.clamp(0.0, 1.0);
        let swell = 1.0 + 0.5 * ctx.volume.clamp(0.0, 1.0) + if ctx.beat { 0.25 } else { 0.0 };
        let center = ctx.center();

        for layer in 0..layers {
            let t = layer as f32 / layers as f32;
            let r = radius * swell * (1.0 - 0.8 * t);
            let alpha = (0.06 + 0.14 * t) * intensity;
            ctx.canvas.fill_circle(center, r, color.with_alpha(alpha));
        }

        Ok(())
    }
}

/// Parametric point generator shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeShape {
    Spiral,
    Lissajous,
    Ring,
    Wave,
}

impl ScopeShape {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "spiral" => Ok(Self::Spiral),
            "lissajous" => Ok(Self::Lissajous),
            "ring" => Ok(Self::Ring),
            "wave" => Ok(Self::Wave),
            other => Err(VizError::invalid_param(
                "shape",
                format!("unknown superscope shape `{other}`"),
            )),
        }
    }
}

/// Fixed-formula superscope: one point per step, modulated by the waveform.
///
/// Parameters: `shape` (`spiral`, `lissajous`, `ring` or `wave`; default
/// `ring`), `points` (128, at most 4096), `line_width` (1.0) and optional
/// `color`.
#[derive(Debug, Clone, Default)]
pub struct Superscope {
    params: NodeParams,
    points: Vec<Point>,
}

impl Superscope {
    fn point(
        shape: ScopeShape,
        t: f32,
        sample: f32,
        time: f32,
        center: Point,
        width: f32,
        height: f32,
    ) -> Point {
        let size = width.min(height);
        match shape {
            ScopeShape::Spiral => {
                let r = t * (0.4 + 0.1 * sample) * size;
                center.polar(r, t * TAU * 4.0 + time)
            }
            ScopeShape::Lissajous => {
                let amp = (0.35 + 0.1 * sample) * size;
                Point::new(
                    center.x + amp * (3.0 * t * TAU + time).sin(),
                    center.y + amp * (2.0 * t * TAU).sin(),
                )
            }
            ScopeShape::Ring => {
                let r = (0.3 + 0.1 * sample) * size;
                center.polar(r, t * TAU - PI * 0.5 + time * 0.2)
            }
            ScopeShape::Wave => Point::new(t * width, center.y + sample * height * 0.3),
        }
    }
}

impl EffectNode for Superscope {
    fn name(&self) -> &'static str {
        "Superscope"
    }

    fn params(&self) -> &NodeParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut NodeParams {
        &mut self.params
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let shape = ScopeShape::parse(self.params.text("shape", "ring")?)?;
        let count = self.params.count_up_to("points", 128, MAX_SCOPE_POINTS)?.max(2);
        let line_width = self.params.float("line_width", 1.0)?;
        let time = ctx.time as f32;
        let color = if self.params.contains("color") {
            self.params.color("color", Rgba::WHITE)?
        } else {
            hsv_to_rgb(time * 30.0, 0.7, 1.0)
        };

        let center = ctx.center();
        let (width, height) = (ctx.width, ctx.height);
        let waveform = ctx.waveform;
        self.points.clear();
        self.points.extend((0..count).map(|i| {
            let t = i as f32 / (count - 1) as f32;
            let sample = sample_linear(waveform, t);
            Self::point(shape, t, sample, time, center, width, height)
        }));

        ctx.canvas.set_line_width(line_width);
        ctx.canvas
            .draw_lines(&self.points, color, shape == ScopeShape::Ring);
        Ok(())
    }
}
