use super::{EffectNode, NodeParams, RenderContext};
use crate::{
    canvas::{Point, Rect},
    color::{hsv_to_rgb, Rgba},
    features::band_average,
    Result,
};

const MAX_BARS: usize = 1024;

/// Vertical bars, one per spectrum band, rising from the bottom edge.
///
/// Parameters: `bars` (32, at most 1024), `gain` (1.0), `gap` (fraction of
/// a bar left empty, 0.2) and optional `color` (rainbow when unset).
#[derive(Debug, Clone, Default)]
pub struct SpectrumBars {
    params: NodeParams,
}

impl EffectNode for SpectrumBars {
    fn name(&self) -> &'static str {
        "SpectrumBars"
    }

    fn params(&self) -> &NodeParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut NodeParams {
        &mut self.params
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let bars = self.params.count_up_to("bars", 32, MAX_BARS)?;
        let gain = self.params.float("gain", 1.0)?;
        let gap = self.params.float("gap", 0.2)?.clamp(0.0, 0.9);
        let fixed_color = if self.params.contains("color") {
            Some(self.params.color("color", Rgba::WHITE)?)
        } else {
            None
        };

        if bars == 0 || ctx.spectrum.is_empty() {
            return Ok(());
        }

        let slot = ctx.width / bars as f32;
        for bar in 0..bars {
            let low = bar as f32 / bars as f32;
            let high = (bar + 1) as f32 / bars as f32;
            let level = (band_average(ctx.spectrum, low, high) * gain).clamp(0.0, 1.0);
            let height = level * ctx.height;
            let color =
                fixed_color.unwrap_or_else(|| hsv_to_rgb(low * 300.0, 0.85, 0.5 + 0.5 * level));
            ctx.canvas.fill_rect(
                Rect::new(
                    bar as f32 * slot + slot * gap * 0.5,
                    ctx.height - height,
                    slot * (1.0 - gap),
                    height,
                ),
                color,
            );
        }

        Ok(())
    }
}

/// Waveform trace across the full width of the frame.
///
/// Parameters: `amplitude` (fraction of the height, 0.3) and `color`
/// (white). An empty waveform draws a flat line.
#[derive(Debug, Clone, Default)]
pub struct Oscilloscope {
    params: NodeParams,
    points: Vec<Point>,
}

const MAX_TRACE_POINTS: usize = 1024;

impl EffectNode for Oscilloscope {
    fn name(&self) -> &'static str {
        "Oscilloscope"
    }

    fn params(&self) -> &NodeParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut NodeParams {
        &mut self.params
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let amplitude = self.params.float("amplitude", 0.3)? * ctx.height;
        let color = self.params.color("color", Rgba::WHITE)?;
        let mid_y = ctx.height * 0.5;

        self.points.clear();
        if ctx.waveform.is_empty() {
            self.points.push(Point::new(0.0, mid_y));
            self.points.push(Point::new(ctx.width, mid_y));
        } else {
            let count = ctx
                .waveform
                .len()
                .min(MAX_TRACE_POINTS)
                .min(ctx.width.max(2.0) as usize)
                .max(2);
            let step = ctx.waveform.len() as f32 / count as f32;
            let waveform = ctx.waveform;
            let width = ctx.width;
            self.points.extend((0..count).map(|i| {
                let index = ((i as f32 * step) as usize).min(waveform.len() - 1);
                let x = width * i as f32 / (count - 1) as f32;
                Point::new(x, mid_y - waveform[index].clamp(-1.0, 1.0) * amplitude)
            }));
        }

        ctx.canvas.draw_lines(&self.points, color, false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        features::AudioFeatures,
        record::{DrawCommand, RecordingCanvas},
    };

    fn render(node: &mut dyn EffectNode, features: &AudioFeatures) -> RecordingCanvas {
        let mut canvas = RecordingCanvas::new(320.0, 100.0);
        let mut ctx = RenderContext::new(features, &mut canvas);
        node.render(&mut ctx).unwrap();
        canvas
    }

    #[test]
    fn bars_scale_with_spectrum() {
        let mut node = SpectrumBars::default();
        node.params_mut().set("bars", 4);
        node.params_mut().set("gap", 0.0_f32);
        let features = AudioFeatures {
            spectrum: vec![1.0, 1.0, 0.5, 0.5, 0.25, 0.25, 0.0, 0.0],
            ..AudioFeatures::silent()
        };
        let canvas = render(&mut node, &features);
        let heights: Vec<f32> = canvas
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillRect { rect, .. } => Some(rect.height),
                _ => None,
            })
            .collect();
        assert_eq!(heights, vec![100.0, 50.0, 25.0, 0.0]);
    }

    #[test]
    fn bars_skip_empty_spectrum() {
        let mut node = SpectrumBars::default();
        let canvas = render(&mut node, &AudioFeatures::silent());
        assert!(canvas.commands().is_empty());
    }

    #[test]
    fn oscilloscope_flat_line_without_waveform() {
        let mut node = Oscilloscope::default();
        let canvas = render(&mut node, &AudioFeatures::silent());
        match &canvas.commands()[0] {
            DrawCommand::Lines { points, .. } => {
                assert_eq!(points.len(), 2);
                assert!(points.iter().all(|p| p.y == 50.0));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn oscilloscope_traces_samples() {
        let mut node = Oscilloscope::default();
        let features = AudioFeatures {
            waveform: vec![1.0; 64],
            ..AudioFeatures::silent()
        };
        let canvas = render(&mut node, &features);
        match &canvas.commands()[0] {
            DrawCommand::Lines { points, .. } => {
                assert_eq!(points.len(), 64);
                assert!(points.iter().all(|p| (p.y - 20.0).abs() < 1e-4));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
