use std::collections::VecDeque;

use super::{EffectNode, NodeParams, RenderContext};
use crate::{
    canvas::Rect,
    color::Rgba,
    features::band_average,
    Result,
};

/// Clears the whole frame to `color` (default black).
#[derive(Debug, Clone, Default)]
pub struct ClearFrame {
    params: NodeParams,
}

impl EffectNode for ClearFrame {
    fn name(&self) -> &'static str {
        "ClearFrame"
    }

    fn params(&self) -> &NodeParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut NodeParams {
        &mut self.params
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let color = self.params.color("color", Rgba::BLACK)?;
        ctx.canvas.clear(color);
        Ok(())
    }
}

/// Fades the previous frame by covering it with a translucent rectangle.
///
/// Parameters: `fade` (alpha, 0.15) and `color` (black).
#[derive(Debug, Clone, Default)]
pub struct Trails {
    params: NodeParams,
}

impl EffectNode for Trails {
    fn name(&self) -> &'static str {
        "Trails"
    }

    fn params(&self) -> &NodeParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut NodeParams {
        &mut self.params
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let fade = self.params.float("fade", 0.15)?.clamp(0.0, 1.0);
        let color = self.params.color("color", Rgba::BLACK)?;
        ctx.canvas
            .fill_rect(Rect::full(ctx.width, ctx.height), color.with_alpha(fade));
        Ok(())
    }
}

const MIN_BEAT_HISTORY: usize = 8;
const SILENCE_FLOOR: f32 = 0.01;

/// Energy-based beat detector.
///
/// Compares the low band of the spectrum against its running average and
/// raises `ctx.beat` for the nodes that follow. Parameters: `sensitivity`
/// (1.3), `history` (43 frames), `cooldown` (8 frames) and `flash` (alpha of
/// a white flash drawn on detected beats, 0 disables it).
#[derive(Debug, Clone, Default)]
pub struct BeatDetect {
    params: NodeParams,
    history: VecDeque<f32>,
    cooldown: usize,
    detected: bool,
}

impl BeatDetect {
    /// Whether the last rendered frame was detected as a beat.
    pub fn detected(&self) -> bool {
        self.detected
    }

    fn low_band_energy(ctx: &RenderContext<'_>) -> f32 {
        if ctx.spectrum.is_empty() {
            ctx.bass
        } else {
            band_average(ctx.spectrum, 0.0, 0.1)
        }
    }
}

impl EffectNode for BeatDetect {
    fn name(&self) -> &'static str {
        "BeatDetect"
    }

    fn params(&self) -> &NodeParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut NodeParams {
        &mut self.params
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let sensitivity = self.params.float("sensitivity", 1.3)?;
        let capacity = self.params.count("history", 43)?.max(1);
        let cooldown = self.params.count("cooldown", 8)?;
        let flash = self.params.float("flash", 0.0)?.clamp(0.0, 1.0);

        let energy = Self::low_band_energy(ctx);
        let warmed_up = self.history.len() >= MIN_BEAT_HISTORY.min(capacity);
        let average = if self.history.is_empty() {
            0.0
        } else {
            self.history.iter().sum::<f32>() / self.history.len() as f32
        };

        self.detected = warmed_up
            && self.cooldown == 0
            && energy > SILENCE_FLOOR
            && energy > average * sensitivity;

        if self.detected {
            self.cooldown = cooldown;
        } else {
            self.cooldown = self.cooldown.saturating_sub(1);
        }

        self.history.push_back(energy);
        while self.history.len() > capacity {
            self.history.pop_front();
        }

        ctx.beat |= self.detected;

        if self.detected && flash > 0.0 {
            ctx.canvas.fill_rect(
                Rect::full(ctx.width, ctx.height),
                Rgba::WHITE.with_alpha(flash),
            );
        }

        Ok(())
    }

    fn reset(&mut self) {
        self.history.clear();
        self.cooldown = 0;
        self.detected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        features::AudioFeatures,
        node::EffectNodeExt,
        record::{DrawCommand, RecordingCanvas},
    };

    fn render_with(node: &mut dyn EffectNode, features: &AudioFeatures) -> (bool, RecordingCanvas) {
        let mut canvas = RecordingCanvas::new(100.0, 50.0);
        let mut ctx = RenderContext::new(features, &mut canvas);
        node.render(&mut ctx).unwrap();
        let beat = ctx.beat;
        (beat, canvas)
    }

    fn spectrum_frame(level: f32) -> AudioFeatures {
        AudioFeatures {
            spectrum: vec![level; 20],
            ..AudioFeatures::silent()
        }
    }

    #[test]
    fn clear_frame_uses_configured_colour() {
        let mut node: Box<dyn EffectNode> =
            Box::new(ClearFrame::default()).with("color", "#ff0000");
        let (_, canvas) = render_with(node.as_mut(), &AudioFeatures::silent());
        assert_eq!(
            canvas.commands(),
            &[DrawCommand::Clear {
                color: Rgba::rgb(1.0, 0.0, 0.0)
            }]
        );
    }

    #[test]
    fn trails_cover_the_frame_translucently() {
        let mut node = Box::new(Trails::default()).with("fade", 0.25_f32);
        let (_, canvas) = render_with(node.as_mut(), &AudioFeatures::silent());
        match &canvas.commands()[0] {
            DrawCommand::FillRect { rect, color } => {
                assert_eq!(*rect, Rect::full(100.0, 50.0));
                assert!((color.a - 0.25).abs() < 1e-6);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn beat_detect_flags_energy_spikes() {
        let mut node = BeatDetect::default();
        for _ in 0..10 {
            let (beat, _) = render_with(&mut node, &spectrum_frame(0.1));
            assert!(!beat);
        }

        let (beat, _) = render_with(&mut node, &spectrum_frame(0.9));
        assert!(beat);
        assert!(node.detected());

        // still loud, but inside the cooldown window
        let (beat, _) = render_with(&mut node, &spectrum_frame(0.95));
        assert!(!beat);
    }

    #[test]
    fn beat_detect_ignores_silence() {
        let mut node = BeatDetect::default();
        for _ in 0..20 {
            let (beat, _) = render_with(&mut node, &AudioFeatures::silent());
            assert!(!beat);
        }
    }

    #[test]
    fn beat_detect_keeps_upstream_beats() {
        let mut node = BeatDetect::default();
        let features = AudioFeatures {
            beat: true,
            ..AudioFeatures::silent()
        };
        let (beat, _) = render_with(&mut node, &features);
        assert!(beat);
    }

    #[test]
    fn beat_detect_flashes_when_configured() {
        let mut node = BeatDetect::default();
        node.params_mut().set("flash", 0.5_f32);
        for _ in 0..10 {
            render_with(&mut node, &spectrum_frame(0.1));
        }
        let (_, canvas) = render_with(&mut node, &spectrum_frame(0.9));
        assert_eq!(canvas.commands().len(), 1);
    }
}
