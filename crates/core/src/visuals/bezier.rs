use std::f32::consts::TAU;

use crate::{
    canvas::{Canvas, Point, Rect},
    color::{hsv_to_rgb, Rgba},
    plugin::{Surface, Visualizer},
    AudioFeatures, Result,
};

use super::FrameTimer;

const CURVES: usize = 6;
const SEGMENTS: usize = 48;
const ECHOES: usize = 3;

/// Evaluates a cubic Bézier curve at `t` with de Casteljau's algorithm.
pub fn cubic_bezier(p0: Point, p1: Point, p2: Point, p3: Point, t: f32) -> Point {
    let a = p0.lerp(p1, t);
    let b = p1.lerp(p2, t);
    let c = p2.lerp(p3, t);
    let d = a.lerp(b, t);
    let e = b.lerp(c, t);
    d.lerp(e, t)
}

/// Control-point motion for one curve, in normalised screen space.
#[derive(Debug, Clone, Copy)]
struct CurveMotion {
    phase: f32,
    speed: f32,
    hue: f32,
}

/// Flowing cubic Bézier ribbons whose control points follow the mids and
/// treble.
#[derive(Debug)]
pub struct BezierRibbons {
    surface: Surface,
    timer: FrameTimer,
    curves: [CurveMotion; CURVES],
    energy: f32,
    points: Vec<Point>,
}

impl Default for BezierRibbons {
    fn default() -> Self {
        let curves = std::array::from_fn(|i| CurveMotion {
            phase: i as f32 * TAU / CURVES as f32,
            speed: 0.3 + 0.07 * i as f32,
            hue: i as f32 * 360.0 / CURVES as f32,
        });
        Self {
            surface: Surface::default(),
            timer: FrameTimer::default(),
            curves,
            energy: 0.0,
            points: Vec::with_capacity(SEGMENTS + 1),
        }
    }
}

impl BezierRibbons {
    pub const ID: &'static str = "bezier";
    pub const NAME: &'static str = "Bezier Ribbons";

    fn update(&mut self, features: &AudioFeatures) {
        let dt = self.timer.delta(features.time_seconds);
        let drive = 1.0 + 2.0 * features.mid.clamp(0.0, 1.0) + if features.beat { 1.5 } else { 0.0 };
        for curve in &mut self.curves {
            curve.phase = (curve.phase + curve.speed * drive * dt).rem_euclid(TAU);
            curve.hue = (curve.hue + 20.0 * dt).rem_euclid(360.0);
        }
        self.energy += (features.treble.clamp(0.0, 1.0) - self.energy) * 0.2;
    }

    fn control_points(curve: &CurveMotion, echo: f32, energy: f32, width: f32, height: f32) -> [Point; 4] {
        let phase = curve.phase - echo * 0.12;
        let swing = 0.25 + 0.2 * energy;
        let at = |x: f32, y: f32| Point::new(x * width, y * height);
        [
            at(0.05, 0.5 + swing * phase.sin()),
            at(0.35 + 0.1 * (phase * 1.3).cos(), 0.5 + swing * 1.6 * (phase * 0.7).cos()),
            at(0.65 + 0.1 * (phase * 0.9).sin(), 0.5 - swing * 1.6 * (phase * 1.1).sin()),
            at(0.95, 0.5 + swing * (phase + 1.0).cos()),
        ]
    }

    fn draw(&mut self, canvas: &mut dyn Canvas, width: f32, height: f32) {
        canvas.fill_rect(Rect::full(width, height), Rgba::BLACK.with_alpha(0.3));

        for curve in &self.curves {
            for echo in (0..ECHOES).rev() {
                let [p0, p1, p2, p3] =
                    Self::control_points(curve, echo as f32, self.energy, width, height);
                self.points.clear();
                self.points.extend((0..=SEGMENTS).map(|step| {
                    cubic_bezier(p0, p1, p2, p3, step as f32 / SEGMENTS as f32)
                }));

                let fade = 1.0 - echo as f32 / ECHOES as f32;
                let color = hsv_to_rgb(curve.hue, 0.75, 1.0).with_alpha(fade);
                canvas.set_line_width(1.0 + 2.0 * fade);
                canvas.draw_lines(&self.points, color, false);
            }
        }
    }
}

impl Visualizer for BezierRibbons {
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
    fn bezier_hits_endpoints_and_midpoint() {
        let p0 = Point::new(0.0, 0.0);
        let p1 = Point::new(0.0, 1.0);
        let p2 = Point::new(1.0, 1.0);
        let p3 = Point::new(1.0, 0.0);

        assert_eq!(cubic_bezier(p0, p1, p2, p3, 0.0), p0);
        assert_eq!(cubic_bezier(p0, p1, p2, p3, 1.0), p3);
        let mid = cubic_bezier(p0, p1, p2, p3, 0.5);
        assert!((mid.x - 0.5).abs() < 1e-6);
        assert!((mid.y - 0.75).abs() < 1e-6);
    }

    #[test]
    fn draws_every_curve_with_echoes() {
        let mut plugin = BezierRibbons::default();
        plugin.initialize(400, 300).unwrap();
        let mut canvas = RecordingCanvas::new(400.0, 300.0);
        plugin
            .render_frame(&AudioFeatures::silent(), &mut canvas)
            .unwrap();

        let curves: Vec<usize> = canvas
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Lines { points, .. } => Some(points.len()),
                _ => None,
            })
            .collect();
        assert_eq!(curves.len(), CURVES * ECHOES);
        assert!(curves.iter().all(|&n| n == SEGMENTS + 1));
    }

    #[test]
    fn curves_start_and_end_at_the_edges() {
        let plugin = BezierRibbons::default();
        let [p0, _, _, p3] =
            BezierRibbons::control_points(&plugin.curves[0], 0.0, 0.0, 100.0, 100.0);
        assert!((p0.x - 5.0).abs() < 1e-4);
        assert!((p3.x - 95.0).abs() < 1e-4);
    }
}
