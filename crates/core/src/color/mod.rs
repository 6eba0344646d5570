//! Shared colour helpers used by every node and visualizer.

use serde::{Deserialize, Serialize};

use crate::{Result, VizError};

/// Linear RGBA colour with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Rgba = Rgba::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Returns the same colour with a replaced (clamped) alpha channel.
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: alpha.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Multiplies the colour channels, leaving alpha alone.
    pub fn scale(self, factor: f32) -> Self {
        Self {
            r: (self.r * factor).clamp(0.0, 1.0),
            g: (self.g * factor).clamp(0.0, 1.0),
            b: (self.b * factor).clamp(0.0, 1.0),
            a: self.a,
        }
    }

    /// Linear interpolation between two colours, `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Rgba, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Formats as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(self) -> String {
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        if byte(self.a) == 255 {
            format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
        } else {
            format!(
                "#{:02x}{:02x}{:02x}{:02x}",
                byte(self.r),
                byte(self.g),
                byte(self.b),
                byte(self.a)
            )
        }
    }

    /// Parses `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
            return Err(VizError::msg(format!("malformed colour `{hex}`")));
        }

        let channel = |index: usize| -> Result<f32> {
            u8::from_str_radix(&digits[index..index + 2], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| VizError::msg(format!("malformed colour `{hex}`")))
        };

        let alpha = if digits.len() == 8 { channel(6)? } else { 1.0 };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, alpha))
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Converts hue (degrees, wrapped modulo 360), saturation and value to RGB.
pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> Rgba {
    let hue = hue.rem_euclid(360.0);
    let saturation = saturation.clamp(0.0, 1.0);
    let value = value.clamp(0.0, 1.0);

    let c = value * saturation;
    let x = c * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
    let m = value - c;

    let (r, g, b) = match (hue / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Rgba::rgb(r + m, g + m, b + m)
}

/// Ordered colour stops sampled with linear interpolation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    stops: Vec<Rgba>,
}

impl Palette {
    pub fn new(stops: Vec<Rgba>) -> Self {
        Self { stops }
    }

    /// Warm palette used by fire-like effects.
    pub fn ember() -> Self {
        Self::new(vec![
            Rgba::rgb(0.05, 0.0, 0.1),
            Rgba::rgb(0.6, 0.05, 0.1),
            Rgba::rgb(1.0, 0.5, 0.0),
            Rgba::rgb(1.0, 0.95, 0.6),
        ])
    }

    /// Cool palette used by water-like effects.
    pub fn ocean() -> Self {
        Self::new(vec![
            Rgba::rgb(0.0, 0.05, 0.2),
            Rgba::rgb(0.0, 0.4, 0.7),
            Rgba::rgb(0.3, 0.9, 0.9),
            Rgba::WHITE,
        ])
    }

    /// Samples the palette at `t` in `[0, 1]`. An empty palette yields white.
    pub fn sample(&self, t: f32) -> Rgba {
        match self.stops.len() {
            0 => Rgba::WHITE,
            1 => self.stops[0],
            len => {
                let scaled = t.clamp(0.0, 1.0) * (len - 1) as f32;
                let index = (scaled.floor() as usize).min(len - 2);
                self.stops[index].lerp(self.stops[index + 1], scaled - index as f32)
            }
        }
    }
}
