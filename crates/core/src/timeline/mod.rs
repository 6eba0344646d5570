/// Fixed-rate frame clock used to timestamp rendered frames.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameClock {
    fps: u32,
    frame: u64,
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        Self {
            fps: fps.max(1),
            frame: 0,
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Seconds elapsed at the start of the current frame.
    pub fn time_seconds(&self) -> f64 {
        self.frame as f64 / self.fps as f64
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration(&self) -> f32 {
        1.0 / self.fps as f32
    }

    pub fn reset(&mut self) {
        self.frame = 0;
    }

    pub fn tick(&mut self) {
        self.frame += 1;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_by_whole_frames() {
        let mut clock = FrameClock::new(30);
        for _ in 0..45 {
            clock.tick();
        }
        assert_eq!(clock.frame(), 45);
        assert!((clock.time_seconds() - 1.5).abs() < 1e-9);

        clock.reset();
        assert_eq!(clock.time_seconds(), 0.0);
    }

    #[test]
    fn zero_fps_is_clamped() {
        let clock = FrameClock::new(0);
        assert_eq!(clock.fps(), 1);
    }
}
