//! Recording canvas and frame dumps.
//!
//! [`RecordingCanvas`] implements [`Canvas`] by storing every call as a
//! [`DrawCommand`]. The [`Recorder`] streams recorded frames as JSON lines so
//! headless runs can be inspected or replayed by an external renderer.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::{
    canvas::{Canvas, Point, Rect},
    color::Rgba,
    Result,
};

/// One recorded canvas call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear {
        color: Rgba,
    },
    FillRect {
        rect: Rect,
        color: Rgba,
    },
    Line {
        from: Point,
        to: Point,
        color: Rgba,
    },
    Lines {
        points: Vec<Point>,
        color: Rgba,
        closed: bool,
    },
    Circle {
        center: Point,
        radius: f32,
        color: Rgba,
    },
    FillCircle {
        center: Point,
        radius: f32,
        color: Rgba,
    },
    Text {
        text: String,
        at: Point,
        size: f32,
        color: Rgba,
    },
    LineWidth {
        width: f32,
    },
}

/// Canvas that records draw calls instead of rasterizing them.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    width: f32,
    height: f32,
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Removes and returns the commands recorded so far.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Canvas for RecordingCanvas {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn clear(&mut self, color: Rgba) {
        self.commands.push(DrawCommand::Clear { color });
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Rgba) {
        self.commands.push(DrawCommand::Line { from, to, color });
    }

    fn draw_lines(&mut self, points: &[Point], color: Rgba, closed: bool) {
        self.commands.push(DrawCommand::Lines {
            points: points.to_vec(),
            color,
            closed,
        });
    }

    fn draw_circle(&mut self, center: Point, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            color,
        });
    }

    fn draw_text(&mut self, text: &str, at: Point, size: f32, color: Rgba) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            at,
            size,
            color,
        });
    }

    fn set_line_width(&mut self, width: f32) {
        self.commands.push(DrawCommand::LineWidth { width });
    }
}

/// All commands issued while rendering one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecording {
    pub frame: u64,
    pub time_seconds: f64,
    pub commands: Vec<DrawCommand>,
}

/// Configuration options for the recording subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSettings {
    pub plugin: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Streams recorded frames to a writer as JSON lines. The first line is the
/// [`RecordingSettings`] header.
#[derive(Debug)]
pub struct Recorder<W: Write> {
    writer: W,
    settings: RecordingSettings,
    frames_written: u64,
    header_written: bool,
}

impl<W: Write> Recorder<W> {
    pub fn new(writer: W, settings: RecordingSettings) -> Self {
        Self {
            writer,
            settings,
            frames_written: 0,
            header_written: false,
        }
    }

    pub fn settings(&self) -> &RecordingSettings {
        &self.settings
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn write_frame(&mut self, frame: &FrameRecording) -> Result<()> {
        if !self.header_written {
            serde_json::to_writer(&mut self.writer, &self.settings)?;
            self.writer.write_all(b"\n")?;
            self.header_written = true;
        }
        serde_json::to_writer(&mut self.writer, frame)?;
        self.writer.write_all(b"\n")?;
        self.frames_written += 1;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        tracing::debug!(frames = self.frames_written, "recording finished");
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_calls_in_order() {
        let mut canvas = RecordingCanvas::new(10.0, 10.0);
        canvas.clear(Rgba::BLACK);
        canvas.set_line_width(2.0);
        canvas.draw_line(Point::new(0.0, 0.0), Point::new(1.0, 1.0), Rgba::WHITE);
        canvas.draw_text("hi", Point::new(1.0, 1.0), 12.0, Rgba::WHITE);

        let commands = canvas.take_commands();
        assert_eq!(commands.len(), 4);
        assert_eq!(commands[0], DrawCommand::Clear { color: Rgba::BLACK });
        assert_eq!(commands[1], DrawCommand::LineWidth { width: 2.0 });
        assert!(canvas.commands().is_empty());
    }

    #[test]
    fn writes_header_then_frames() {
        let settings = RecordingSettings {
            plugin: "bars".to_string(),
            width: 10,
            height: 10,
            fps: 30,
        };
        let mut recorder = Recorder::new(Vec::new(), settings);
        for frame in 0..2 {
            recorder
                .write_frame(&FrameRecording {
                    frame,
                    time_seconds: frame as f64 / 30.0,
                    commands: vec![DrawCommand::Clear { color: Rgba::BLACK }],
                })
                .unwrap();
        }
        assert_eq!(recorder.frames_written(), 2);

        let bytes = recorder.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("\"plugin\":\"bars\""));
        assert!(lines[1].contains("\"op\":\"clear\""));

        let parsed: FrameRecording = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(parsed.frame, 1);
    }
}
