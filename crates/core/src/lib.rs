//! Core library for the audio-reactive visual plugins.
//!
//! Hosts hand every plugin a per-frame [`AudioFeatures`] snapshot and a
//! [`Canvas`] to draw on. Plugins come in two flavours: standalone
//! visualizers in [`visuals`] and pipelines of small effect nodes assembled
//! from a [`PipelineSpec`]. Both are exposed through the [`Visualizer`]
//! contract and discovered via the [`PluginCatalog`].

pub mod canvas;
pub mod color;
pub mod config;
pub mod error;
pub mod features;
pub mod mapping;
pub mod node;
pub mod pipeline;
pub mod plugin;
pub mod record;
pub mod timeline;
pub mod visuals;

pub use canvas::{Canvas, Point, Rect};
pub use color::{hsv_to_rgb, Palette, Rgba};
pub use config::{AppConfig, RenderConfig, SynthConfig};
pub use error::{Result, VizError};
pub use features::{AudioFeatures, FeatureSynth, SpectrumWatchdog};
pub use mapping::{Binding, FeatureSource, MappingMatrix, ParameterUpdate};
pub use node::{EffectNode, EffectNodeExt, EffectRegistry, NodeParams, ParamValue, RenderContext};
pub use pipeline::{NodePipeline, NodeSpec, PipelineSpec};
pub use plugin::{NodeVisualizer, PluginCatalog, Visualizer};
pub use record::{DrawCommand, FrameRecording, Recorder, RecordingCanvas, RecordingSettings};
pub use timeline::FrameClock;
