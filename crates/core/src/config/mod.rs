use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{pipeline::PipelineSpec, Result};

/// Top-level configuration structure for the headless harness.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub render: RenderConfig,
    pub synth: SynthConfig,
    /// Additional node pipelines declared by the user.
    pub pipelines: Vec<PipelineSpec>,
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(?path, "loading configuration");
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Looks up a user pipeline by id.
    pub fn pipeline(&self, id: &str) -> Option<&PipelineSpec> {
        self.pipelines.iter().find(|spec| spec.id == id)
    }
}

/// Output surface and frame rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 60,
        }
    }
}

/// Settings for the synthetic feature source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub bpm: f32,
    pub spectrum_bins: usize,
    pub waveform_samples: usize,
    pub seed: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            spectrum_bins: 256,
            waveform_samples: 512,
            seed: 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::VizError;

    #[test]
    fn empty_json_uses_defaults() {
        let config = AppConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.render.fps, 60);
    }

    #[test]
    fn parses_partial_sections() {
        let config = AppConfig::from_json_str(
            r##"{
                "render": { "width": 640 },
                "synth": { "bpm": 140.0 },
                "pipelines": [
                    { "id": "mine", "display_name": "Mine",
                      "nodes": [ { "effect": "ClearFrame", "params": { "color": "#102030" } } ] }
                ]
            }"##,
        )
        .unwrap();

        assert_eq!(config.render.width, 640);
        assert_eq!(config.render.height, 720);
        assert_eq!(config.synth.bpm, 140.0);
        let pipeline = config.pipeline("mine").unwrap();
        assert_eq!(pipeline.nodes.len(), 1);
        assert!(config.pipeline("missing").is_none());
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "render": {{ "fps": 30 }}, "synth": {{ "seed": 42 }} }}"#).unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.render.fps, 30);
        assert_eq!(config.render.width, 1280);
        assert_eq!(config.synth.seed, 42);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, VizError::Io(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(AppConfig::from_json_str("{ not json").is_err());
    }
}
