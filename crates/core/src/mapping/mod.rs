use serde::{Deserialize, Serialize};

use crate::AudioFeatures;

/// Audio feature that can drive a node parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSource {
    Bass,
    Mid,
    Treble,
    Volume,
    Energy,
    Rms,
    /// 1.0 on beat frames, 0.0 otherwise.
    Beat,
    Bpm,
}

impl FeatureSource {
    pub fn read(self, features: &AudioFeatures) -> f32 {
        match self {
            FeatureSource::Bass => features.bass,
            FeatureSource::Mid => features.mid,
            FeatureSource::Treble => features.treble,
            FeatureSource::Volume => features.volume,
            FeatureSource::Energy => features.energy,
            FeatureSource::Rms => features.rms,
            FeatureSource::Beat => {
                if features.beat {
                    1.0
                } else {
                    0.0
                }
            }
            FeatureSource::Bpm => features.bpm,
        }
    }
}

/// Describes how a feature should be routed to a node parameter:
/// `value = offset + gain * feature`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    /// Index of the target node in its pipeline.
    pub node: usize,
    pub param: String,
    pub source: FeatureSource,
    #[serde(default = "unit_gain")]
    pub gain: f32,
    #[serde(default)]
    pub offset: f32,
}

fn unit_gain() -> f32 {
    1.0
}

/// Runtime mapping matrix populated with [`ParameterUpdate`] values after each
/// feature frame is evaluated.
#[derive(Debug, Default, Clone)]
pub struct MappingMatrix {
    bindings: Vec<Binding>,
    updates: Vec<ParameterUpdate>,
}

impl MappingMatrix {
    pub fn new(bindings: Vec<Binding>) -> Self {
        Self {
            bindings,
            updates: Vec::new(),
        }
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn evaluate(&mut self, features: &AudioFeatures) -> &[ParameterUpdate] {
        self.updates.clear();
        self.updates
            .extend(self.bindings.iter().map(|binding| ParameterUpdate {
                node: binding.node,
                param: binding.param.clone(),
                value: binding.offset + binding.gain * binding.source.read(features),
            }));
        &self.updates
    }
}

/// Concrete value routed to a node parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterUpdate {
    pub node: usize,
    pub param: String,
    pub value: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_gain_and_offset() {
        let mut matrix = MappingMatrix::new(vec![
            Binding {
                node: 0,
                param: "fade".to_string(),
                source: FeatureSource::Bass,
                gain: 0.5,
                offset: 0.1,
            },
            Binding {
                node: 2,
                param: "radius".to_string(),
                source: FeatureSource::Beat,
                gain: 0.2,
                offset: 0.0,
            },
        ]);

        let features = AudioFeatures {
            bass: 0.8,
            beat: true,
            ..AudioFeatures::silent()
        };
        let updates = matrix.evaluate(&features).to_vec();
        assert_eq!(updates.len(), 2);
        assert!((updates[0].value - 0.5).abs() < 1e-6);
        assert_eq!(updates[1].node, 2);
        assert!((updates[1].value - 0.2).abs() < 1e-6);
    }

    #[test]
    fn binding_defaults_from_json() {
        let binding: Binding =
            serde_json::from_str(r#"{ "node": 1, "param": "gain", "source": "treble" }"#).unwrap();
        assert_eq!(binding.gain, 1.0);
        assert_eq!(binding.offset, 0.0);
        assert_eq!(binding.source, FeatureSource::Treble);
    }
}
