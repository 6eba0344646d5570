//! Ordered effect-node pipelines.
//!
//! A [`PipelineSpec`] is the declarative form (effect names plus parameters
//! and feature bindings) and is what configuration files contain.
//! [`NodePipeline::build`] turns it into live nodes which then run in order,
//! once per frame, sharing a single [`RenderContext`].

use serde::{Deserialize, Serialize};

use crate::{
    canvas::Canvas,
    mapping::{Binding, FeatureSource, MappingMatrix},
    node::{EffectNode, EffectRegistry, NodeParams, ParamValue, RenderContext},
    AudioFeatures, Result, VizError,
};

/// Declarative description of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub effect: String,
    #[serde(default)]
    pub params: NodeParams,
}

impl NodeSpec {
    pub fn new(effect: impl Into<String>) -> Self {
        Self {
            effect: effect.into(),
            params: NodeParams::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.params.set(key, value);
        self
    }
}

/// Declarative description of a whole node-based visualizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub id: String,
    pub display_name: String,
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

impl PipelineSpec {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            nodes: Vec::new(),
            bindings: Vec::new(),
        }
    }

    pub fn node(mut self, node: NodeSpec) -> Self {
        self.nodes.push(node);
        self
    }

    /// Routes `source` into parameter `param` of the node at index `node`.
    pub fn bind(
        mut self,
        node: usize,
        param: &str,
        source: FeatureSource,
        gain: f32,
        offset: f32,
    ) -> Self {
        self.bindings.push(Binding {
            node,
            param: param.to_string(),
            source,
            gain,
            offset,
        });
        self
    }

    /// Pipelines shipped with the crate.
    pub fn builtin_presets() -> Vec<PipelineSpec> {
        vec![
            PipelineSpec::new("node.particles", "Beat Particles")
                .node(NodeSpec::new("Trails").param("fade", 0.2_f32))
                .node(NodeSpec::new("BeatDetect").param("sensitivity", 1.4_f32))
                .node(
                    NodeSpec::new("ParticleSystem")
                        .param("max_particles", 400)
                        .param("spawn_per_beat", 32)
                        .param("rate", 2.0_f32),
                )
                .node(NodeSpec::new("Glow").param("layers", 5))
                .bind(3, "radius", FeatureSource::Bass, 0.15, 0.1),
            PipelineSpec::new("node.kaleidoscope", "Spectrum Kaleidoscope")
                .node(NodeSpec::new("ClearFrame"))
                .node(
                    NodeSpec::new("Kaleidoscope")
                        .param("segments", 8)
                        .param("points", 48),
                )
                .node(NodeSpec::new("Glow").param("color", "#80c0ff"))
                .bind(1, "speed", FeatureSource::Energy, 1.0, 0.2),
            PipelineSpec::new("node.superscope", "Superscope Spiral")
                .node(NodeSpec::new("Trails").param("fade", 0.1_f32))
                .node(
                    NodeSpec::new("Superscope")
                        .param("shape", "spiral")
                        .param("points", 256),
                )
                .node(
                    NodeSpec::new("Oscilloscope")
                        .param("amplitude", 0.15_f32)
                        .param("color", "#66ccff80"),
                )
                .node(
                    NodeSpec::new("SpectrumBars")
                        .param("bars", 48)
                        .param("gain", 1.5_f32)
                        .param("color", "#ffffff40"),
                ),
        ]
    }
}

/// Live, ordered list of effect nodes.
#[derive(Default)]
pub struct NodePipeline {
    nodes: Vec<Box<dyn EffectNode>>,
    mapping: MappingMatrix,
}

impl NodePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates every node declared in `spec`, failing on the first unknown
    /// effect or out-of-range binding.
    pub fn build(spec: &PipelineSpec, registry: &EffectRegistry) -> Result<Self> {
        let mut nodes = Vec::with_capacity(spec.nodes.len());
        for node_spec in &spec.nodes {
            let mut node = registry.create(&node_spec.effect)?;
            for (key, value) in node_spec.params.iter() {
                node.params_mut().set(key, value.clone());
            }
            nodes.push(node);
        }

        if let Some(binding) = spec.bindings.iter().find(|b| b.node >= nodes.len()) {
            return Err(VizError::invalid_param(
                &binding.param,
                format!(
                    "binding targets node {} but pipeline `{}` has {} nodes",
                    binding.node,
                    spec.id,
                    nodes.len()
                ),
            ));
        }

        tracing::debug!(pipeline = %spec.id, nodes = nodes.len(), "built node pipeline");
        Ok(Self {
            nodes,
            mapping: MappingMatrix::new(spec.bindings.clone()),
        })
    }

    /// Appends a node; used when assembling pipelines in code.
    pub fn push(&mut self, node: Box<dyn EffectNode>) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &dyn EffectNode> {
        self.nodes.iter().map(|node| node.as_ref())
    }

    /// Renders one frame: applies feature bindings, then runs every node in
    /// order. The first failing node aborts the frame.
    pub fn render(
        &mut self,
        features: &AudioFeatures,
        canvas: &mut dyn Canvas,
        width: f32,
        height: f32,
    ) -> Result<()> {
        for update in self.mapping.evaluate(features) {
            if let Some(node) = self.nodes.get_mut(update.node) {
                node.params_mut().set(update.param.as_str(), update.value);
            }
        }

        let mut ctx = RenderContext::new(features, canvas).with_size(width, height);
        for node in &mut self.nodes {
            node.render(&mut ctx)?;
        }
        Ok(())
    }

    /// Resets every node's scratch state.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.reset();
        }
    }
}

impl std::fmt::Debug for NodePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodePipeline")
            .field(
                "nodes",
                &self.nodes.iter().map(|node| node.name()).collect::<Vec<_>>(),
            )
            .field("bindings", &self.mapping.bindings().len())
            .finish()
    }
}
