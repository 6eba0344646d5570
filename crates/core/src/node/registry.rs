use std::collections::BTreeMap;

use super::{
    BeatDetect, ClearFrame, EffectNode, Glow, Kaleidoscope, Oscilloscope, ParticleSystem,
    SpectrumBars, Superscope, Trails,
};
use crate::{Result, VizError};

/// Constructor producing a freshly configured node.
pub type NodeConstructor = fn() -> Box<dyn EffectNode>;

/// Maps effect names to node constructors.
#[derive(Debug, Clone, Default)]
pub struct EffectRegistry {
    constructors: BTreeMap<String, NodeConstructor>,
}

impl EffectRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in node.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("ClearFrame", || Box::new(ClearFrame::default()));
        registry.register("BeatDetect", || Box::new(BeatDetect::default()));
        registry.register("ParticleSystem", || Box::new(ParticleSystem::default()));
        registry.register("Trails", || Box::new(Trails::default()));
        registry.register("Kaleidoscope", || Box::new(Kaleidoscope::default()));
        registry.register("Glow", || Box::new(Glow::default()));
        registry.register("Superscope", || Box::new(Superscope::default()));
        registry.register("SpectrumBars", || Box::new(SpectrumBars::default()));
        registry.register("Oscilloscope", || Box::new(Oscilloscope::default()));
        registry
    }

    /// Registers (or replaces) the constructor for `name`.
    pub fn register(&mut self, name: impl Into<String>, constructor: NodeConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Creates a node by name. Unknown names are always an error.
    pub fn create(&self, name: &str) -> Result<Box<dyn EffectNode>> {
        match self.constructors.get(name) {
            Some(constructor) => Ok(constructor()),
            None => {
                tracing::warn!(name, "requested unknown effect");
                Err(VizError::UnknownEffect {
                    name: name.to_string(),
                })
            }
        }
    }

    /// Alias of [`EffectRegistry::create`].
    pub fn create_by_name(&self, name: &str) -> Result<Box<dyn EffectNode>> {
        self.create(name)
    }
}
