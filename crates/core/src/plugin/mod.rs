//! Plugin contract shared by every visualizer, and the catalog the host
//! lists them from.

use crate::{
    canvas::Canvas,
    node::EffectRegistry,
    pipeline::{NodePipeline, PipelineSpec},
    visuals, AudioFeatures, Result, VizError,
};

/// Uniform lifecycle every visualizer implements.
pub trait Visualizer: Send {
    /// Stable identifier used by hosts and the catalog.
    fn id(&self) -> &str;

    /// Human readable name for plugin lists.
    fn display_name(&self) -> &str;

    /// Prepares the plugin for a `width` x `height` surface.
    fn initialize(&mut self, width: u32, height: u32) -> Result<()>;

    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// Draws one frame from `features`.
    fn render_frame(&mut self, features: &AudioFeatures, canvas: &mut dyn Canvas) -> Result<()>;

    /// Releases per-instance state. Nothing to release by default.
    fn dispose(&mut self) {}
}

/// Initialized / not initialized state with the current surface size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Surface {
    size: Option<(u32, u32)>,
}

impl Surface {
    pub fn initialize(&mut self, id: &str, width: u32, height: u32) -> Result<()> {
        validate_size(width, height)?;
        tracing::debug!(plugin = id, width, height, "initializing visualizer");
        self.size = Some((width, height));
        Ok(())
    }

    pub fn resize(&mut self, id: &str, width: u32, height: u32) -> Result<()> {
        if self.size.is_none() {
            return Err(VizError::NotInitialized { id: id.to_string() });
        }
        validate_size(width, height)?;
        tracing::debug!(plugin = id, width, height, "resizing visualizer");
        self.size = Some((width, height));
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.size.is_some()
    }

    /// Current size as floats, or an error when not initialized.
    pub fn dimensions(&self, id: &str) -> Result<(f32, f32)> {
        self.size
            .map(|(w, h)| (w as f32, h as f32))
            .ok_or_else(|| VizError::NotInitialized { id: id.to_string() })
    }

    pub fn dispose(&mut self) {
        self.size = None;
    }
}

fn validate_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        tracing::warn!(width, height, "rejecting empty surface");
        return Err(VizError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Adapts a [`NodePipeline`] to the [`Visualizer`] contract.
#[derive(Debug)]
pub struct NodeVisualizer {
    id: String,
    display_name: String,
    pipeline: NodePipeline,
    surface: Surface,
}

impl NodeVisualizer {
    pub fn new(spec: &PipelineSpec, registry: &EffectRegistry) -> Result<Self> {
        Ok(Self {
            id: spec.id.clone(),
            display_name: spec.display_name.clone(),
            pipeline: NodePipeline::build(spec, registry)?,
            surface: Surface::default(),
        })
    }

    pub fn pipeline(&self) -> &NodePipeline {
        &self.pipeline
    }
}

impl Visualizer for NodeVisualizer {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn initialize(&mut self, width: u32, height: u32) -> Result<()> {
        self.surface.initialize(&self.id, width, height)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.surface.resize(&self.id, width, height)
    }

    fn render_frame(&mut self, features: &AudioFeatures, canvas: &mut dyn Canvas) -> Result<()> {
        let (width, height) = self.surface.dimensions(&self.id)?;
        self.pipeline.render(features, canvas, width, height)
    }

    fn dispose(&mut self) {
        self.pipeline.reset();
        self.surface.dispose();
    }
}

/// Constructor for a standalone visualizer.
pub type VisualizerConstructor = fn() -> Box<dyn Visualizer>;

#[derive(Debug, Clone)]
enum CatalogEntry {
    Standalone {
        id: &'static str,
        display_name: &'static str,
        constructor: VisualizerConstructor,
    },
    Pipeline(PipelineSpec),
}

impl CatalogEntry {
    fn id(&self) -> &str {
        match self {
            CatalogEntry::Standalone { id, .. } => id,
            CatalogEntry::Pipeline(spec) => &spec.id,
        }
    }

    fn display_name(&self) -> &str {
        match self {
            CatalogEntry::Standalone { display_name, .. } => display_name,
            CatalogEntry::Pipeline(spec) => &spec.display_name,
        }
    }
}

/// Every visualizer a host can instantiate, standalone and node-based.
#[derive(Debug, Clone)]
pub struct PluginCatalog {
    registry: EffectRegistry,
    entries: Vec<CatalogEntry>,
}

impl Default for PluginCatalog {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl PluginCatalog {
    /// Catalog without any entries, creating nodes from `registry`.
    pub fn empty(registry: EffectRegistry) -> Self {
        Self {
            registry,
            entries: Vec::new(),
        }
    }

    /// Catalog holding the built-in visualizers and node presets.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::empty(EffectRegistry::with_builtins());
        for (id, display_name, constructor) in visuals::builtins() {
            catalog.register(id, display_name, constructor);
        }
        for spec in PipelineSpec::builtin_presets() {
            catalog.register_pipeline(spec);
        }
        catalog
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    /// Registers a standalone visualizer, replacing any entry with the same id.
    pub fn register(
        &mut self,
        id: &'static str,
        display_name: &'static str,
        constructor: VisualizerConstructor,
    ) {
        self.insert(CatalogEntry::Standalone {
            id,
            display_name,
            constructor,
        });
    }

    /// Registers a node pipeline, replacing any entry with the same id.
    pub fn register_pipeline(&mut self, spec: PipelineSpec) {
        self.insert(CatalogEntry::Pipeline(spec));
    }

    fn insert(&mut self, entry: CatalogEntry) {
        match self.entries.iter_mut().find(|e| e.id() == entry.id()) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// `(id, display_name)` pairs in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|e| (e.id(), e.display_name()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id() == id)
    }

    pub fn create(&self, id: &str) -> Result<Box<dyn Visualizer>> {
        match self.entries.iter().find(|e| e.id() == id) {
            Some(CatalogEntry::Standalone { constructor, .. }) => Ok(constructor()),
            Some(CatalogEntry::Pipeline(spec)) => {
                Ok(Box::new(NodeVisualizer::new(spec, &self.registry)?))
            }
            None => Err(VizError::UnknownPlugin { id: id.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::SynthConfig, features::FeatureSynth, pipeline::NodeSpec,
        record::RecordingCanvas,
    };

    const SIZES: [(u32, u32); 4] = [(1, 1), (64, 48), (640, 360), (1920, 1080)];

    #[test]
    fn every_plugin_renders_silence_at_any_size() {
        let catalog = PluginCatalog::with_builtins();
        let ids: Vec<String> = catalog.entries().map(|(id, _)| id.to_string()).collect();
        assert!(ids.len() >= 11);

        for id in &ids {
            for (width, height) in SIZES {
                let mut plugin = catalog.create(id).unwrap();
                assert_eq!(plugin.id(), id.as_str());
                plugin.initialize(width, height).unwrap();
                let mut canvas = RecordingCanvas::new(width as f32, height as f32);
                for _ in 0..3 {
                    plugin
                        .render_frame(&AudioFeatures::silent(), &mut canvas)
                        .unwrap_or_else(|err| panic!("{id} failed at {width}x{height}: {err}"));
                }
                plugin.dispose();
            }
        }
    }

    #[test]
    fn every_plugin_renders_synthetic_music() {
        let catalog = PluginCatalog::with_builtins();
        for (id, _) in catalog.entries() {
            let mut plugin = catalog.create(id).unwrap();
            plugin.initialize(320, 240).unwrap();
            let mut synth = FeatureSynth::new(SynthConfig::default(), 60);
            let mut canvas = RecordingCanvas::new(320.0, 240.0);
            for _ in 0..90 {
                let features = synth.next_frame();
                plugin.render_frame(&features, &mut canvas).unwrap();
            }
            assert!(!canvas.commands().is_empty(), "{id} drew nothing");
        }
    }

    #[test]
    fn rendering_requires_initialize() {
        let catalog = PluginCatalog::with_builtins();
        for (id, _) in catalog.entries() {
            let mut plugin = catalog.create(id).unwrap();
            let mut canvas = RecordingCanvas::new(10.0, 10.0);
            let err = plugin
                .render_frame(&AudioFeatures::silent(), &mut canvas)
                .err()
                .unwrap();
            assert!(matches!(err, VizError::NotInitialized { .. }), "{id}");
        }
    }

    #[test]
    fn surface_tracks_lifecycle() {
        let mut surface = Surface::default();
        assert!(!surface.is_initialized());
        assert!(surface.resize("bars", 10, 10).is_err());

        surface.initialize("bars", 10, 10).unwrap();
        assert!(surface.is_initialized());
        surface.resize("bars", 30, 20).unwrap();
        assert_eq!(surface.dimensions("bars").unwrap(), (30.0, 20.0));

        surface.dispose();
        assert!(!surface.is_initialized());
        assert!(surface.dimensions("bars").is_err());
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let catalog = PluginCatalog::with_builtins();
        let mut plugin = catalog.create("bars").unwrap();
        assert!(matches!(
            plugin.initialize(0, 100),
            Err(VizError::InvalidDimensions { width: 0, height: 100 })
        ));
        plugin.initialize(10, 10).unwrap();
        assert!(plugin.resize(10, 0).is_err());
        assert!(plugin.resize(20, 20).is_ok());
    }

    #[test]
    fn unknown_plugins_are_errors() {
        let catalog = PluginCatalog::with_builtins();
        let err = catalog.create("nope").err().unwrap();
        assert!(matches!(err, VizError::UnknownPlugin { ref id } if id == "nope"));
    }

    #[test]
    fn pipelines_can_be_registered_and_replaced() {
        let mut catalog = PluginCatalog::with_builtins();
        let before = catalog.entries().count();
        catalog.register_pipeline(
            PipelineSpec::new("custom", "Custom").node(NodeSpec::new("ClearFrame")),
        );
        catalog.register_pipeline(
            PipelineSpec::new("custom", "Custom v2").node(NodeSpec::new("Glow")),
        );
        assert_eq!(catalog.entries().count(), before + 1);
        assert!(catalog.entries().any(|(id, name)| id == "custom" && name == "Custom v2"));

        catalog.register_pipeline(
            PipelineSpec::new("broken", "Broken").node(NodeSpec::new("Missing")),
        );
        assert!(catalog.contains("broken"));
        assert!(matches!(
            catalog.create("broken").err().unwrap(),
            VizError::UnknownEffect { .. }
        ));
    }

    #[test]
    fn node_visualizer_uses_surface_size() {
        let spec = PipelineSpec::new("trails", "Trails").node(NodeSpec::new("Trails"));
        let mut plugin = NodeVisualizer::new(&spec, &EffectRegistry::with_builtins()).unwrap();
        plugin.initialize(200, 100).unwrap();
        let mut canvas = RecordingCanvas::new(50.0, 50.0);
        plugin
            .render_frame(&AudioFeatures::silent(), &mut canvas)
            .unwrap();
        match &canvas.commands()[0] {
            crate::record::DrawCommand::FillRect { rect, .. } => {
                assert_eq!(rect.width, 200.0);
                assert_eq!(rect.height, 100.0);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(plugin.pipeline().len(), 1);
    }
}
