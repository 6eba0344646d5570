use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use audioviz_core::{
    AppConfig, FeatureSynth, FrameRecording, PluginCatalog, Recorder, RecordingCanvas,
    RecordingSettings, Visualizer, VizError,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> audioviz_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => run_list(),
        Commands::Render {
            plugin,
            frames,
            width,
            height,
            bpm,
            config,
            output,
        } => {
            let mut config = load_config(config.as_ref())?;
            if let Some(width) = width {
                config.render.width = width;
            }
            if let Some(height) = height {
                config.render.height = height;
            }
            if let Some(bpm) = bpm {
                config.synth.bpm = bpm;
            }
            run_render(&config, &plugin, frames, &output)
        }
        Commands::Pipeline {
            config,
            pipeline,
            frames,
            output,
        } => {
            let config = AppConfig::load(&config)?;
            if config.pipeline(&pipeline).is_none() {
                return Err(VizError::UnknownPlugin { id: pipeline });
            }
            run_render(&config, &pipeline, frames, &output)
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> audioviz_core::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::default()),
    }
}

fn catalog_for(config: &AppConfig) -> PluginCatalog {
    let mut catalog = PluginCatalog::with_builtins();
    for spec in &config.pipelines {
        catalog.register_pipeline(spec.clone());
    }
    catalog
}

fn run_list() -> audioviz_core::Result<()> {
    let catalog = PluginCatalog::with_builtins();
    println!("plugins:");
    for (id, name) in catalog.entries() {
        println!("  {id:<20} {name}");
    }
    println!("effect nodes:");
    for name in catalog.registry().names() {
        println!("  {name}");
    }
    Ok(())
}

fn run_render(
    config: &AppConfig,
    plugin_id: &str,
    frames: u64,
    output: &Path,
) -> audioviz_core::Result<()> {
    let render = &config.render;
    tracing::info!(
        plugin = plugin_id,
        frames,
        width = render.width,
        height = render.height,
        ?output,
        "rendering plugin"
    );

    let catalog = catalog_for(config);
    let mut plugin = catalog.create(plugin_id)?;
    plugin.initialize(render.width, render.height)?;

    let mut synth = FeatureSynth::new(config.synth.clone(), render.fps);
    let mut canvas = RecordingCanvas::new(render.width as f32, render.height as f32);
    let settings = RecordingSettings {
        plugin: plugin.id().to_string(),
        width: render.width,
        height: render.height,
        fps: render.fps,
    };
    let mut recorder = Recorder::new(BufWriter::new(File::create(output)?), settings);

    let result = record_frames(plugin.as_mut(), &mut synth, &mut canvas, &mut recorder, frames);
    plugin.dispose();
    result?;

    let written = recorder.frames_written();
    recorder.finish()?;
    tracing::info!(frames = written, "recording complete");
    Ok(())
}

fn record_frames(
    plugin: &mut dyn Visualizer,
    synth: &mut FeatureSynth,
    canvas: &mut RecordingCanvas,
    recorder: &mut Recorder<BufWriter<File>>,
    frames: u64,
) -> audioviz_core::Result<()> {
    for _ in 0..frames {
        let frame = synth.clock().frame();
        let features = synth.next_frame();
        plugin.render_frame(&features, canvas)?;
        recorder.write_frame(&FrameRecording {
            frame,
            time_seconds: features.time_seconds,
            commands: canvas.take_commands(),
        })?;
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless harness for audio-reactive visual plugins", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the available plugins and effect nodes.
    List,
    /// Render a plugin against synthetic audio and record its draw calls.
    Render {
        /// Plugin id, as printed by `list`.
        #[arg(short, long)]
        plugin: String,
        #[arg(short, long, default_value_t = 120)]
        frames: u64,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        /// Tempo of the synthetic feature source.
        #[arg(long)]
        bpm: Option<f32>,
        /// JSON configuration with render, synth and pipeline sections.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Destination for the JSON lines recording.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Render a node pipeline declared in a configuration file.
    Pipeline {
        #[arg(short, long)]
        config: PathBuf,
        /// Id of the pipeline inside the configuration.
        #[arg(short, long)]
        pipeline: String,
        #[arg(short, long, default_value_t = 120)]
        frames: u64,
        #[arg(short, long)]
        output: PathBuf,
    },
}
