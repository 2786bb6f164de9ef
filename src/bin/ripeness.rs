//! ripeness - live fruit ripeness classifier
//!
//! Captures frames, classifies each one and shows the annotated result. Keys: `q`/ESC quit,
//! `p` toggles the probability breakdown, `s` saves a screenshot.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ripeness_lens::ui::{Ui, UiMode};
use ripeness_lens::{
    open_source, AppConfig, Classifier, DiskScreenshots, Display, HeadlessDisplay, Pipeline,
    RunOptions, StubClassifier,
};

#[derive(Parser, Debug)]
#[command(name = "ripeness", about = "Real-time fruit ripeness classification")]
struct Args {
    /// Config file (TOML or JSON). Falls back to RIPENESS_CONFIG.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Frame source: camera index, /dev/videoN, file:///image.jpg or stub://name[?frames=N]
    #[arg(long)]
    source: Option<String>,

    /// ONNX model (requires the backend-tract feature)
    #[arg(long, value_name = "PATH")]
    model: Option<PathBuf>,

    /// Run without a window
    #[arg(long)]
    headless: bool,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Start with the probability breakdown hidden
    #[arg(long)]
    no_probabilities: bool,

    /// Do not flip frames horizontally
    #[arg(long)]
    no_mirror: bool,

    /// Use a stub classifier that always returns these probabilities (comma separated)
    #[arg(long, value_name = "P1,P2,...", value_delimiter = ',')]
    stub_probs: Option<Vec<f32>>,

    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run(Args::parse()) {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let ui = Ui::detect(UiMode::parse(Some(&args.ui)));

    let config = ui.run_stage("Load configuration", || {
        let mut config = AppConfig::load(args.config.as_deref())?;
        if let Some(source) = args.source.clone() {
            config.source.uri = source;
        }
        if let Some(model) = args.model.clone() {
            config.model.path = Some(model);
        }
        if args.no_probabilities {
            config.display.show_probabilities = false;
        }
        if args.no_mirror {
            config.mirror = false;
        }
        config.validate()?;
        Ok(config)
    })?;

    let classifier = ui.run_stage("Load classifier", || {
        build_classifier(&config, args.stub_probs.clone())
    })?;

    let source = ui.run_stage("Prepare frame source", || open_source(&config.source))?;

    let (display, screenshots) = ui.run_stage("Open display", || {
        let display = build_display(&config, args.headless)?;
        let screenshots =
            DiskScreenshots::new(&config.screenshots.dir, &config.screenshots.extension)?;
        Ok((display, screenshots))
    })?;

    let interrupt = Arc::new(AtomicBool::new(false));
    let handler_flag = interrupt.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .expect("error setting Ctrl-C handler");

    let mut pipeline = ui.run_stage("Start pipeline", || {
        Pipeline::new(
            &config,
            classifier,
            source,
            display,
            Box::new(screenshots),
            RunOptions {
                max_frames: args.max_frames,
                interrupt: Some(interrupt),
            },
        )
    })?;

    ui.controls(!args.headless);
    let summary = pipeline.run()?;
    log::info!(
        "done: {} frames, {} screenshots, last fps {:.1}, exit {:?}",
        summary.frames,
        summary.screenshots.len(),
        summary.fps,
        summary.exit
    );
    Ok(())
}

fn build_classifier(config: &AppConfig, stub_probs: Option<Vec<f32>>) -> Result<Box<dyn Classifier>> {
    let spec = config.model.input_spec();
    if let Some(probs) = stub_probs {
        log::warn!("using stub classifier with fixed probabilities");
        return Ok(Box::new(StubClassifier::fixed(spec, probs)?));
    }
    match config.model.path.as_deref() {
        Some(path) => load_model(path, spec),
        None => {
            log::warn!("no model configured; using cycling stub classifier");
            Ok(Box::new(StubClassifier::cycling(spec, config.labels.len())?))
        }
    }
}

#[cfg(feature = "backend-tract")]
fn load_model(path: &std::path::Path, spec: ripeness_lens::InputSpec) -> Result<Box<dyn Classifier>> {
    let classifier = ripeness_lens::TractClassifier::new(path, spec)
        .with_context(|| format!("failed to load model {}", path.display()))?;
    Ok(Box::new(classifier))
}

#[cfg(not(feature = "backend-tract"))]
fn load_model(path: &std::path::Path, _spec: ripeness_lens::InputSpec) -> Result<Box<dyn Classifier>> {
    Err(anyhow::anyhow!(
        "model {} needs the backend-tract feature",
        path.display()
    ))
    .context("classifier unavailable")
}

#[cfg(feature = "display-window")]
fn build_display(config: &AppConfig, headless: bool) -> Result<Box<dyn Display>> {
    if headless {
        return Ok(Box::new(HeadlessDisplay::new()));
    }
    Ok(Box::new(ripeness_lens::WindowDisplay::new(
        config.display.title.clone(),
    )))
}

#[cfg(not(feature = "display-window"))]
fn build_display(_config: &AppConfig, headless: bool) -> Result<Box<dyn Display>> {
    if !headless {
        log::warn!("built without display-window; running headless");
    }
    Ok(Box::new(HeadlessDisplay::new()))
}
