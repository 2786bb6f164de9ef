//! Capture → classify → annotate → display loop.
//!
//! One iteration completes before the next frame is acquired. The loop only blocks in
//! `FrameSource::read` and `Display::poll_key`; cancellation is checked once per iteration.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::classify::{Classifier, Preprocessor};
use crate::config::AppConfig;
use crate::control::{Action, InteractionController};
use crate::display::Display;
use crate::fps::FrameRateTracker;
use crate::ingest::FrameSource;
use crate::overlay::OverlayRenderer;
use crate::result::ResultMapper;
use crate::screenshot::ScreenshotStore;

/// How long to wait for a key press after each shown frame.
pub const KEY_POLL: Duration = Duration::from_millis(1);
const HEALTH_INTERVAL: Duration = Duration::from_secs(5);

/// Why the loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// Quit key or window closed.
    Quit,
    /// The interrupt flag was raised (Ctrl-C).
    Interrupted,
    /// The source reported no more frames.
    EndOfStream,
    /// The source failed while reading.
    SourceFailed,
    /// The configured frame limit was reached.
    FrameLimit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub screenshots: Vec<PathBuf>,
    pub exit: ExitReason,
    /// Last frame rate shown on screen.
    pub fps: f64,
}

/// Loop knobs that are not part of the file configuration.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Stop after this many frames.
    pub max_frames: Option<u64>,
    /// Raised from outside (signal handler) to stop at the next iteration.
    pub interrupt: Option<Arc<AtomicBool>>,
}

pub struct Pipeline {
    source: Box<dyn FrameSource>,
    classifier: Box<dyn Classifier>,
    display: Box<dyn Display>,
    screenshots: Box<dyn ScreenshotStore>,
    preprocessor: Preprocessor,
    mapper: ResultMapper,
    renderer: OverlayRenderer,
    controller: InteractionController,
    fps: FrameRateTracker,
    mirror: bool,
    options: RunOptions,
    closed: bool,
}

impl Pipeline {
    /// Warm the classifier up, check `config` against what it then declares and open the
    /// source. Nothing is opened when validation fails.
    pub fn new(
        config: &AppConfig,
        mut classifier: Box<dyn Classifier>,
        mut source: Box<dyn FrameSource>,
        display: Box<dyn Display>,
        screenshots: Box<dyn ScreenshotStore>,
        options: RunOptions,
    ) -> Result<Self> {
        let labels = config.label_set()?;
        let table = config.display_table(&labels)?;
        let preprocessor = config.model.preprocessor()?;

        classifier
            .warm_up()
            .with_context(|| format!("classifier '{}' failed to warm up", classifier.name()))?;
        check_compatibility(&preprocessor, labels.len(), classifier.as_ref())?;
        source
            .open()
            .with_context(|| format!("failed to open {}", source.describe()))?;
        log::info!(
            "pipeline ready: source={} classifier={} input={:?} labels={}",
            source.describe(),
            classifier.name(),
            preprocessor.output_shape(),
            labels.len()
        );

        Ok(Self {
            source,
            classifier,
            display,
            screenshots,
            preprocessor,
            mapper: ResultMapper::new(labels.clone(), table.clone()),
            renderer: OverlayRenderer::new(labels, table, config.overlay.clone()),
            controller: InteractionController::new(config.display.show_probabilities),
            fps: FrameRateTracker::new(),
            mirror: config.mirror,
            options,
            closed: false,
        })
    }

    pub fn show_probabilities(&self) -> bool {
        self.controller.show_probabilities()
    }

    /// Run until quit, interrupt or end of stream. Source and display are closed before
    /// this returns, whether or not the loop failed.
    pub fn run(&mut self) -> Result<RunSummary> {
        if self.closed {
            return Err(anyhow!("pipeline already ran"));
        }
        let mut summary = RunSummary {
            frames: 0,
            screenshots: Vec::new(),
            exit: ExitReason::EndOfStream,
            fps: 0.0,
        };
        let outcome = self.run_loop(&mut summary);
        self.shutdown();
        outcome?;
        log::info!(
            "pipeline stopped ({:?}) after {} frames, {} screenshots",
            summary.exit,
            summary.frames,
            summary.screenshots.len()
        );
        Ok(summary)
    }

    fn interrupted(&self) -> bool {
        self.options
            .interrupt
            .as_ref()
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    fn run_loop(&mut self, summary: &mut RunSummary) -> Result<()> {
        let mut last_health = Instant::now();
        loop {
            if self.interrupted() {
                summary.exit = ExitReason::Interrupted;
                return Ok(());
            }
            if let Some(limit) = self.options.max_frames {
                if summary.frames >= limit {
                    summary.exit = ExitReason::FrameLimit;
                    return Ok(());
                }
            }

            let mut frame = match self.source.read() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    log::info!("{}: end of stream", self.source.describe());
                    summary.exit = ExitReason::EndOfStream;
                    return Ok(());
                }
                Err(err) => {
                    log::warn!("{}: read failed: {:#}", self.source.describe(), err);
                    summary.exit = ExitReason::SourceFailed;
                    return Ok(());
                }
            };

            if self.mirror {
                frame.mirror_horizontal();
            }
            let input = self.preprocessor.preprocess(&frame)?;
            let probabilities = self
                .classifier
                .classify(&input)
                .with_context(|| format!("classifier '{}' failed", self.classifier.name()))?;
            let result = self.mapper.map(&probabilities)?;

            self.renderer.render_prediction(&mut frame, &result);
            if self.controller.show_probabilities() {
                self.renderer.render_probabilities(&mut frame, &result);
            }
            summary.fps = self.fps.tick();
            self.renderer.render_fps(&mut frame, summary.fps);
            self.renderer.render_watermark(&mut frame);

            self.display.show(&frame)?;
            summary.frames += 1;

            let key = self.display.poll_key(KEY_POLL)?;
            match self.controller.handle(key) {
                Action::Quit => {
                    summary.exit = ExitReason::Quit;
                    return Ok(());
                }
                Action::Capture { index } => match self.screenshots.save(&frame, index) {
                    Ok(path) => {
                        log::info!("screenshot saved: {}", path.display());
                        summary.screenshots.push(path);
                    }
                    Err(err) => log::error!("screenshot {} failed: {:#}", index, err),
                },
                Action::ToggleProbabilities(_) | Action::Continue => {}
            }

            if last_health.elapsed() >= HEALTH_INTERVAL {
                let stats = self.source.stats();
                log::debug!(
                    "health: frames={} captured={} fps={:.1} last={} ({:.1}%)",
                    summary.frames,
                    stats.frames_captured,
                    summary.fps,
                    result.label,
                    result.confidence
                );
                last_health = Instant::now();
            }
        }
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.source.close();
        self.display.close();
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Startup checks between the configured preprocessing and what the classifier expects.
pub fn check_compatibility(
    preprocessor: &Preprocessor,
    num_labels: usize,
    classifier: &dyn Classifier,
) -> Result<()> {
    let spec = classifier.input_spec();
    if preprocessor.output_shape() != spec.shape() {
        return Err(anyhow!(
            "preprocessor produces {:?} but classifier '{}' expects {:?}",
            preprocessor.output_shape(),
            classifier.name(),
            spec.shape()
        ));
    }
    if preprocessor.channel_order() != spec.channel_order {
        return Err(anyhow!(
            "preprocessor emits {:?} but classifier '{}' expects {:?}",
            preprocessor.channel_order(),
            classifier.name(),
            spec.channel_order
        ));
    }
    if let Some(scaling) = spec.scaling {
        if scaling != preprocessor.scaling() {
            return Err(anyhow!(
                "classifier '{}' expects {:?} input but preprocessing applies {:?}",
                classifier.name(),
                scaling,
                preprocessor.scaling()
            ));
        }
    }
    if let Some(classes) = spec.num_classes {
        if classes != num_labels {
            return Err(anyhow!(
                "classifier '{}' outputs {} classes but {} labels are configured",
                classifier.name(),
                classes,
                num_labels
            ));
        }
    }
    Ok(())
}
