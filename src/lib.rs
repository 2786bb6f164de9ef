//! Live fruit ripeness classifier.
//!
//! Frames come from a camera (or a synthetic/still source), get classified by an image
//! classifier into fruit × ripeness labels, and are shown with an overlay: predicted label,
//! confidence bar, per-class probability breakdown and frame rate.
//!
//! # Module Structure
//!
//! - `frame`: captured frames and colors
//! - `ingest`: frame sources (synthetic, still image, V4L2)
//! - `classify`: preprocessing, classifier trait and backends (stub, tract ONNX)
//! - `labels` / `result`: label set, display table, probability → result mapping
//! - `overlay`: drawing the result onto frames
//! - `fps`, `control`: frame-rate measurement and key handling
//! - `display`, `screenshot`: output surfaces
//! - `pipeline`: the loop that ties everything together
//! - `config`, `ui`: configuration loading and startup feedback

pub mod classify;
pub mod config;
pub mod control;
pub mod display;
pub mod fps;
pub mod frame;
pub mod ingest;
pub mod labels;
pub mod overlay;
pub mod pipeline;
pub mod result;
pub mod screenshot;
pub mod ui;

pub use classify::{Classifier, InputSpec, InputTensor, Preprocessor, Scaling, StubClassifier, TensorLayout};
#[cfg(feature = "backend-tract")]
pub use classify::TractClassifier;
pub use config::AppConfig;
pub use control::{Action, ControlState, InteractionController, Key};
pub use display::{Display, HeadlessDisplay};
#[cfg(feature = "display-window")]
pub use display::WindowDisplay;
pub use fps::FrameRateTracker;
pub use frame::{ChannelOrder, Color, Frame};
pub use ingest::{open_source, test_source, FrameSource, SourceConfig, SyntheticSource, StillImageSource};
#[cfg(feature = "ingest-v4l2")]
pub use ingest::{v4l2::V4l2Config, V4l2Source};
pub use labels::{DisplayEntry, DisplayTable, LabelSet, StatusCategory};
pub use overlay::{OverlayRenderer, OverlayStyle};
pub use pipeline::{ExitReason, Pipeline, RunOptions, RunSummary};
pub use result::{ClassificationResult, ResultMapper};
pub use screenshot::{DiskScreenshots, ScreenshotStore};
