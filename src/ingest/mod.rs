//! Frame sources.
//!
//! - Synthetic frames (`stub://name[?frames=N]`) for tests and demos
//! - A still image replayed as a live feed (`file:///path/to/image.jpg`)
//! - USB/V4L2 cameras (`/dev/videoN` or a bare index `N`, feature: ingest-v4l2)
//!
//! Every source hands out owned `Frame`s, one per `read()` call. `Ok(None)` means the
//! stream ended; the loop treats a camera that stops delivering as disconnected and does
//! not retry.

#[cfg(feature = "ingest-v4l2")]
mod normalize;
pub mod still;
pub mod synthetic;
#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

use anyhow::{anyhow, Result};

use crate::frame::Frame;

pub use still::StillImageSource;
pub use synthetic::SyntheticSource;
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::V4l2Source;

/// Where to capture from and what resolution to ask for.
///
/// `width`/`height` are hints: cameras may deliver a different size, and the actual size
/// is carried on each frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceConfig {
    pub uri: String,
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            uri: "0".to_string(),
            width: 1280,
            height: 720,
            target_fps: 30,
        }
    }
}

/// Statistics for a frame source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub description: String,
}

/// A camera-like producer of frames.
pub trait FrameSource {
    /// Human-readable identity for logs.
    fn describe(&self) -> String;

    fn open(&mut self) -> Result<()>;

    /// Next frame, or `None` at end of stream.
    fn read(&mut self) -> Result<Option<Frame>>;

    fn close(&mut self);

    fn stats(&self) -> SourceStats;
}

/// Kind of source a URI refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Synthetic { name: String, max_frames: Option<u64> },
    Still { path: String },
    Camera { device: String },
}

impl SourceKind {
    pub fn parse(uri: &str) -> Result<Self> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(anyhow!("source uri must not be empty"));
        }
        if let Some(rest) = uri.strip_prefix("stub://") {
            let (name, query) = match rest.split_once('?') {
                Some((name, query)) => (name, Some(query)),
                None => (rest, None),
            };
            let mut max_frames = None;
            for pair in query.unwrap_or_default().split('&').filter(|p| !p.is_empty()) {
                match pair.split_once('=') {
                    Some(("frames", value)) => {
                        let n: u64 = value
                            .parse()
                            .map_err(|_| anyhow!("frames must be an integer, got '{}'", value))?;
                        max_frames = Some(n);
                    }
                    _ => return Err(anyhow!("unknown stub source option '{}'", pair)),
                }
            }
            return Ok(SourceKind::Synthetic {
                name: name.to_string(),
                max_frames,
            });
        }
        if let Some(path) = uri.strip_prefix("file://") {
            if path.is_empty() {
                return Err(anyhow!("file source needs a path"));
            }
            return Ok(SourceKind::Still {
                path: path.to_string(),
            });
        }
        if let Ok(index) = uri.parse::<u32>() {
            return Ok(SourceKind::Camera {
                device: format!("/dev/video{}", index),
            });
        }
        if uri.starts_with('/') && !uri.contains("://") {
            return Ok(SourceKind::Camera {
                device: uri.to_string(),
            });
        }
        Err(anyhow!(
            "unsupported source '{}' (expected stub://, file://, /dev/videoN or a camera index)",
            uri
        ))
    }
}

/// Build the source named by `config.uri`. The source is not opened yet.
pub fn open_source(config: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    match SourceKind::parse(&config.uri)? {
        SourceKind::Synthetic { name, max_frames } => Ok(Box::new(SyntheticSource::new(
            name,
            config.width,
            config.height,
            max_frames,
        ))),
        SourceKind::Still { path } => Ok(Box::new(StillImageSource::new(path))),
        SourceKind::Camera { device } => camera_source(device, config),
    }
}

#[cfg(feature = "ingest-v4l2")]
fn camera_source(device: String, config: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(V4l2Source::new(v4l2::V4l2Config {
        device,
        target_fps: config.target_fps,
        width: config.width,
        height: config.height,
    })))
}

#[cfg(not(feature = "ingest-v4l2"))]
fn camera_source(device: String, _config: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    Err(anyhow!(
        "camera {} requires the ingest-v4l2 feature",
        device
    ))
}

/// Open a source, pull one frame and close it again. True when a frame arrived.
pub fn test_source(config: &SourceConfig) -> bool {
    let mut source = match open_source(config) {
        Ok(source) => source,
        Err(err) => {
            log::debug!("test_source: {}", err);
            return false;
        }
    };
    if let Err(err) = source.open() {
        log::debug!("test_source: {} failed to open: {}", source.describe(), err);
        return false;
    }
    let ok = matches!(source.read(), Ok(Some(_)));
    source.close();
    ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_source_uris() -> Result<()> {
        assert_eq!(
            SourceKind::parse("stub://bench?frames=5")?,
            SourceKind::Synthetic {
                name: "bench".to_string(),
                max_frames: Some(5)
            }
        );
        assert_eq!(
            SourceKind::parse("stub://cam")?,
            SourceKind::Synthetic {
                name: "cam".to_string(),
                max_frames: None
            }
        );
        assert_eq!(
            SourceKind::parse("2")?,
            SourceKind::Camera {
                device: "/dev/video2".to_string()
            }
        );
        assert_eq!(
            SourceKind::parse("/dev/video1")?,
            SourceKind::Camera {
                device: "/dev/video1".to_string()
            }
        );
        assert_eq!(
            SourceKind::parse("file:///tmp/apple.jpg")?,
            SourceKind::Still {
                path: "/tmp/apple.jpg".to_string()
            }
        );
        Ok(())
    }

    #[test]
    fn rejects_unknown_uris() {
        assert!(SourceKind::parse("").is_err());
        assert!(SourceKind::parse("rtsp://camera").is_err());
        assert!(SourceKind::parse("stub://cam?fps=3").is_err());
        assert!(SourceKind::parse("stub://cam?frames=x").is_err());
    }

    #[test]
    fn test_source_reports_working_stub() {
        let config = SourceConfig {
            uri: "stub://probe".to_string(),
            width: 32,
            height: 24,
            target_fps: 10,
        };
        assert!(test_source(&config));

        let empty = SourceConfig {
            uri: "stub://probe?frames=0".to_string(),
            ..config
        };
        assert!(!test_source(&empty));
    }
}
