//! Screenshot persistence.

use anyhow::{anyhow, Context, Result};
use image::ImageFormat;
use std::path::{Path, PathBuf};

use crate::frame::Frame;

/// Somewhere annotated frames can be saved on request.
pub trait ScreenshotStore {
    /// Save `frame` as screenshot number `index` and return where it went.
    fn save(&mut self, frame: &Frame, index: u64) -> Result<PathBuf>;
}

/// Writes `screenshot_<index>.<ext>` files into a directory.
#[derive(Clone, Debug)]
pub struct DiskScreenshots {
    dir: PathBuf,
    extension: String,
    format: ImageFormat,
}

impl DiskScreenshots {
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Result<Self> {
        let extension = extension.trim_start_matches('.').to_lowercase();
        let format = match ImageFormat::from_extension(&extension) {
            Some(format @ (ImageFormat::Jpeg | ImageFormat::Png)) => format,
            _ => {
                return Err(anyhow!(
                    "unsupported screenshot extension '{}' (use jpg or png)",
                    extension
                ))
            }
        };
        Ok(Self {
            dir: dir.into(),
            extension,
            format,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, index: u64) -> PathBuf {
        self.dir
            .join(format!("screenshot_{}.{}", index, self.extension))
    }
}

impl ScreenshotStore for DiskScreenshots {
    fn save(&mut self, frame: &Frame, index: u64) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.path_for(index);
        frame
            .to_rgb_image()
            .save_with_format(&path, self.format)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ChannelOrder;

    #[test]
    fn names_files_by_index() -> Result<()> {
        let store = DiskScreenshots::new("shots", ".JPG")?;
        assert_eq!(store.path_for(3), PathBuf::from("shots/screenshot_3.jpg"));
        Ok(())
    }

    #[test]
    fn rejects_unknown_extensions() {
        assert!(DiskScreenshots::new("shots", "gif").is_err());
        assert!(DiskScreenshots::new("shots", "").is_err());
    }

    #[test]
    fn writes_rgb_png() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut store = DiskScreenshots::new(dir.path().join("nested"), "png")?;
        let frame = Frame::from_raw(2, 1, vec![0, 0, 255, 0, 255, 0], ChannelOrder::Bgr)?;
        let path = store.save(&frame, 1)?;
        let saved = image::open(&path)?.to_rgb8();
        assert_eq!(saved.get_pixel(0, 0).0, [255, 0, 0]);
        Ok(())
    }
}
