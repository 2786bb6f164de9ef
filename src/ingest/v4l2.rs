//! V4L2 camera source.
//!
//! Opens a local device node (e.g. /dev/video0), asks for the configured resolution and
//! frame rate, and decodes whatever pixel format the driver settles on. Resolution and
//! fps are requests only: the driver's answer wins and is logged.

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;
use std::time::Instant;

use super::normalize::{decode_frame, PixelFormat};
use super::{FrameSource, SourceStats};
use crate::frame::Frame;

/// Configuration for a V4L2 source.
#[derive(Clone, Debug)]
pub struct V4l2Config {
    /// Device path (e.g., "/dev/video0")
    pub device: String,
    /// Requested frame rate. 0 leaves the driver default.
    pub target_fps: u32,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
}

impl Default for V4l2Config {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            target_fps: 30,
            width: 1280,
            height: 720,
        }
    }
}

/// What a probed device reports about itself.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceInfo {
    pub index: usize,
    pub path: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub fps: Option<f64>,
    pub fourcc: String,
}

pub struct V4l2Source {
    config: V4l2Config,
    state: Option<V4l2State>,
    format: PixelFormat,
    frame_count: u64,
    opened_at: Option<Instant>,
    active_width: u32,
    active_height: u32,
}

#[self_referencing]
struct V4l2State {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Source {
    pub fn new(config: V4l2Config) -> Self {
        Self {
            active_width: config.width,
            active_height: config.height,
            config,
            state: None,
            format: PixelFormat::Rgb24,
            frame_count: 0,
            opened_at: None,
        }
    }
}

impl FrameSource for V4l2Source {
    fn describe(&self) -> String {
        format!(
            "{} ({}x{})",
            self.config.device, self.active_width, self.active_height
        )
    }

    fn open(&mut self) -> Result<()> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&self.config.device)
            .with_context(|| format!("open v4l2 device {}", self.config.device))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "V4l2Source: failed to set format on {}: {}",
                    self.config.device,
                    err
                );
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };

        let pixel_format = PixelFormat::from_fourcc(&format.fourcc.repr).ok_or_else(|| {
            anyhow!(
                "{} delivers unsupported pixel format {}",
                self.config.device,
                format.fourcc
            )
        })?;

        if self.config.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(self.config.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!(
                    "V4l2Source: failed to set fps on {}: {}",
                    self.config.device,
                    err
                );
            }
        }

        if format.width != self.config.width || format.height != self.config.height {
            log::info!(
                "V4l2Source: {} asked for {}x{}, driver chose {}x{}",
                self.config.device,
                self.config.width,
                self.config.height,
                format.width,
                format.height
            );
        }
        self.active_width = format.width;
        self.active_height = format.height;
        self.format = pixel_format;

        let state = V4l2StateTryBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;
        self.state = Some(state);
        self.opened_at = Some(Instant::now());

        log::info!(
            "V4l2Source: opened {} ({}x{}, {:?})",
            self.config.device,
            self.active_width,
            self.active_height,
            self.format
        );
        Ok(())
    }

    fn read(&mut self) -> Result<Option<Frame>> {
        use v4l::io::traits::CaptureStream;

        let (width, height, format) = (self.active_width, self.active_height, self.format);
        let state = self.state.as_mut().context("v4l2 device not open")?;
        let frame = state.with_stream_mut(|stream| -> Result<Option<Frame>> {
            let (buf, meta) = match stream.next() {
                Ok(next) => next,
                Err(err) => {
                    log::warn!("V4l2Source: capture failed: {}", err);
                    return Ok(None);
                }
            };
            let used = (meta.bytesused as usize).min(buf.len());
            let used = if used == 0 { buf.len() } else { used };
            decode_frame(&buf[..used], width, height, format).map(Some)
        })?;

        if let Some(frame) = frame {
            self.frame_count += 1;
            Ok(Some(frame.with_sequence(self.frame_count)))
        } else {
            Ok(None)
        }
    }

    fn close(&mut self) {
        if self.state.take().is_some() {
            let uptime = self
                .opened_at
                .map(|at| at.elapsed().as_secs_f64())
                .unwrap_or_default();
            log::info!(
                "V4l2Source: closed {} after {} frames ({:.1}s)",
                self.config.device,
                self.frame_count,
                uptime
            );
        }
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            description: self.describe(),
        }
    }
}

/// Try device indices `0..max` and report the ones that open.
pub fn probe_devices(max: usize) -> Vec<DeviceInfo> {
    (0..max).filter_map(probe_device).collect()
}

fn probe_device(index: usize) -> Option<DeviceInfo> {
    use v4l::video::Capture;

    let device = v4l::Device::new(index).ok()?;
    let name = device
        .query_caps()
        .map(|caps| caps.card)
        .unwrap_or_else(|_| "unknown".to_string());
    let format = device.format().ok()?;
    let fps = device.params().ok().and_then(|params| {
        let interval = params.interval;
        if interval.numerator == 0 {
            None
        } else {
            Some(interval.denominator as f64 / interval.numerator as f64)
        }
    });
    Some(DeviceInfo {
        index,
        path: format!("/dev/video{}", index),
        name,
        width: format.width,
        height: format.height,
        fps,
        fourcc: format.fourcc.to_string(),
    })
}
