#![cfg(feature = "display-window")]

use anyhow::{anyhow, Result};
use minifb::{KeyRepeat, Window, WindowOptions};
use std::time::Duration;

use super::Display;
use crate::control::Key;
use crate::frame::Frame;

/// Desktop window backed by minifb. Created lazily on the first frame so its size
/// matches what the camera actually delivers.
pub struct WindowDisplay {
    title: String,
    window: Option<Window>,
    size: (usize, usize),
    buffer: Vec<u32>,
}

impl WindowDisplay {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            window: None,
            size: (0, 0),
            buffer: Vec::new(),
        }
    }

    fn ensure_window(&mut self, width: usize, height: usize) -> Result<&mut Window> {
        if self.window.is_none() || self.size != (width, height) {
            let window = Window::new(
                &self.title,
                width,
                height,
                WindowOptions {
                    resize: true,
                    ..WindowOptions::default()
                },
            )
            .map_err(|err| anyhow!("failed to open window '{}': {}", self.title, err))?;
            log::info!("WindowDisplay: opened '{}' ({}x{})", self.title, width, height);
            self.window = Some(window);
            self.size = (width, height);
        }
        self.window
            .as_mut()
            .ok_or_else(|| anyhow!("window '{}' unavailable", self.title))
    }
}

fn map_key(key: minifb::Key) -> Key {
    match key {
        minifb::Key::Escape => Key::Escape,
        minifb::Key::Q => Key::Char('q'),
        minifb::Key::P => Key::Char('p'),
        minifb::Key::S => Key::Char('s'),
        _ => Key::Other,
    }
}

impl Display for WindowDisplay {
    fn show(&mut self, frame: &Frame) -> Result<()> {
        let (width, height) = (frame.width() as usize, frame.height() as usize);
        let rgb = frame.to_rgb_image();
        self.buffer.clear();
        self.buffer.extend(
            rgb.pixels()
                .map(|p| (p.0[0] as u32) << 16 | (p.0[1] as u32) << 8 | p.0[2] as u32),
        );
        let mut buffer = std::mem::take(&mut self.buffer);
        let result = self
            .ensure_window(width, height)?
            .update_with_buffer(&buffer, width, height)
            .map_err(|err| anyhow!("failed to present frame: {}", err));
        std::mem::swap(&mut self.buffer, &mut buffer);
        result
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<Key>> {
        let Some(window) = self.window.as_mut() else {
            return Ok(None);
        };
        if !window.is_open() {
            return Ok(Some(Key::WindowClosed));
        }
        std::thread::sleep(timeout);
        window.update();
        if !window.is_open() {
            return Ok(Some(Key::WindowClosed));
        }
        Ok(window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .next()
            .map(map_key))
    }

    fn close(&mut self) {
        if self.window.take().is_some() {
            log::info!("WindowDisplay: closed '{}'", self.title);
        }
    }
}
