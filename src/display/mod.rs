//! Display surfaces.
//!
//! - `HeadlessDisplay`: no window; logs frames and replays scripted key presses
//! - `WindowDisplay`: a desktop window via minifb (feature: display-window)

mod headless;
#[cfg(feature = "display-window")]
mod window;

use anyhow::Result;
use std::time::Duration;

use crate::control::Key;
use crate::frame::Frame;

pub use headless::{HeadlessDisplay, ShownFrames};
#[cfg(feature = "display-window")]
pub use window::WindowDisplay;

/// Where annotated frames go and where key presses come from.
pub trait Display {
    fn show(&mut self, frame: &Frame) -> Result<()>;

    /// Wait at most `timeout` for a key press.
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<Key>>;

    fn close(&mut self);
}
