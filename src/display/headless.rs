use anyhow::Result;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use super::Display;
use crate::control::Key;
use crate::frame::Frame;

/// Frames handed to a recording `HeadlessDisplay`, shared with the caller.
pub type ShownFrames = Rc<RefCell<Vec<Frame>>>;

/// Display without a window.
///
/// Each `poll_key` call pops the next scripted entry; once the script is exhausted no
/// keys are reported.
#[derive(Default)]
pub struct HeadlessDisplay {
    script: VecDeque<Option<Key>>,
    shown: u64,
    recorded: Option<ShownFrames>,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// One entry per loop iteration; `None` means no key that iteration.
    pub fn with_script(script: impl IntoIterator<Item = Option<Key>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Keep a copy of every shown frame and return a handle to them.
    pub fn recording(mut self) -> (Self, ShownFrames) {
        let frames: ShownFrames = Rc::new(RefCell::new(Vec::new()));
        self.recorded = Some(frames.clone());
        (self, frames)
    }

    pub fn frames_shown(&self) -> u64 {
        self.shown
    }
}

impl Display for HeadlessDisplay {
    fn show(&mut self, frame: &Frame) -> Result<()> {
        self.shown += 1;
        log::trace!(
            "HeadlessDisplay: frame #{} ({}x{})",
            frame.sequence(),
            frame.width(),
            frame.height()
        );
        if let Some(recorded) = &self.recorded {
            recorded.borrow_mut().push(frame.clone());
        }
        Ok(())
    }

    fn poll_key(&mut self, _timeout: Duration) -> Result<Option<Key>> {
        Ok(self.script.pop_front().flatten())
    }

    fn close(&mut self) {
        log::debug!("HeadlessDisplay: closed after {} frames", self.shown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ChannelOrder;

    #[test]
    fn replays_script_then_goes_quiet() -> Result<()> {
        let mut display = HeadlessDisplay::with_script([None, Some(Key::Char('p'))]);
        let timeout = Duration::from_millis(1);
        assert_eq!(display.poll_key(timeout)?, None);
        assert_eq!(display.poll_key(timeout)?, Some(Key::Char('p')));
        assert_eq!(display.poll_key(timeout)?, None);
        Ok(())
    }

    #[test]
    fn records_frames() -> Result<()> {
        let (mut display, frames) = HeadlessDisplay::new().recording();
        let frame = Frame::from_raw(1, 1, vec![1, 2, 3], ChannelOrder::Rgb)?;
        display.show(&frame)?;
        assert_eq!(display.frames_shown(), 1);
        assert_eq!(frames.borrow().len(), 1);
        Ok(())
    }
}
