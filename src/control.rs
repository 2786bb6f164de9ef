//! Keyboard interaction state machine.
//!
//! `transition` is a pure function of `(ControlState, Option<Key>)`; the controller only
//! stores the state between loop iterations and logs what changed.

/// Keys the display layer can report. Letters are stored lowercase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    /// The display surface was closed by the user.
    WindowClosed,
    Other,
}

impl Key {
    pub fn from_char(c: char) -> Self {
        Key::Char(c.to_ascii_lowercase())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlState {
    pub show_probabilities: bool,
    pub screenshot_counter: u64,
}

impl ControlState {
    pub fn new(show_probabilities: bool) -> Self {
        Self {
            show_probabilities,
            screenshot_counter: 0,
        }
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new(true)
    }
}

/// What the loop should do after handling input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
    ToggleProbabilities(bool),
    /// Persist the current annotated frame as screenshot number `index`.
    Capture { index: u64 },
}

pub const QUIT_KEY: char = 'q';
pub const TOGGLE_KEY: char = 'p';
pub const CAPTURE_KEY: char = 's';

pub fn transition(state: ControlState, key: Option<Key>) -> (ControlState, Action) {
    match key {
        Some(Key::Escape) | Some(Key::WindowClosed) => (state, Action::Quit),
        Some(Key::Char(c)) => match c.to_ascii_lowercase() {
            QUIT_KEY => (state, Action::Quit),
            TOGGLE_KEY => {
                let show = !state.show_probabilities;
                (
                    ControlState {
                        show_probabilities: show,
                        ..state
                    },
                    Action::ToggleProbabilities(show),
                )
            }
            CAPTURE_KEY => {
                let index = state.screenshot_counter + 1;
                (
                    ControlState {
                        screenshot_counter: index,
                        ..state
                    },
                    Action::Capture { index },
                )
            }
            _ => (state, Action::Continue),
        },
        Some(Key::Other) | None => (state, Action::Continue),
    }
}

#[derive(Debug, Default)]
pub struct InteractionController {
    state: ControlState,
}

impl InteractionController {
    pub fn new(show_probabilities: bool) -> Self {
        Self {
            state: ControlState::new(show_probabilities),
        }
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn show_probabilities(&self) -> bool {
        self.state.show_probabilities
    }

    pub fn handle(&mut self, key: Option<Key>) -> Action {
        let (next, action) = transition(self.state, key);
        self.state = next;
        match action {
            Action::ToggleProbabilities(show) => {
                log::info!("probability breakdown {}", if show { "on" } else { "off" });
            }
            Action::Quit => log::info!("quit requested"),
            Action::Capture { index } => log::debug!("screenshot {} requested", index),
            Action::Continue => {}
        }
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state() {
        let state = ControlState::default();
        assert!(state.show_probabilities);
        assert_eq!(state.screenshot_counter, 0);
    }

    #[test]
    fn quit_aliases() {
        let state = ControlState::default();
        assert_eq!(transition(state, Some(Key::from_char('q'))).1, Action::Quit);
        assert_eq!(transition(state, Some(Key::from_char('Q'))).1, Action::Quit);
        assert_eq!(transition(state, Some(Key::Escape)).1, Action::Quit);
        assert_eq!(transition(state, Some(Key::WindowClosed)).1, Action::Quit);
    }

    #[test]
    fn toggle_only_flips_display_mode() {
        let state = ControlState {
            show_probabilities: true,
            screenshot_counter: 3,
        };
        let (once, action) = transition(state, Some(Key::Char('p')));
        assert_eq!(action, Action::ToggleProbabilities(false));
        assert_eq!(once.screenshot_counter, 3);
        let (twice, _) = transition(once, Some(Key::Char('p')));
        assert_eq!(twice, state);
    }

    #[test]
    fn capture_counts_up_without_touching_mode() {
        let mut controller = InteractionController::new(false);
        assert_eq!(
            controller.handle(Some(Key::Char('s'))),
            Action::Capture { index: 1 }
        );
        assert_eq!(
            controller.handle(Some(Key::Char('s'))),
            Action::Capture { index: 2 }
        );
        assert!(!controller.show_probabilities());
        assert_eq!(controller.state().screenshot_counter, 2);
    }

    #[test]
    fn other_keys_are_no_ops() {
        let state = ControlState::default();
        for key in [None, Some(Key::Other), Some(Key::Char('x')), Some(Key::Char(' '))] {
            assert_eq!(transition(state, key), (state, Action::Continue));
        }
    }
}
