use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::io;
use std::time::Duration;

use crate::config::{parse_key, KeyBindings, ParseKeyError};

/// What the local player asked for during one poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyIntent {
    Up,
    Down,
    Quit,
}

/// Non-blocking source of local paddle intents.
///
/// Implementations must return immediately; pacing is the caller's job.
pub trait InputSource: Send {
    fn poll(&mut self) -> io::Result<Option<KeyIntent>>;
}

/// Key codes resolved once from the configured bindings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyMap {
    up: [KeyCode; 2],
    down: [KeyCode; 2],
    quit: KeyCode,
}

impl KeyMap {
    pub fn from_bindings(bindings: &KeyBindings) -> Result<Self, ParseKeyError> {
        Ok(Self {
            up: [
                parse_key(&bindings.paddle_up)?,
                parse_key(&bindings.paddle_up_alt)?,
            ],
            down: [
                parse_key(&bindings.paddle_down)?,
                parse_key(&bindings.paddle_down_alt)?,
            ],
            quit: parse_key(&bindings.quit)?,
        })
    }

    pub fn intent_for(&self, code: KeyCode) -> Option<KeyIntent> {
        let code = match code {
            KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
            other => other,
        };
        if self.quit == code {
            Some(KeyIntent::Quit)
        } else if self.up.contains(&code) {
            Some(KeyIntent::Up)
        } else if self.down.contains(&code) {
            Some(KeyIntent::Down)
        } else {
            None
        }
    }
}

/// Terminal keyboard via crossterm.
pub struct KeyboardInput {
    keys: KeyMap,
}

impl KeyboardInput {
    pub fn new(keys: KeyMap) -> Self {
        Self { keys }
    }
}

impl InputSource for KeyboardInput {
    /// Drain every pending key event and keep the last recognised one.
    ///
    /// Draining flushes keys mashed between polls, so holding a key moves the paddle
    /// once per poll instead of queueing a burst. Quit wins over any movement.
    fn poll(&mut self) -> io::Result<Option<KeyIntent>> {
        let mut intent = None;

        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match self.keys.intent_for(key.code) {
                    Some(KeyIntent::Quit) => return Ok(Some(KeyIntent::Quit)),
                    Some(other) => intent = Some(other),
                    None => {}
                }
            }
        }

        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings_cover_wasd_and_arrows() {
        let keys = KeyMap::from_bindings(&KeyBindings::default()).unwrap();

        assert_eq!(keys.intent_for(KeyCode::Char('w')), Some(KeyIntent::Up));
        assert_eq!(keys.intent_for(KeyCode::Char('W')), Some(KeyIntent::Up));
        assert_eq!(keys.intent_for(KeyCode::Up), Some(KeyIntent::Up));
        assert_eq!(keys.intent_for(KeyCode::Char('s')), Some(KeyIntent::Down));
        assert_eq!(keys.intent_for(KeyCode::Down), Some(KeyIntent::Down));
        assert_eq!(keys.intent_for(KeyCode::Char('q')), Some(KeyIntent::Quit));
        assert_eq!(keys.intent_for(KeyCode::Char('x')), None);
    }

    #[test]
    fn test_invalid_binding_is_reported() {
        let bindings = KeyBindings {
            paddle_up: "Hyper".to_string(),
            ..KeyBindings::default()
        };
        assert!(KeyMap::from_bindings(&bindings).is_err());
    }
}
