// LanPong configuration types
// Every setting has a default; board geometry is deliberately absent (see game::state::Board)

use crossterm::event::KeyCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Shortest poll interval accepted from the config file. Zero would spin.
pub const MIN_POLL_MS: u64 = 10;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub keybindings: KeyBindings,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Raise poll intervals below `MIN_POLL_MS` to the minimum.
    ///
    /// Returns the names of the settings that were changed.
    pub fn clamp_poll_intervals(&mut self) -> Vec<&'static str> {
        let mut clamped = Vec::new();
        if self.timing.input_poll_ms < MIN_POLL_MS {
            self.timing.input_poll_ms = MIN_POLL_MS;
            clamped.push("timing.input_poll_ms");
        }
        if self.network.receive_poll_ms < MIN_POLL_MS {
            self.network.receive_poll_ms = MIN_POLL_MS;
            clamped.push("network.receive_poll_ms");
        }
        clamped
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeyBindings {
    // Local paddle controls (two bindings each so WASD and arrows both work)
    pub paddle_up: String,
    pub paddle_up_alt: String,
    pub paddle_down: String,
    pub paddle_down_alt: String,

    // Leave the match without waiting for the round limit
    pub quit: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            paddle_up: "W".to_string(),
            paddle_up_alt: "Up".to_string(),
            paddle_down: "S".to_string(),
            paddle_down_alt: "Down".to_string(),
            quit: "Q".to_string(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown key binding: {0:?}")]
pub struct ParseKeyError(pub String);

/// Parse a key binding string into a crossterm key code.
///
/// Single characters are matched case-insensitively and normalised to lowercase.
pub fn parse_key(binding: &str) -> Result<KeyCode, ParseKeyError> {
    let trimmed = binding.trim();
    let mut chars = trimmed.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(c.to_ascii_lowercase()));
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "up" => Ok(KeyCode::Up),
        "down" => Ok(KeyCode::Down),
        "left" => Ok(KeyCode::Left),
        "right" => Ok(KeyCode::Right),
        "enter" => Ok(KeyCode::Enter),
        "esc" | "escape" => Ok(KeyCode::Esc),
        "space" => Ok(KeyCode::Char(' ')),
        _ => Err(ParseKeyError(binding.to_string())),
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    // Delay between keyboard polls; also caps how fast a paddle can move
    pub input_poll_ms: u64,

    // How long the final score stays up before the session shuts down
    pub grace_period_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            input_poll_ms: 200,
            grace_period_secs: 5,
        }
    }
}

impl TimingConfig {
    pub fn input_poll(&self) -> Duration {
        Duration::from_millis(self.input_poll_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    // Challenger: how long to wait for "Start" before re-sending "Join"
    pub handshake_timeout_ms: u64,

    // Challenger: total "Join" attempts before giving up
    pub handshake_attempts: u32,

    // Host: how long to wait for a challenger
    pub host_wait_secs: u64,

    // Remote input receive timeout; bounds shutdown latency of the receiver
    pub receive_poll_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            handshake_timeout_ms: 1000,
            handshake_attempts: 10,
            host_wait_secs: 300,
            receive_poll_ms: 100,
        }
    }
}

impl NetworkConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn host_wait(&self) -> Duration {
        Duration::from_secs(self.host_wait_secs)
    }

    pub fn receive_poll(&self) -> Duration {
        Duration::from_millis(self.receive_poll_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    // RGB values 0-255
    pub ball_color: [u8; 3],
    pub paddle_color: [u8; 3],
    pub score_color: [u8; 3],
    pub center_line_color: [u8; 3],
    pub border_color: [u8; 3],
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            ball_color: [255, 255, 255],
            paddle_color: [255, 255, 255],
            score_color: [255, 255, 255],
            center_line_color: [100, 100, 100],
            border_color: [180, 180, 180],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_characters_are_case_insensitive() {
        assert_eq!(parse_key("W"), Ok(KeyCode::Char('w')));
        assert_eq!(parse_key("s"), Ok(KeyCode::Char('s')));
    }

    #[test]
    fn test_parse_key_named_keys() {
        assert_eq!(parse_key("Up"), Ok(KeyCode::Up));
        assert_eq!(parse_key("down"), Ok(KeyCode::Down));
        assert_eq!(parse_key("Esc"), Ok(KeyCode::Esc));
        assert_eq!(parse_key("Space"), Ok(KeyCode::Char(' ')));
    }

    #[test]
    fn test_parse_key_rejects_unknown_names() {
        assert_eq!(
            parse_key("PageUp"),
            Err(ParseKeyError("PageUp".to_string()))
        );
        assert!(parse_key("").is_err());
    }

    #[test]
    fn test_default_timings_match_classic_feel() {
        let timing = TimingConfig::default();
        assert_eq!(timing.input_poll(), Duration::from_millis(200));
        assert_eq!(timing.grace_period(), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_poll_intervals_are_raised() {
        let mut config = Config::default();
        config.timing.input_poll_ms = 0;
        config.network.receive_poll_ms = 0;

        let clamped = config.clamp_poll_intervals();

        assert_eq!(clamped, vec!["timing.input_poll_ms", "network.receive_poll_ms"]);
        assert_eq!(config.network.receive_poll(), Duration::from_millis(MIN_POLL_MS));
        assert_eq!(config.timing.input_poll(), Duration::from_millis(MIN_POLL_MS));
    }

    #[test]
    fn test_default_poll_intervals_are_kept() {
        let mut config = Config::default();
        assert!(config.clamp_poll_intervals().is_empty());
        assert_eq!(config.network.receive_poll_ms, 100);
    }
}
