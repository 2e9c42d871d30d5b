// Configuration file loading and creation

use super::types::{Config, MIN_POLL_MS};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Get the path to the configuration file
pub fn get_config_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("lanpong");

    // Create config directory if it doesn't exist
    fs::create_dir_all(&path).ok();

    path.push("config.toml");
    path
}

/// Load configuration from file, or create default if it doesn't exist
pub fn load_config() -> Result<Config, io::Error> {
    load_config_from(&get_config_path())
}

/// Load configuration from an explicit path.
///
/// A missing file is created with defaults; a malformed one is reported and replaced
/// by defaults in memory (the file on disk is left alone so the user can fix it).
pub fn load_config_from(config_path: &Path) -> Result<Config, io::Error> {
    if !config_path.exists() {
        create_default_config(config_path)?;
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(config_path)?;
    match parse_config(&contents) {
        Ok(mut config) => {
            info!(path = %config_path.display(), "loaded configuration");
            for setting in config.clamp_poll_intervals() {
                warn!(setting, min_ms = MIN_POLL_MS, "poll interval too short, raised");
                eprintln!("Warning: {} below {}ms, using {}ms", setting, MIN_POLL_MS, MIN_POLL_MS);
            }
            Ok(config)
        }
        Err(e) => {
            warn!(path = %config_path.display(), error = %e, "config parse failed, using defaults");
            eprintln!("Warning: Failed to parse config file: {}", e);
            eprintln!("Using default configuration");
            Ok(Config::default())
        }
    }
}

pub fn parse_config(contents: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(contents)
}

/// Create a default configuration file with helpful comments
pub fn create_default_config(path: &Path) -> Result<(), io::Error> {
    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let commented_toml = format!(
        "# LanPong Configuration File\n\
         # Edit this file to customize game behavior\n\
         # After editing, restart the game for changes to take effect\n\
         #\n\
         # Key binding format: Use \"Up\", \"Down\", \"Left\", \"Right\", \"Enter\", \"Esc\", \"Space\"\n\
         #                     or single characters like \"W\", \"S\", \"Q\", etc.\n\
         #\n\
         # Colors: RGB values from 0-255\n\
         #\n\
         # The board size is fixed so both players simulate the same field.\n\n\
         {}",
        toml_string
    );

    fs::write(path, commented_toml)?;
    println!("Created default config file at: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serialization() {
        let config = Config::default();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        let parsed = parse_config(&toml_string).unwrap();

        assert_eq!(parsed.timing.input_poll_ms, config.timing.input_poll_ms);
        assert_eq!(
            parsed.network.handshake_attempts,
            config.network.handshake_attempts
        );
        assert_eq!(parsed.keybindings.paddle_up, config.keybindings.paddle_up);
        assert_eq!(parsed.display.ball_color, config.display.ball_color);
    }

    #[test]
    fn test_partial_config_with_defaults() {
        let partial_toml = r#"
            [timing]
            input_poll_ms = 50

            [keybindings]
            quit = "Esc"
        "#;

        let config = parse_config(partial_toml).unwrap();

        // Custom values
        assert_eq!(config.timing.input_poll_ms, 50);
        assert_eq!(config.keybindings.quit, "Esc");

        // Untouched fields in the same sections keep their defaults
        assert_eq!(config.timing.grace_period_secs, 5);
        assert_eq!(config.keybindings.paddle_up, "W");
        assert_eq!(config.network.receive_poll_ms, 100);
    }

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = std::env::temp_dir().join(format!("lanpong-cfg-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let _ = fs::remove_file(&path);

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.timing.grace_period_secs, 5);
        assert!(path.exists());

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# LanPong Configuration File"));
        assert!(parse_config(&written).is_ok());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join(format!("lanpong-bad-cfg-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[timing\ninput_poll_ms = ").unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.timing.input_poll_ms, 200);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_zero_receive_poll_is_raised_on_load() {
        let dir = std::env::temp_dir().join(format!("lanpong-zero-poll-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[network]\nreceive_poll_ms = 0\n").unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.network.receive_poll_ms, MIN_POLL_MS);
        assert_eq!(config.timing.input_poll_ms, 200);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_retired_countdown_setting_is_ignored() {
        let config = parse_config("[timing]\ncountdown_secs = 2\n").unwrap();
        assert_eq!(config.timing.input_poll_ms, 200);
    }
}
