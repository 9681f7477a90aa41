//! Application-level configuration loading: server address, phase durations and timer constants.

use std::{env, fs, io::ErrorKind, path::Path, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationSeconds, serde_as};
use tracing::{info, warn};
use validator::{Validate, ValidationError};

use crate::{error::ConfigError, services::round_service::RoundTimings};

/// Default location on disk where the display looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/display.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CUPS_DISPLAY_CONFIG_PATH";
/// Longest accepted timer duration; keeps deadline arithmetic far from `Instant` overflow.
const MAX_TIMER_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(default)]
/// Immutable runtime configuration shared across the application.
///
/// Every key is optional in the JSON file; durations are whole seconds.
pub struct AppConfig {
    /// Websocket URL of the game server.
    #[validate(custom(function = "validate_ws_url"))]
    pub server_url: String,
    /// Port of the HTTP server exposing the display event stream.
    pub http_port: u16,
    /// Seconds the welcome screen stays up before voting opens.
    #[validate(range(min = 1))]
    pub welcome_duration: u32,
    /// Seconds the audience has to vote.
    #[validate(range(min = 1))]
    pub voting_duration: u32,
    /// Seconds the revealed result stays on screen.
    #[validate(range(min = 1))]
    pub result_duration: u32,
    /// Seconds the game-over screen stays up before a new game starts.
    #[validate(range(min = 1))]
    pub game_over_duration: u32,
    /// Delay between closing the vote and requesting the result.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[validate(custom(function = "validate_timer_duration"))]
    pub swap_settle_delay: Duration,
    /// Fixed delay between reconnection attempts.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[validate(custom(function = "validate_timer_duration"))]
    pub reconnect_delay: Duration,
    /// Interval between `get_votes` polls while voting.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[validate(custom(function = "validate_timer_duration"))]
    pub vote_poll_interval: Duration,
    /// Time each winners page stays on screen.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[validate(custom(function = "validate_timer_duration"))]
    pub winners_page_interval: Duration,
    /// Number of winners shown per page.
    #[validate(range(min = 1))]
    pub winners_page_size: usize,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match Self::read(&path) {
            Ok(Some(config)) => {
                info!(
                    path = %path.display(),
                    server_url = %config.server_url,
                    "loaded display config"
                );
                config
            }
            Ok(None) => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "unusable config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Phase durations and timer constants consumed by the round controller.
    pub fn timings(&self) -> RoundTimings {
        RoundTimings {
            welcome_secs: self.welcome_duration,
            voting_secs: self.voting_duration,
            result_secs: self.result_duration,
            game_over_secs: self.game_over_duration,
            swap_settle_delay: self.swap_settle_delay,
            vote_poll_interval: self.vote_poll_interval,
            winners_page_interval: self.winners_page_interval,
            winners_page_size: self.winners_page_size,
        }
    }

    fn read(path: &Path) -> Result<Option<Self>, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).map(Some),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ConfigError::Read(err)),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://localhost:8765".into(),
            http_port: 8080,
            welcome_duration: 10,
            voting_duration: 10,
            result_duration: 10,
            game_over_duration: 10,
            swap_settle_delay: Duration::from_secs(15),
            reconnect_delay: Duration::from_secs(5),
            vote_poll_interval: Duration::from_secs(1),
            winners_page_interval: Duration::from_secs(5),
            winners_page_size: 5,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn validate_ws_url(url: &str) -> Result<(), ValidationError> {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        return Ok(());
    }
    let mut err = ValidationError::new("server_url_scheme");
    err.message = Some(format!("server URL must use ws:// or wss:// (got `{url}`)").into());
    Err(err)
}

fn validate_timer_duration(duration: &Duration) -> Result<(), ValidationError> {
    if duration.is_zero() {
        return Err(ValidationError::new("zero_duration"));
    }
    if *duration > MAX_TIMER_DURATION {
        let mut err = ValidationError::new("duration_too_long");
        err.message = Some(
            format!(
                "duration must not exceed {} seconds",
                MAX_TIMER_DURATION.as_secs()
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_ten_second_phases() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.swap_settle_delay, Duration::from_secs(15));
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
        assert_eq!(config.winners_page_size, 5);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let config = AppConfig::from_json(
            r#"{"server_url": "wss://game.example:8765", "voting_duration": 30, "swap_settle_delay": 4}"#,
        )
        .unwrap();

        assert_eq!(config.server_url, "wss://game.example:8765");
        assert_eq!(config.voting_duration, 30);
        assert_eq!(config.swap_settle_delay, Duration::from_secs(4));
        assert_eq!(config.welcome_duration, 10);
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(matches!(
            AppConfig::from_json(r#"{"winners_page_size": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_json(r#"{"reconnect_delay": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_json(r#"{"server_url": "http://localhost:8765"}"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn oversized_durations_are_rejected() {
        assert!(matches!(
            AppConfig::from_json(r#"{"vote_poll_interval": 18446744073709551615}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_json(r#"{"winners_page_interval": 86401}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(AppConfig::from_json(r#"{"swap_settle_delay": 86400}"#).is_ok());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            AppConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("cups-display-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = scratch_dir("missing");
        assert!(matches!(
            AppConfig::read(&dir.join("absent.json")),
            Ok(None)
        ));
    }

    #[test]
    fn unreadable_path_is_a_read_error() {
        let dir = scratch_dir("unreadable");
        assert!(matches!(AppConfig::read(&dir), Err(ConfigError::Read(_))));
    }

    #[test]
    fn load_falls_back_to_defaults() {
        let dir = scratch_dir("load");
        let invalid = dir.join("invalid.json");
        let valid = dir.join("valid.json");
        fs::write(&invalid, r#"{"winners_page_size": 0}"#).unwrap();
        fs::write(&valid, r#"{"http_port": 9090}"#).unwrap();

        // Only this test touches the override variable.
        let load_from = |path: &Path| {
            unsafe { env::set_var(CONFIG_PATH_ENV, path) };
            AppConfig::load()
        };

        assert_eq!(load_from(&dir.join("absent.json")), AppConfig::default());
        assert_eq!(load_from(&invalid), AppConfig::default());
        assert_eq!(load_from(&dir), AppConfig::default());
        assert_eq!(load_from(&valid).http_port, 9090);

        unsafe { env::remove_var(CONFIG_PATH_ENV) };
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn timings_mirror_config() {
        let config = AppConfig {
            result_duration: 7,
            ..AppConfig::default()
        };
        let timings = config.timings();
        assert_eq!(timings.result_secs, 7);
        assert_eq!(timings.vote_poll_interval, Duration::from_secs(1));
    }
}
