use std::time::Duration;

use thiserror::Error;

use crate::session::SessionCookie;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Capture configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Browser
    pub chrome_path: Option<String>,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    // Capture
    pub capture_timeout: Duration,

    // Authorization cookies (all three or none)
    pub auth_token: Option<String>,
    pub ct0: Option<String>,
    pub auth_multi: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable holds an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Browser
            chrome_path: optional_env("CHROME_PATH"),
            headless: parse_env_bool("BROWSER_HEADLESS", true)?,
            viewport_width: parse_env_u32("VIEWPORT_WIDTH", 1280)?,
            viewport_height: parse_env_u32("VIEWPORT_HEIGHT", 800)?,

            // Capture
            capture_timeout: Duration::from_secs(parse_env_u64("CAPTURE_TIMEOUT_SECS", 30)?),

            // Authorization cookies
            auth_token: optional_env("X_AUTH_TOKEN"),
            ct0: optional_env("X_CT0"),
            auth_multi: optional_env("X_AUTH_MULTI"),
        })
    }

    /// Load a `.env` file if present, then read the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable holds an unparsable value.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_env()
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "CAPTURE_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(ConfigError::InvalidValue {
                name: "VIEWPORT_WIDTH/VIEWPORT_HEIGHT".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        let set = [&self.auth_token, &self.ct0, &self.auth_multi]
            .iter()
            .filter(|v| v.is_some())
            .count();
        if set != 0 && set != 3 {
            return Err(ConfigError::InvalidValue {
                name: "X_AUTH_TOKEN/X_CT0/X_AUTH_MULTI".to_string(),
                message: "set all three for authenticated capture, or none for guest".to_string(),
            });
        }
        Ok(())
    }

    /// Whether authorization cookies are configured.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some() && self.ct0.is_some() && self.auth_multi.is_some()
    }

    /// Authorization cookies for the session, empty for guest capture.
    #[must_use]
    pub fn auth_cookies(&self) -> Vec<SessionCookie> {
        match (&self.auth_token, &self.ct0, &self.auth_multi) {
            (Some(auth_token), Some(ct0), Some(auth_multi)) => {
                SessionCookie::x_auth(auth_token, ct0, auth_multi)
            }
            _ => Vec::new(),
        }
    }

    /// Defaults suitable for tests: headless guest capture.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            capture_timeout: Duration::from_secs(5),
            auth_token: None,
            ct0: None,
            auth_multi: None,
        }
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_env_bool("NONEXISTENT_VAR", true).unwrap());
        assert!(!parse_env_bool("NONEXISTENT_VAR", false).unwrap());
    }

    #[test]
    fn test_guest_config_has_no_cookies() {
        let config = Config::for_testing();
        assert!(config.validate().is_ok());
        assert!(!config.is_authenticated());
        assert!(config.auth_cookies().is_empty());
    }

    #[test]
    fn test_authenticated_config_yields_three_cookies() {
        let config = Config {
            auth_token: Some("tok".to_string()),
            ct0: Some("csrf".to_string()),
            auth_multi: Some("multi".to_string()),
            ..Config::for_testing()
        };
        assert!(config.validate().is_ok());
        assert!(config.is_authenticated());
        assert_eq!(config.auth_cookies().len(), 3);
    }

    #[test]
    fn test_partial_auth_is_invalid() {
        let config = Config {
            auth_token: Some("tok".to_string()),
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());
        assert!(config.auth_cookies().is_empty());
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let config = Config {
            capture_timeout: Duration::ZERO,
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());
    }
}
