use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub store_api_url: String,
    pub store_session_token: Option<String>,
    pub report_timeout_ms: u64,
    pub update_interval_secs: u64,
    pub tz_offset_hours: i32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let store_api_url = env_map
            .get("STORE_API_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("STORE_API_URL".to_string()))?;

        let store_session_token = env_map
            .get("STORE_SESSION_TOKEN")
            .cloned()
            .filter(|s| !s.is_empty());

        let report_timeout_ms = env_map
            .get("REPORT_TIMEOUT_MS")
            .map(|s| s.as_str())
            .unwrap_or("10000")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "REPORT_TIMEOUT_MS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        let update_interval_secs = env_map
            .get("UPDATE_INTERVAL_SECS")
            .map(|s| s.as_str())
            .unwrap_or("300")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "UPDATE_INTERVAL_SECS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        // Store-local calendar offset from UTC. Defaults to BRT.
        let tz_offset_hours = env_map
            .get("TZ_OFFSET_HOURS")
            .map(|s| s.as_str())
            .unwrap_or("-3")
            .parse::<i32>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "TZ_OFFSET_HOURS".to_string(),
                    "must be a valid i32".to_string(),
                )
            })?;
        if !(-12..=14).contains(&tz_offset_hours) {
            return Err(ConfigError::InvalidValue(
                "TZ_OFFSET_HOURS".to_string(),
                "must be between -12 and 14".to_string(),
            ));
        }

        Ok(Config {
            port,
            store_api_url,
            store_session_token,
            report_timeout_ms,
            update_interval_secs,
            tz_offset_hours,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(
            "STORE_API_URL".to_string(),
            "https://store.example.com/api".to_string(),
        );
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.report_timeout_ms, 10000);
        assert_eq!(config.update_interval_secs, 300);
        assert_eq!(config.tz_offset_hours, -3);
        assert!(config.store_session_token.is_none());
    }

    #[test]
    fn test_missing_store_api_url() {
        let result = Config::from_env_map(HashMap::new());
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "STORE_API_URL"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_tz_offset() {
        let mut env_map = setup_required_env();
        env_map.insert("TZ_OFFSET_HOURS".to_string(), "99".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "TZ_OFFSET_HOURS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_empty_session_token_is_none() {
        let mut env_map = setup_required_env();
        env_map.insert("STORE_SESSION_TOKEN".to_string(), "".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert!(config.store_session_token.is_none());
    }

    #[test]
    fn test_explicit_values() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "9090".to_string());
        env_map.insert("STORE_SESSION_TOKEN".to_string(), "tok-1".to_string());
        env_map.insert("REPORT_TIMEOUT_MS".to_string(), "2500".to_string());
        env_map.insert("UPDATE_INTERVAL_SECS".to_string(), "60".to_string());
        env_map.insert("TZ_OFFSET_HOURS".to_string(), "0".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.store_session_token.as_deref(), Some("tok-1"));
        assert_eq!(config.report_timeout_ms, 2500);
        assert_eq!(config.update_interval_secs, 60);
        assert_eq!(config.tz_offset_hours, 0);
    }
}
