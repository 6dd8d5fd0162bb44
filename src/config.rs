use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub public: PublicConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base path every endpoint is appended to (no trailing slash).
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding `session.json` (access token + serialized user).
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PublicConfig {
    /// Password of the read-only public calendar. Not a security boundary,
    /// it only keeps casual visitors out.
    pub lock_password: String,
}

#[derive(Debug, Clone)]
pub struct UiConfig {
    /// Default window (days) of the upcoming events panel.
    pub upcoming_days: u32,
    /// Message language (`es` / `en`).
    pub lang: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let base_url = env::var("API_URL")
            .unwrap_or_else(|_| "http://localhost:3000/api".to_string())
            .trim_end_matches('/')
            .to_string();
        if url::Url::parse(&base_url).is_err() {
            return Err(ConfigError::InvalidValue("API_URL".to_string()));
        }

        let upcoming_days = parse_var("UPCOMING_DAYS", env::var("UPCOMING_DAYS").ok(), 7)?;
        let timeout_seconds = parse_var(
            "HTTP_TIMEOUT_SECONDS",
            env::var("HTTP_TIMEOUT_SECONDS").ok(),
            30,
        )?;

        Ok(Config {
            api: ApiConfig {
                base_url,
                timeout_seconds,
            },
            storage: StorageConfig {
                data_dir: env::var("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(".nodo-calendar")),
            },
            public: PublicConfig {
                lock_password: env::var("LOCK_PASSWORD").unwrap_or_else(|_| "123".to_string()),
            },
            ui: UiConfig {
                upcoming_days,
                lang: env::var("APP_LANG")
                    .map(|l| crate::i18n::normalize_language(&l))
                    .unwrap_or_else(|_| crate::i18n::DEFAULT_LANG.to_string()),
            },
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: ApiConfig {
                base_url: "http://localhost:3000/api".to_string(),
                timeout_seconds: 30,
            },
            storage: StorageConfig {
                data_dir: PathBuf::from(".nodo-calendar"),
            },
            public: PublicConfig {
                lock_password: "123".to_string(),
            },
            ui: UiConfig {
                upcoming_days: 7,
                lang: crate::i18n::DEFAULT_LANG.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_local_backend() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:3000/api");
        assert_eq!(config.public.lock_password, "123");
        assert_eq!(config.ui.upcoming_days, 7);
        assert_eq!(config.ui.lang, "es");
    }

    #[test]
    fn numeric_variables_reject_garbage() {
        assert_eq!(parse_var("HTTP_TIMEOUT_SECONDS", None, 30u64).unwrap(), 30);
        assert_eq!(parse_var("HTTP_TIMEOUT_SECONDS", Some(" 5 ".into()), 30u64).unwrap(), 5);

        let err = parse_var("HTTP_TIMEOUT_SECONDS", Some("abc".into()), 30u64).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref name) if name == "HTTP_TIMEOUT_SECONDS"));
        assert!(parse_var("UPCOMING_DAYS", Some("-7".into()), 7u32).is_err());
    }
}
