//! Runtime configuration read from the environment (optionally seeded by `.env`).

use crate::client::DEFAULT_BASE_URL;
use crate::models::sensibo::PodId;
use chrono_tz::Tz;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{error::Error, fs};

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Los_Angeles;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
/// Prefix marking `SENSIBO_API_KEY` as a path to a mounted secret.
pub const SECRET_FILE_PREFIX: &str = "file:";

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { var: &'static str, message: String },
    SecretFile { path: PathBuf, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "missing required setting {}", var),
            ConfigError::Invalid { var, message } => write!(f, "invalid {}: {}", var, message),
            ConfigError::SecretFile { path, message } => {
                write!(f, "unable to read secret file {}: {}", path.display(), message)
            }
        }
    }
}

impl Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    /// Pod to manage; required when the account has more than one.
    pub pod_id: Option<PodId>,
    pub timezone: Tz,
    pub http_timeout: Duration,
    /// When set, cycles repeat on this cadence instead of running once.
    pub sync_interval: Option<Duration>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("pod_id", &self.pod_id)
            .field("timezone", &self.timezone)
            .field("http_timeout", &self.http_timeout)
            .field("sync_interval", &self.sync_interval)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = match (get("SENSIBO_API_KEY"), get("SENSIBO_API_KEY_FILE")) {
            (Some(v), _) => match v.strip_prefix(SECRET_FILE_PREFIX) {
                Some(path) => read_secret(Path::new(path))?,
                None => v,
            },
            (None, Some(path)) => read_secret(Path::new(&path))?,
            (None, None) => return Err(ConfigError::Missing("SENSIBO_API_KEY")),
        };

        let base_url = get("SENSIBO_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                var: "SENSIBO_BASE_URL",
                message: format!("{} is not an http(s) URL", base_url),
            });
        }

        let timezone = match get("SENSIBO_TIMEZONE") {
            Some(s) => s.parse::<Tz>().map_err(|e| ConfigError::Invalid {
                var: "SENSIBO_TIMEZONE",
                message: e.to_string(),
            })?,
            None => DEFAULT_TIMEZONE,
        };

        let http_timeout_secs = match get("HTTP_TIMEOUT_SECS") {
            Some(s) => parse_positive_secs("HTTP_TIMEOUT_SECS", &s)?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let sync_interval = match get("SYNC_INTERVAL_SECS") {
            Some(s) => Some(Duration::from_secs(parse_positive_secs("SYNC_INTERVAL_SECS", &s)?)),
            None => None,
        };

        Ok(Config {
            api_key,
            base_url,
            pod_id: get("SENSIBO_POD_ID").map(PodId),
            timezone,
            http_timeout: Duration::from_secs(http_timeout_secs),
            sync_interval,
        })
    }
}

fn read_secret(path: &Path) -> Result<String, ConfigError> {
    match fs::read_to_string(path) {
        Ok(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Ok(_) => Err(ConfigError::SecretFile {
            path: path.to_path_buf(),
            message: "file is empty".to_string(),
        }),
        Err(e) => Err(ConfigError::SecretFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}

fn parse_positive_secs(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            var,
            message: "must be greater than zero".to_string(),
        }),
        Ok(v) => Ok(v),
        Err(e) => Err(ConfigError::Invalid {
            var,
            message: format!("{:?}: {}", raw, e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: BTreeMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_with_only_api_key() {
        let cfg = config_from(&[("SENSIBO_API_KEY", "secret")]).expect("valid");
        assert_eq!(cfg.api_key, "secret");
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.timezone, chrono_tz::America::Los_Angeles);
        assert_eq!(cfg.http_timeout, Duration::from_secs(10));
        assert!(cfg.pod_id.is_none());
        assert!(cfg.sync_interval.is_none());
    }

    #[test]
    fn missing_api_key_is_an_error() {
        assert!(matches!(config_from(&[]), Err(ConfigError::Missing("SENSIBO_API_KEY"))));
        assert!(matches!(
            config_from(&[("SENSIBO_API_KEY", "   ")]),
            Err(ConfigError::Missing("SENSIBO_API_KEY"))
        ));
    }

    #[test]
    fn api_key_can_come_from_secret_file() {
        let path = std::env::temp_dir().join(format!("sensibo-scheduler-key-{}", std::process::id()));
        fs::write(&path, "from-file\n").expect("write temp secret");
        let indirect = format!("{}{}", SECRET_FILE_PREFIX, path.display());

        let cfg = config_from(&[("SENSIBO_API_KEY", indirect.as_str())]).expect("valid");
        assert_eq!(cfg.api_key, "from-file");

        let path_str = path.display().to_string();
        let cfg = config_from(&[("SENSIBO_API_KEY_FILE", path_str.as_str())]).expect("valid");
        assert_eq!(cfg.api_key, "from-file");

        fs::remove_file(&path).ok();
        assert!(matches!(
            config_from(&[("SENSIBO_API_KEY_FILE", path_str.as_str())]),
            Err(ConfigError::SecretFile { .. })
        ));
    }

    #[test]
    fn rejects_bad_values() {
        let bad = [
            ("SENSIBO_TIMEZONE", "Mars/Olympus"),
            ("HTTP_TIMEOUT_SECS", "0"),
            ("HTTP_TIMEOUT_SECS", "ten"),
            ("SYNC_INTERVAL_SECS", "-5"),
            ("SENSIBO_BASE_URL", "home.sensibo.com"),
        ];
        for (var, value) in bad {
            let err = config_from(&[("SENSIBO_API_KEY", "k"), (var, value)]).expect_err(var);
            assert!(matches!(err, ConfigError::Invalid { var: v, .. } if v == var), "{var}={value}: {err}");
        }
    }

    #[test]
    fn optional_settings_are_parsed() {
        let cfg = config_from(&[
            ("SENSIBO_API_KEY", "k"),
            ("SENSIBO_POD_ID", "abc"),
            ("SENSIBO_TIMEZONE", "Europe/Ljubljana"),
            ("SYNC_INTERVAL_SECS", "300"),
        ])
        .expect("valid");
        assert_eq!(cfg.pod_id, Some(PodId("abc".into())));
        assert_eq!(cfg.timezone, chrono_tz::Europe::Ljubljana);
        assert_eq!(cfg.sync_interval, Some(Duration::from_secs(300)));
        assert!(!format!("{cfg:?}").contains("\"k\""));
    }
}
