//! Configuration for the tailfire discovery server.
//!
//! Loading merges built-in defaults, a YAML or TOML file, and `TAILFIRE_*`
//! environment variables with figment, then [`validate`] turns the raw
//! result into a [`Config`]. A `Config` only exists if validation passed,
//! so nothing downstream can build an API client from a bad one.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml, Yaml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use tailfire_api::{DEFAULT_API_URL, DEFAULT_TAILNET};

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Prefix for environment overrides, e.g. `TAILFIRE_API_TOKEN`.
pub const ENV_PREFIX: &str = "TAILFIRE_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("api_url is missing")]
    MissingUrl,

    #[error("api_url '{url}' is not a valid URL: {source}")]
    MalformedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("api_url scheme must be 'http' or 'https', got '{scheme}'")]
    UnsupportedScheme { scheme: String },

    #[error("host is missing in api_url '{url}'")]
    MissingHost { url: String },

    #[error("api_token is missing")]
    MissingToken,

    #[error("config file not found: {path}")]
    NotFound { path: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Raw (unvalidated) config ────────────────────────────────────────

/// Config as read from file and environment, defaults already applied.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RawConfig {
    /// How often Prometheus should poll us. Advisory only; every request
    /// triggers a fresh refresh regardless.
    #[serde(with = "duration")]
    pub refresh_interval: Duration,

    /// Address the HTTP server binds to.
    pub listen_address: IpAddr,

    /// Port the HTTP server listens on.
    pub port: u16,

    /// Delimiter for list-valued labels (addresses, tags, routes).
    #[serde(deserialize_with = "scalar_string::deserialize")]
    pub tag_separator: String,

    /// Tailnet to query; `-` is the token owner's default tailnet.
    #[serde(deserialize_with = "scalar_string::deserialize")]
    pub tailnet: String,

    /// Control-plane base URL.
    #[serde(deserialize_with = "scalar_string::deserialize")]
    pub api_url: String,

    /// API access token (plaintext; prefer `TAILFIRE_API_TOKEN`).
    #[serde(deserialize_with = "scalar_string::deserialize")]
    pub api_token: String,

    /// Upper bound on a single upstream request.
    #[serde(with = "duration")]
    pub request_timeout: Duration,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(60),
            listen_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            tag_separator: ",".into(),
            tailnet: DEFAULT_TAILNET.into(),
            api_url: DEFAULT_API_URL.into(),
            api_token: String::new(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

// ── Validated config ────────────────────────────────────────────────

/// Validated configuration. Only [`validate`] constructs one.
#[derive(Debug, Clone)]
pub struct Config {
    pub refresh_interval: Duration,
    pub listen_address: IpAddr,
    pub port: u16,
    pub tag_separator: String,
    pub tailnet: String,
    /// As written in the config; also used as every target group's source.
    pub api_url: String,
    pub api_token: SecretString,
    pub request_timeout: Duration,
}

impl Config {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_address, self.port)
    }

    /// Effective config as TOML with the token blanked out.
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let raw = RawConfig {
            refresh_interval: self.refresh_interval,
            listen_address: self.listen_address,
            port: self.port,
            tag_separator: self.tag_separator.clone(),
            tailnet: self.tailnet.clone(),
            api_url: self.api_url.clone(),
            api_token: "<redacted>".into(),
            request_timeout: self.request_timeout,
        };
        Ok(toml::to_string_pretty(&raw)?)
    }
}

// ── Validation ──────────────────────────────────────────────────────

/// Check a raw config. Rules run in a fixed order and the first failure
/// is returned: URL present, URL parses, scheme is http(s), host present,
/// token present.
pub fn validate(raw: RawConfig) -> Result<Config, ConfigError> {
    if raw.api_url.is_empty() {
        return Err(ConfigError::MissingUrl);
    }

    let parsed = match Url::parse(&raw.api_url) {
        Ok(url) => url,
        // `https://` parses as a URL with an empty host in most parsers;
        // the url crate refuses it outright.
        Err(url::ParseError::EmptyHost) => {
            return Err(ConfigError::MissingHost { url: raw.api_url });
        }
        Err(source) => {
            return Err(ConfigError::MalformedUrl {
                url: raw.api_url,
                source,
            });
        }
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme {
            scheme: parsed.scheme().to_owned(),
        });
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::MissingHost { url: raw.api_url });
    }

    if raw.api_token.is_empty() {
        return Err(ConfigError::MissingToken);
    }

    Ok(Config {
        refresh_interval: raw.refresh_interval,
        listen_address: raw.listen_address,
        port: raw.port,
        tag_separator: raw.tag_separator,
        tailnet: raw.tailnet,
        api_url: raw.api_url,
        api_token: SecretString::from(raw.api_token),
        request_timeout: raw.request_timeout,
    })
}

// ── Config file path ────────────────────────────────────────────────

/// `./config.yaml` if present, otherwise the platform config directory.
pub fn config_path() -> PathBuf {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return local;
    }
    ProjectDirs::from("com", "tailfire", "tailfire")
        .map_or(local, |dirs| dirs.config_dir().join(DEFAULT_CONFIG_FILE))
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

// ── Config loading ──────────────────────────────────────────────────

/// Merge defaults, the config file and the environment without validating.
///
/// An explicit `path` must exist; the default path is optional, so a
/// deployment can run from environment variables alone.
pub fn load_raw(path: Option<&Path>) -> Result<RawConfig, ConfigError> {
    let path = match path {
        Some(p) if !p.exists() => {
            return Err(ConfigError::NotFound {
                path: p.display().to_string(),
            });
        }
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };

    let mut figment = Figment::new().merge(Serialized::defaults(RawConfig::default()));
    if path.exists() {
        figment = if is_yaml(&path) {
            figment.merge(Yaml::file(&path))
        } else {
            figment.merge(Toml::file(&path))
        };
    }
    figment = figment.merge(Env::prefixed(ENV_PREFIX));

    Ok(figment.extract()?)
}

/// Load and validate. Any error here should stop the process.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    validate(load_raw(path)?)
}

// ── Duration (de)serialization ──────────────────────────────────────

/// Durations as humantime strings (`60s`, `1m30s`) or bare seconds.
mod duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Secs(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Secs(secs) => Ok(Duration::from_secs(secs)),
            Raw::Text(text) => humantime::parse_duration(&text).map_err(serde::de::Error::custom),
        }
    }
}

/// Text fields accept any scalar. YAML and figment's env provider hand
/// back `12345` as an integer, which is still a valid tailnet or token.
mod scalar_string {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Unsigned(u64),
            Signed(i64),
            Float(f64),
            Bool(bool),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text,
            Raw::Unsigned(n) => n.to_string(),
            Raw::Signed(n) => n.to_string(),
            Raw::Float(n) => n.to_string(),
            Raw::Bool(b) => b.to_string(),
        })
    }
}
