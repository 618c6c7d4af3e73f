use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub telephony: TelephonyConfig,
    pub sessions: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Publicly reachable base URL of this deployment; the telephony
    /// provider posts its callbacks here.
    pub public_base_url: Option<String>,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct TelephonyConfig {
    pub enabled: bool,
    pub account_sid: Option<String>,
    pub auth_token: Option<SecretString>,
    pub from_number: Option<String>,
    pub api_base_url: String,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Sessions untouched for this long are swept; stalled calls never get
    /// another callback, so the state would otherwise live until restart.
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub public_base_url: Option<String>,
    pub log_level: Option<String>,
    pub telephony_enabled: Option<bool>,
    pub telephony_account_sid: Option<String>,
    pub telephony_auth_token: Option<String>,
    pub telephony_from_number: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                public_base_url: None,
                graceful_shutdown_secs: 15,
            },
            telephony: TelephonyConfig {
                enabled: false,
                account_sid: None,
                auth_token: None,
                from_number: None,
                api_base_url: "https://api.twilio.com".to_string(),
            },
            sessions: SessionConfig { ttl_secs: 3_600, sweep_interval_secs: 300 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("quell.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(public_base_url) = server.public_base_url {
                self.server.public_base_url = Some(public_base_url);
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(telephony) = patch.telephony {
            if let Some(enabled) = telephony.enabled {
                self.telephony.enabled = enabled;
            }
            if let Some(account_sid) = telephony.account_sid {
                self.telephony.account_sid = Some(account_sid);
            }
            if let Some(auth_token_value) = telephony.auth_token {
                self.telephony.auth_token = Some(secret_value(auth_token_value));
            }
            if let Some(from_number) = telephony.from_number {
                self.telephony.from_number = Some(from_number);
            }
            if let Some(api_base_url) = telephony.api_base_url {
                self.telephony.api_base_url = api_base_url;
            }
        }

        if let Some(sessions) = patch.sessions {
            if let Some(ttl_secs) = sessions.ttl_secs {
                self.sessions.ttl_secs = ttl_secs;
            }
            if let Some(sweep_interval_secs) = sessions.sweep_interval_secs {
                self.sessions.sweep_interval_secs = sweep_interval_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("QUELL_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("QUELL_SERVER_PORT") {
            self.server.port = parse_u16("QUELL_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("QUELL_SERVER_PUBLIC_BASE_URL") {
            self.server.public_base_url = Some(value);
        }
        if let Some(value) = read_env("QUELL_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("QUELL_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("QUELL_TELEPHONY_ENABLED") {
            self.telephony.enabled = parse_bool("QUELL_TELEPHONY_ENABLED", &value)?;
        }
        if let Some(value) = read_env("QUELL_TELEPHONY_ACCOUNT_SID") {
            self.telephony.account_sid = Some(value);
        }
        if let Some(value) = read_env("QUELL_TELEPHONY_AUTH_TOKEN") {
            self.telephony.auth_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("QUELL_TELEPHONY_FROM_NUMBER") {
            self.telephony.from_number = Some(value);
        }
        if let Some(value) = read_env("QUELL_TELEPHONY_API_BASE_URL") {
            self.telephony.api_base_url = value;
        }

        if let Some(value) = read_env("QUELL_SESSIONS_TTL_SECS") {
            self.sessions.ttl_secs = parse_u64("QUELL_SESSIONS_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("QUELL_SESSIONS_SWEEP_INTERVAL_SECS") {
            self.sessions.sweep_interval_secs =
                parse_u64("QUELL_SESSIONS_SWEEP_INTERVAL_SECS", &value)?;
        }

        let log_level = read_env("QUELL_LOGGING_LEVEL").or_else(|| read_env("QUELL_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("QUELL_LOGGING_FORMAT").or_else(|| read_env("QUELL_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(public_base_url) = overrides.public_base_url {
            self.server.public_base_url = Some(public_base_url);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(enabled) = overrides.telephony_enabled {
            self.telephony.enabled = enabled;
        }
        if let Some(account_sid) = overrides.telephony_account_sid {
            self.telephony.account_sid = Some(account_sid);
        }
        if let Some(auth_token) = overrides.telephony_auth_token {
            self.telephony.auth_token = Some(secret_value(auth_token));
        }
        if let Some(from_number) = overrides.telephony_from_number {
            self.telephony.from_number = Some(from_number);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_telephony(&self.telephony, &self.server)?;
        validate_sessions(&self.sessions)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("quell.toml"), PathBuf::from("config/quell.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    if let Some(base_url) = &server.public_base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "server.public_base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_telephony(
    telephony: &TelephonyConfig,
    server: &ServerConfig,
) -> Result<(), ConfigError> {
    if !telephony.enabled {
        return Ok(());
    }

    if telephony.account_sid.as_deref().map(str::trim).unwrap_or("").is_empty() {
        return Err(ConfigError::Validation(
            "telephony.account_sid is required when telephony.enabled is true".to_string(),
        ));
    }

    let token_missing = telephony
        .auth_token
        .as_ref()
        .map(|token| token.expose_secret().trim().is_empty())
        .unwrap_or(true);
    if token_missing {
        return Err(ConfigError::Validation(
            "telephony.auth_token is required when telephony.enabled is true".to_string(),
        ));
    }

    if telephony.from_number.as_deref().map(str::trim).unwrap_or("").is_empty() {
        return Err(ConfigError::Validation(
            "telephony.from_number is required when telephony.enabled is true".to_string(),
        ));
    }

    if server.public_base_url.is_none() {
        return Err(ConfigError::Validation(
            "server.public_base_url is required when telephony.enabled is true (the provider \
             must reach the voice callback)"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_sessions(sessions: &SessionConfig) -> Result<(), ConfigError> {
    if sessions.ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "sessions.ttl_secs must be greater than zero".to_string(),
        ));
    }
    if sessions.sweep_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "sessions.sweep_interval_secs must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    telephony: Option<TelephonyPatch>,
    sessions: Option<SessionsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    public_base_url: Option<String>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct TelephonyPatch {
    enabled: Option<bool>,
    account_sid: Option<String>,
    auth_token: Option<String>,
    from_number: Option<String>,
    api_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionsPatch {
    ttl_secs: Option<u64>,
    sweep_interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
