use std::{
    env, fs, io,
    net::{AddrParseError, SocketAddr},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use analysis::GeminiConfig;
use core_sim::{default_roster, Instrument, SimConfig};
use runtime::{CadenceConfig, LogFormat};
use thiserror::Error;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TICK_MS: u64 = 1_500;
const DEFAULT_DISPLAY_REFRESH_MS: u64 = 1_000;
const DEFAULT_HISTORY_CAPACITY: usize = 20;
const DEFAULT_VOLATILITY: f64 = 0.002;
const DEFAULT_ADVISOR_MODEL: &str = analysis::gemini::DEFAULT_MODEL;

const ENV_ADDR: &str = "MARKET_SERVER_ADDR";
const ENV_TICK_MS: &str = "MARKET_TICK_MS";
const ENV_DISPLAY_REFRESH_MS: &str = "MARKET_DISPLAY_REFRESH_MS";
const ENV_HISTORY_CAPACITY: &str = "MARKET_HISTORY_CAPACITY";
const ENV_VOLATILITY: &str = "MARKET_VOLATILITY";
const ENV_RNG_SEED: &str = "MARKET_RNG_SEED";
const ENV_ROSTER_PATH: &str = "MARKET_ROSTER_PATH";
const ENV_LOG_FORMAT: &str = "MARKET_LOG_FORMAT";
const ENV_ADVISOR_API_KEY: &str = "ADVISOR_API_KEY";
const ENV_ADVISOR_MODEL: &str = "ADVISOR_MODEL";

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub cadence: CadenceConfig,
    pub sim: SimConfig,
    pub roster_path: Option<PathBuf>,
    pub log_format: LogFormat,
    pub advisor: GeminiConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MARKET_SERVER_ADDR is not a valid socket address: {0}")]
    InvalidListenAddr(#[source] AddrParseError),

    #[error("MARKET_TICK_MS must be a positive number of milliseconds")]
    InvalidTickMs,

    #[error("MARKET_DISPLAY_REFRESH_MS must be a positive number of milliseconds")]
    InvalidDisplayRefreshMs,

    #[error("MARKET_HISTORY_CAPACITY must be a positive integer")]
    InvalidHistoryCapacity,

    #[error("MARKET_VOLATILITY must be a finite fraction between 0 and 1")]
    InvalidVolatility,

    #[error("MARKET_RNG_SEED must be an unsigned 64-bit integer")]
    InvalidRngSeed,

    #[error("MARKET_ROSTER_PATH must not be empty or whitespace")]
    InvalidRosterPath,

    #[error("MARKET_LOG_FORMAT must be one of: pretty, json")]
    InvalidLogFormat,

    #[error("ADVISOR_MODEL must not be empty or whitespace")]
    InvalidAdvisorModel,

    #[error("{key} contains non-unicode data")]
    NonUnicode { key: &'static str },

    #[error("failed to read roster {path}: {source}")]
    RosterRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse roster {path}: {source}")]
    RosterParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr = match read_env(ENV_ADDR)? {
            Some(value) => value.parse().map_err(ConfigError::InvalidListenAddr)?,
            None => DEFAULT_LISTEN_ADDR
                .parse()
                .expect("default listen address must be valid"),
        };

        let tick_ms = parse_env(ENV_TICK_MS, DEFAULT_TICK_MS, |ms| *ms > 0, ConfigError::InvalidTickMs)?;
        let display_refresh_ms = parse_env(
            ENV_DISPLAY_REFRESH_MS,
            DEFAULT_DISPLAY_REFRESH_MS,
            |ms| *ms > 0,
            ConfigError::InvalidDisplayRefreshMs,
        )?;

        let history_capacity = parse_env(
            ENV_HISTORY_CAPACITY,
            DEFAULT_HISTORY_CAPACITY,
            |capacity| *capacity > 0,
            ConfigError::InvalidHistoryCapacity,
        )?;
        let volatility = parse_env(
            ENV_VOLATILITY,
            DEFAULT_VOLATILITY,
            |volatility: &f64| volatility.is_finite() && (0.0..1.0).contains(volatility),
            ConfigError::InvalidVolatility,
        )?;
        let rng_seed = match read_env(ENV_RNG_SEED)? {
            Some(value) => Some(value.parse().map_err(|_| ConfigError::InvalidRngSeed)?),
            None => None,
        };

        let roster_path = match read_env(ENV_ROSTER_PATH)? {
            Some(value) if value.trim().is_empty() => return Err(ConfigError::InvalidRosterPath),
            Some(value) => Some(PathBuf::from(value)),
            None => None,
        };

        let log_format = match read_env(ENV_LOG_FORMAT)? {
            Some(value) => LogFormat::parse(value.as_str()).ok_or(ConfigError::InvalidLogFormat)?,
            None => LogFormat::default(),
        };

        let api_key = read_env(ENV_ADVISOR_API_KEY)?.filter(|key| !key.trim().is_empty());
        let model = match read_env(ENV_ADVISOR_MODEL)? {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::InvalidAdvisorModel);
            }
            Some(value) => value,
            None => DEFAULT_ADVISOR_MODEL.to_owned(),
        };

        Ok(Self {
            listen_addr,
            cadence: CadenceConfig {
                advance_period: Duration::from_millis(tick_ms),
                display_refresh_period: Duration::from_millis(display_refresh_ms),
            },
            sim: SimConfig {
                volatility,
                history_capacity,
                seed_samples: history_capacity,
                rng_seed,
                ..SimConfig::default()
            },
            roster_path,
            log_format,
            advisor: GeminiConfig {
                api_key,
                model,
                ..GeminiConfig::default()
            },
        })
    }

    /// The configured roster file, or the built-in roster when none is set.
    pub fn load_roster(&self) -> Result<Vec<Instrument>, ConfigError> {
        let Some(path) = &self.roster_path else {
            return Ok(default_roster());
        };

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::RosterRead {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::RosterParse {
            path: path.clone(),
            source,
        })
    }
}

fn read_env(key: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NonUnicode { key }),
    }
}

fn parse_env<T: FromStr>(
    key: &'static str,
    default_value: T,
    is_valid: impl Fn(&T) -> bool,
    invalid_error: ConfigError,
) -> Result<T, ConfigError> {
    match read_env(key)? {
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) if is_valid(&parsed) => Ok(parsed),
            _ => Err(invalid_error),
        },
        None => Ok(default_value),
    }
}
