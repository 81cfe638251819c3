use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub booking: BookingConfig,
    pub cache: CacheConfig,
    pub lang: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the scheduling API, including the `/api` prefix.
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Where the bearer token is persisted between invocations.
    pub file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// Length of a booked appointment window.
    pub appointment_duration_minutes: i64,
    /// Offset (minutes east of UTC) used to derive the calendar day of a
    /// booking and to interpret times given without an offset.
    pub calendar_utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

/// Longest appointment window accepted from configuration.
pub const MAX_APPOINTMENT_MINUTES: i64 = 24 * 60;

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source. Unset variables take
    /// their defaults; set but unparsable ones are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url =
            lookup("DENTAL_API_URL").unwrap_or_else(|| "http://localhost:4000/api".to_string());
        url::Url::parse(&base_url)
            .map_err(|_| ConfigError::InvalidValue("DENTAL_API_URL".to_string()))?;

        let appointment_duration_minutes: i64 =
            parse_var(&lookup, "APPOINTMENT_DURATION_MINUTES", 60)?;
        if appointment_duration_minutes <= 0
            || appointment_duration_minutes > MAX_APPOINTMENT_MINUTES
        {
            return Err(ConfigError::InvalidValue(
                "APPOINTMENT_DURATION_MINUTES".to_string(),
            ));
        }

        let calendar_utc_offset_minutes: i32 =
            parse_var(&lookup, "CALENDAR_UTC_OFFSET_MINUTES", 0)?;
        // chrono::FixedOffset only accepts offsets strictly inside +/- 24h
        if calendar_utc_offset_minutes.unsigned_abs() >= 24 * 60 {
            return Err(ConfigError::InvalidValue(
                "CALENDAR_UTC_OFFSET_MINUTES".to_string(),
            ));
        }

        Ok(Config {
            api: ApiConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                timeout_seconds: parse_var(&lookup, "DENTAL_API_TIMEOUT_SECONDS", 30)?,
            },
            session: SessionConfig {
                file: lookup("DENTAL_SESSION_FILE")
                    .unwrap_or_else(|| "data/session.json".to_string())
                    .into(),
            },
            booking: BookingConfig {
                appointment_duration_minutes,
                calendar_utc_offset_minutes,
            },
            cache: CacheConfig {
                ttl_seconds: parse_var(&lookup, "QUERY_CACHE_TTL_SECONDS", 60)?,
            },
            lang: lookup("DENTAL_LANG")
                .map(|v| crate::i18n::normalize_language(&v))
                .unwrap_or_else(|| crate::i18n::DEFAULT_LANG.to_string()),
        })
    }

    pub fn calendar_offset(&self) -> chrono::FixedOffset {
        self.booking
            .calendar_utc_offset_minutes
            .checked_mul(60)
            .and_then(chrono::FixedOffset::east_opt)
            .unwrap_or_else(|| chrono::Offset::fix(&chrono::Utc))
    }

    pub fn appointment_duration(&self) -> chrono::Duration {
        chrono::Duration::try_minutes(self.booking.appointment_duration_minutes)
            .unwrap_or_else(|| chrono::Duration::minutes(MAX_APPOINTMENT_MINUTES))
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
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
                base_url: "http://localhost:4000/api".to_string(),
                timeout_seconds: 30,
            },
            session: SessionConfig {
                file: PathBuf::from("data/session.json"),
            },
            booking: BookingConfig {
                appointment_duration_minutes: 60,
                calendar_utc_offset_minutes: 0,
            },
            cache: CacheConfig { ttl_seconds: 60 },
            lang: crate::i18n::DEFAULT_LANG.to_string(),
        }
    }
}
