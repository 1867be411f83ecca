use std::fmt::{Display, Formatter};
use std::time::Duration;

use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, ValueEnum};
use jiff::SignedDuration;

pub const PORT_ENV: &str = "SHORTURL_PORT";
pub const DOMAIN_ENV: &str = "SHORTURL_DOMAIN";
pub const TTL_ENV: &str = "SHORTURL_TTL";
pub const REDIS_DSN_ENV: &str = "SHORTURL_REDIS_DSN";
pub const STORAGE_BACKEND_ENV: &str = "SHORTURL_STORAGE_BACKEND";
pub const UPSTREAM_TIMEOUT_ENV: &str = "SHORTURL_UPSTREAM_TIMEOUT";
pub const LOG_JSON_ENV: &str = "SHORTURL_LOG_JSON";

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TTL: &str = "180d";
pub const DEFAULT_REDIS_DSN: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_UPSTREAM_TIMEOUT: &str = "30s";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "redis")]
    Redis,
    #[value(name = "in-memory")]
    InMemory,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::Redis => write!(f, "redis"),
            StorageBackendArg::InMemory => write!(f, "in-memory"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "shorturl", about = "URL shortener with renew-on-access expiry")]
pub struct CLI {
    /// Port to listen on (all interfaces).
    #[arg(long, env = PORT_ENV, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Public domain short URLs are issued under.
    #[arg(long, env = DOMAIN_ENV, value_parser = NonEmptyStringValueParser::new())]
    pub domain: String,

    /// Lifetime of a mapping, re-armed by every shorten (`180d`, `4320h`, `PT1H`).
    #[arg(long, env = TTL_ENV, default_value = DEFAULT_TTL, value_parser = parse_duration)]
    pub ttl: Duration,

    #[arg(long, env = REDIS_DSN_ENV, default_value = DEFAULT_REDIS_DSN)]
    pub dsn: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::Redis
    )]
    pub storage: StorageBackendArg,

    /// Timeout of a proxied upstream request.
    #[arg(
        long,
        env = UPSTREAM_TIMEOUT_ENV,
        default_value = DEFAULT_UPSTREAM_TIMEOUT,
        value_parser = parse_duration
    )]
    pub upstream_timeout: Duration,

    /// Emit logs as JSON lines.
    #[arg(long, env = LOG_JSON_ENV)]
    pub log_json: bool,
}

/// Parses `<n>d` or any duration jiff understands (`4320h`, `30s`, `PT1H`).
fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();

    let duration = match raw.strip_suffix('d').map(str::parse::<u64>) {
        Some(Ok(days)) => days
            .checked_mul(SECONDS_PER_DAY)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration out of range: {raw}"))?,
        _ => {
            let signed: SignedDuration = raw
                .parse()
                .map_err(|e| format!("invalid duration '{raw}': {e}"))?;
            Duration::try_from(signed).map_err(|_| format!("duration must be positive: {raw}"))?
        }
    };

    if duration.is_zero() {
        return Err(format!("duration must be positive: {raw}"));
    }
    Ok(duration)
}
