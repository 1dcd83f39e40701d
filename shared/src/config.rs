use std::time::Duration;
use tracing::warn;

pub struct Config {
    pub host: String,
    pub http_port: u16,
    pub data_dir: String,
    pub retention: Duration,
    pub sweep_interval: Duration,
}

impl Config {
    const DEFAULT_DATA_DIR: &str = "./cache-data";
    const DEFAULT_HTTP_PORT: u16 = 8080;
    // One day of retention, swept hourly.
    const DEFAULT_RETENTION_SECS: u64 = 86_400;
    const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3_600;

    pub fn from_env() -> Self {
        let host = std::env::var("QUARTZ_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let http_port = std::env::var("QUARTZ_HTTP_PORT")
            .unwrap_or_else(|_| Self::DEFAULT_HTTP_PORT.to_string())
            .parse::<u16>()
            .unwrap_or_else(|_| {
                warn!("QUARTZ_HTTP_PORT is not a valid port, using default");
                Self::DEFAULT_HTTP_PORT
            });
        Self {
            host,
            http_port,
            data_dir: std::env::var("QUARTZ_DATA_DIR")
                .unwrap_or_else(|_| Self::DEFAULT_DATA_DIR.to_string()),
            retention: duration_from_env("QUARTZ_RETENTION_SECS", Self::DEFAULT_RETENTION_SECS),
            sweep_interval: duration_from_env(
                "QUARTZ_SWEEP_INTERVAL_SECS",
                Self::DEFAULT_SWEEP_INTERVAL_SECS,
            ),
        }
    }
}

fn duration_from_env(name: &str, default_secs: u64) -> Duration {
    let secs = match std::env::var(name) {
        Ok(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
            warn!("{} is not a valid number of seconds, using default", name);
            default_secs
        }),
        Err(_) => default_secs,
    };
    Duration::from_secs(secs)
}
