use std::env;
use std::time::Duration;

const DEFAULT_TABLE_NAME: &str = "users";
const DEFAULT_BUCKET_NAME: &str = "user-files";
const DEFAULT_DOWNLOAD_URL_TTL_SECS: u64 = 3600; // 1 hour
// SigV4 presigned URLs are valid for at most 7 days
const MAX_DOWNLOAD_URL_TTL_SECS: u64 = 604_800;

#[derive(Debug, Clone)]
pub struct Config {
    pub table_name: String,
    pub bucket_name: String,
    pub download_url_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            bucket_name: DEFAULT_BUCKET_NAME.to_string(),
            download_url_ttl: Duration::from_secs(DEFAULT_DOWNLOAD_URL_TTL_SECS),
        }
    }
}

impl Config {
    /// Read TABLE_NAME, BUCKET_NAME and DOWNLOAD_URL_TTL_SECS, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let table_name = lookup("TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string());
        let bucket_name = lookup("BUCKET_NAME").unwrap_or_else(|| DEFAULT_BUCKET_NAME.to_string());

        let ttl_secs = match lookup("DOWNLOAD_URL_TTL_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if (1..=MAX_DOWNLOAD_URL_TTL_SECS).contains(&secs) => secs,
                Ok(secs) => {
                    tracing::warn!(
                        "DOWNLOAD_URL_TTL_SECS {} is outside 1..={}, using {}",
                        secs,
                        MAX_DOWNLOAD_URL_TTL_SECS,
                        DEFAULT_DOWNLOAD_URL_TTL_SECS
                    );
                    DEFAULT_DOWNLOAD_URL_TTL_SECS
                }
                Err(e) => {
                    tracing::warn!(
                        "Invalid DOWNLOAD_URL_TTL_SECS '{}' ({}), using {}",
                        raw,
                        e,
                        DEFAULT_DOWNLOAD_URL_TTL_SECS
                    );
                    DEFAULT_DOWNLOAD_URL_TTL_SECS
                }
            },
            None => DEFAULT_DOWNLOAD_URL_TTL_SECS,
        };

        Self {
            table_name,
            bucket_name,
            download_url_ttl: Duration::from_secs(ttl_secs),
        }
    }
}
