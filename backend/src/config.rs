use anyhow::{Context, bail};
use std::time::Duration;

/// Where records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformConfig {
    /// Hosted PostgREST/GoTrue compatible platform.
    Hosted {
        url: String,
        anon_key: String,
        /// Key used by the export endpoint, which has no user session.
        service_key: Option<String>,
    },
    /// Local SQLite file, for offline development.
    Sqlite { path: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_host: String,
    pub port: u16,
    pub platform: PlatformConfig,
    /// Shared secret of `exportar-dados`. The endpoint refuses every call
    /// when unset.
    pub export_token: Option<String>,
    pub profile_timeout: Duration,
    pub approval_chunk_size: usize,
    pub export_page_size: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Empty values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_host = get("BIND_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(get("PORT"), 8080u16).context("PORT must be a valid port number")?;

        let platform = match get("PLATFORM_URL") {
            Some(url) => PlatformConfig::Hosted {
                url: url.trim_end_matches('/').to_string(),
                anon_key: get("PLATFORM_ANON_KEY")
                    .context("PLATFORM_ANON_KEY must be provided together with PLATFORM_URL")?,
                service_key: get("PLATFORM_SERVICE_KEY"),
            },
            None => PlatformConfig::Sqlite {
                path: get("SQLITE_PATH").unwrap_or_else(|| "gestao.sqlite".to_string()),
            },
        };

        let profile_timeout_ms = parse_or(get("PROFILE_TIMEOUT_MS"), 5000u64)
            .context("PROFILE_TIMEOUT_MS must be a number of milliseconds")?;
        let approval_chunk_size = parse_or(get("APPROVAL_CHUNK_SIZE"), common::approval::DEFAULT_CHUNK_SIZE)
            .context("APPROVAL_CHUNK_SIZE must be a positive integer")?;
        let export_page_size = parse_or(get("EXPORT_PAGE_SIZE"), 1000usize)
            .context("EXPORT_PAGE_SIZE must be a positive integer")?;
        if approval_chunk_size == 0 || export_page_size == 0 {
            bail!("APPROVAL_CHUNK_SIZE and EXPORT_PAGE_SIZE must be greater than zero");
        }

        Ok(Config {
            bind_host,
            port,
            platform,
            export_token: get("EXPORT_TOKEN"),
            profile_timeout: Duration::from_millis(profile_timeout_ms),
            approval_chunk_size,
            export_page_size,
        })
    }
}

fn parse_or<T>(value: Option<String>, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => Ok(v.trim().parse::<T>()?),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_local_sqlite() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.platform,
            PlatformConfig::Sqlite {
                path: "gestao.sqlite".into()
            }
        );
        assert_eq!(config.export_token, None);
        assert_eq!(config.profile_timeout, Duration::from_millis(5000));
        assert_eq!(config.approval_chunk_size, 50);
        assert_eq!(config.export_page_size, 1000);
    }

    #[test]
    fn hosted_platform_requires_key() {
        assert!(config(&[("PLATFORM_URL", "https://x.example")]).is_err());
        let config = config(&[
            ("PLATFORM_URL", "https://x.example/"),
            ("PLATFORM_ANON_KEY", "anon"),
        ])
        .unwrap();
        assert_eq!(
            config.platform,
            PlatformConfig::Hosted {
                url: "https://x.example".into(),
                anon_key: "anon".into(),
                service_key: None,
            }
        );
    }

    #[test]
    fn invalid_numbers_fail_startup() {
        assert!(config(&[("PORT", "http")]).is_err());
        assert!(config(&[("PROFILE_TIMEOUT_MS", "-1")]).is_err());
        assert!(config(&[("APPROVAL_CHUNK_SIZE", "0")]).is_err());
    }
}
