//! Default behavior for every query and mutation issued through a
//! [`QueryClient`](crate::cache::QueryClient).
//!
//! Values come from [`QueryClientConfig::default`], optionally adjusted by
//! environment variables:
//!
//! | Variable               | Effect                                              |
//! |------------------------|-----------------------------------------------------|
//! | `AIRCARE_ENV`          | `production`/`prod` enables refetch on window focus |
//! | `AIRCARE_QUERY_CONFIG` | path to a JSON file overriding individual fields    |

use std::fs;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::retry::{Backoff, RetryPolicy};

const ENV_VAR: &str = "AIRCARE_ENV";
const CONFIG_PATH_VAR: &str = "AIRCARE_QUERY_CONFIG";

/// Deployment the client runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Parses the value of `AIRCARE_ENV`. Anything unrecognized is development.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn from_env() -> Self {
        std::env::var(ENV_VAR)
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// Cache lifetime, retry and refetch settings.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryClientConfig {
    /// How long fetched data is served without a refetch.
    pub stale_time: Duration,
    /// How long an unused entry stays in memory before eviction.
    pub gc_time: Duration,
    pub query_retry: RetryPolicy,
    pub mutation_retry: RetryPolicy,
    pub refetch_on_reconnect: bool,
    pub refetch_on_window_focus: bool,
    pub refetch_on_mount: bool,
    pub environment: Environment,
}

impl Default for QueryClientConfig {
    fn default() -> Self {
        Self::for_environment(Environment::Development)
    }
}

impl QueryClientConfig {
    /// The stock configuration for the given deployment.
    ///
    /// | Setting               | Value                                      |
    /// |-----------------------|--------------------------------------------|
    /// | stale time            | 5 minutes                                  |
    /// | gc time               | 10 minutes                                 |
    /// | query retry           | 2 retries, `min(1s * 2^n, 30s)`, skip 404  |
    /// | mutation retry        | 1 retry, fixed 1s                          |
    /// | refetch on reconnect  | always                                     |
    /// | refetch on focus      | production only                            |
    /// | refetch on mount      | when stale                                 |
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            stale_time: Duration::from_secs(5 * 60),
            gc_time: Duration::from_secs(10 * 60),
            query_retry: RetryPolicy::queries(),
            mutation_retry: RetryPolicy::mutations(),
            refetch_on_reconnect: true,
            refetch_on_window_focus: environment.is_production(),
            refetch_on_mount: true,
            environment,
        }
    }

    /// Builds a config from `AIRCARE_ENV` and, if set, the JSON file named by
    /// `AIRCARE_QUERY_CONFIG`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the override file cannot be read, parsed,
    /// or contains an inconsistent combination of values.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::for_environment(Environment::from_env());
        if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
            let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            config = config.apply_json(&path, &contents)?;
        }
        Ok(config)
    }

    /// Applies a JSON override document on top of this config.
    ///
    /// `origin` only labels errors.
    pub fn apply_json(mut self, origin: &str, contents: &str) -> Result<Self, ConfigError> {
        let overrides: ConfigOverride =
            serde_json::from_str(contents).map_err(|source| ConfigError::Parse {
                path: origin.to_owned(),
                source,
            })?;

        if let Some(env) = overrides.environment {
            self.environment = Environment::parse(&env);
            self.refetch_on_window_focus = self.environment.is_production();
        }
        if let Some(ms) = overrides.stale_time_ms {
            self.stale_time = Duration::from_millis(ms);
        }
        if let Some(ms) = overrides.gc_time_ms {
            self.gc_time = Duration::from_millis(ms);
        }
        if let Some(n) = overrides.query_retries {
            self.query_retry.max_retries = n;
        }
        if let Some(n) = overrides.mutation_retries {
            self.mutation_retry.max_retries = n;
        }
        if let Some(value) = overrides.refetch_on_reconnect {
            self.refetch_on_reconnect = value;
        }
        if let Some(value) = overrides.refetch_on_window_focus {
            self.refetch_on_window_focus = value;
        }
        if let Some(value) = overrides.refetch_on_mount {
            self.refetch_on_mount = value;
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.gc_time < self.stale_time {
            return Err(ConfigError::Invalid {
                field: "gc_time_ms",
                reason: format!(
                    "gc time ({:?}) must not be shorter than stale time ({:?})",
                    self.gc_time, self.stale_time
                ),
            });
        }
        if let Backoff::Exponential { base, cap } = self.query_retry.backoff
            && cap < base
        {
            return Err(ConfigError::Invalid {
                field: "query_retry",
                reason: "backoff cap is below the base delay".to_owned(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    #[must_use]
    pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }

    #[must_use]
    pub fn with_query_retry(mut self, policy: RetryPolicy) -> Self {
        self.query_retry = policy;
        self
    }

    #[must_use]
    pub fn with_mutation_retry(mut self, policy: RetryPolicy) -> Self {
        self.mutation_retry = policy;
        self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverride {
    environment: Option<String>,
    stale_time_ms: Option<u64>,
    gc_time_ms: Option<u64>,
    query_retries: Option<u32>,
    mutation_retries: Option<u32>,
    refetch_on_reconnect: Option<bool>,
    refetch_on_window_focus: Option<bool>,
    refetch_on_mount: Option<bool>,
}
