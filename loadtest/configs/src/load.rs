use std::{
    str::FromStr,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use loadtest_env as lt_env;
use thiserror::Error;

use crate::constants;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be non-zero")]
    ZeroValue { field: &'static str },
    #[error(
        "funding account credentials are required (set LOADTEST_FUNDING_ACCOUNT_ID and LOADTEST_FUNDING_SECRET_KEY)"
    )]
    MissingFundingAccount,
    #[error("unknown transaction wait level '{value}'")]
    UnknownWaitLevel { value: String },
}

/// Finality level the node is asked to wait for on each submission.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum WaitLevel {
    None,
    Included,
    #[default]
    ExecutedOptimistic,
    IncludedFinal,
    Executed,
    Final,
}

impl WaitLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Included => "INCLUDED",
            Self::ExecutedOptimistic => "EXECUTED_OPTIMISTIC",
            Self::IncludedFinal => "INCLUDED_FINAL",
            Self::Executed => "EXECUTED",
            Self::Final => "FINAL",
        }
    }
}

impl FromStr for WaitLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NONE" => Ok(Self::None),
            "INCLUDED" => Ok(Self::Included),
            "EXECUTED_OPTIMISTIC" => Ok(Self::ExecutedOptimistic),
            "INCLUDED_FINAL" => Ok(Self::IncludedFinal),
            "EXECUTED" => Ok(Self::Executed),
            "FINAL" => Ok(Self::Final),
            _ => Err(ConfigError::UnknownWaitLevel {
                value: s.to_owned(),
            }),
        }
    }
}

/// Parameters describing one load-generation run.
#[derive(Clone, Debug)]
pub struct LoadConfig {
    pub rpc_url: String,
    pub users: usize,
    pub pace: Duration,
    pub run_duration: Duration,
    pub run_id: String,
    pub funding_account_id: String,
    pub funding_secret_key: String,
    pub wait_level: WaitLevel,
}

impl LoadConfig {
    /// Config with defaults for everything except the funding credentials.
    #[must_use]
    pub fn new(
        funding_account_id: impl Into<String>,
        funding_secret_key: impl Into<String>,
    ) -> Self {
        Self {
            rpc_url: constants::DEFAULT_RPC_URL.to_owned(),
            users: constants::DEFAULT_USER_COUNT,
            pace: constants::DEFAULT_PACE,
            run_duration: constants::DEFAULT_RUN_DURATION,
            run_id: default_run_id(),
            funding_account_id: funding_account_id.into(),
            funding_secret_key: funding_secret_key.into(),
            wait_level: WaitLevel::default(),
        }
    }

    /// Read the full config from the environment. Funding credentials are
    /// mandatory, everything else falls back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let funding_account_id =
            lt_env::funding_account_id().ok_or(ConfigError::MissingFundingAccount)?;
        let funding_secret_key =
            lt_env::funding_secret_key().ok_or(ConfigError::MissingFundingAccount)?;

        let mut config = Self::new(funding_account_id, funding_secret_key);
        if let Some(url) = lt_env::near_rpc_url() {
            config.rpc_url = url;
        }
        if let Some(users) = lt_env::loadtest_users() {
            config.users = users;
        }
        if let Some(millis) = lt_env::loadtest_pace_millis() {
            config.pace = Duration::from_millis(millis);
        }
        if let Some(secs) = lt_env::loadtest_run_secs() {
            config.run_duration = Duration::from_secs(secs);
        }
        if let Some(run_id) = lt_env::loadtest_run_id() {
            config.run_id = run_id;
        }
        if let Some(raw) = lt_env::tx_wait_level() {
            config.wait_level = raw.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = url.into();
        self
    }

    #[must_use]
    pub const fn with_users(mut self, users: usize) -> Self {
        self.users = users;
        self
    }

    #[must_use]
    pub const fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    #[must_use]
    pub const fn with_run_duration(mut self, duration: Duration) -> Self {
        self.run_duration = duration;
        self
    }

    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    #[must_use]
    pub const fn with_wait_level(mut self, level: WaitLevel) -> Self {
        self.wait_level = level;
        self
    }

    /// Reject configs that cannot drive any load.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.users == 0 {
            return Err(ConfigError::ZeroValue { field: "users" });
        }
        if self.pace.is_zero() {
            return Err(ConfigError::ZeroValue { field: "pace" });
        }
        if self.run_duration.is_zero() {
            return Err(ConfigError::ZeroValue {
                field: "run_duration",
            });
        }
        if self.funding_account_id.is_empty() || self.funding_secret_key.is_empty() {
            return Err(ConfigError::MissingFundingAccount);
        }
        Ok(())
    }
}

/// Run ids become account id fragments, so stick to lowercase hex.
fn default_run_id() -> String {
    let unix_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    format!("run{unix_secs:x}")
}
