use std::sync::{Arc, RwLock};

use loadtest_configs::{ConfigError, LoadConfig, timeouts};
use near_crypto::SecretKey;
use near_primitives::types::AccountId;
use reqwest::{Client, Url};
use thiserror::Error;

use crate::{
    account::{Account, KeyScope},
    node::BlockHashCache,
    readiness::ReadinessSignal,
    stats::StatsRegistry,
};

#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid rpc url '{url}'")]
    InvalidRpcUrl { url: String },
    #[error("invalid funding account id '{value}'")]
    InvalidFundingAccountId { value: String },
    #[error("funding secret key is not a valid key string")]
    InvalidFundingKey,
    #[error("failed to build http client")]
    HttpClient(#[from] reqwest::Error),
}

/// Shared state of one simulation run.
///
/// Holds the run config, the HTTP client every proxy clones, the stats
/// registry, the readiness gate, and the funding account slot published by
/// the setup path.
pub struct Environment {
    config: LoadConfig,
    rpc_url: Url,
    http: Client,
    stats: Arc<StatsRegistry>,
    readiness: ReadinessSignal,
    funding: RwLock<Option<Arc<Account>>>,
    block_hash: BlockHashCache,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("config", &self.config)
            .field("rpc_url", &self.rpc_url)
            .finish_non_exhaustive()
    }
}

impl Environment {
    pub fn new(config: LoadConfig) -> Result<Self, EnvironmentError> {
        config.validate()?;
        let rpc_url = Url::parse(&config.rpc_url).map_err(|_| EnvironmentError::InvalidRpcUrl {
            url: config.rpc_url.clone(),
        })?;
        let http = Client::builder()
            .timeout(timeouts::rpc_request_timeout())
            .build()?;

        Ok(Self {
            config,
            rpc_url,
            http,
            stats: Arc::new(StatsRegistry::new()),
            readiness: ReadinessSignal::new(),
            funding: RwLock::new(None),
            block_hash: BlockHashCache::default(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &LoadConfig {
        &self.config
    }

    #[must_use]
    pub const fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    #[must_use]
    pub const fn http_client(&self) -> &Client {
        &self.http
    }

    #[must_use]
    pub fn stats_handle(&self) -> Arc<StatsRegistry> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub const fn readiness(&self) -> &ReadinessSignal {
        &self.readiness
    }

    #[must_use]
    pub fn block_hash_cache(&self) -> BlockHashCache {
        self.block_hash.clone()
    }

    /// Parse the configured credentials and publish the funding account.
    pub fn resolve_funding_account(&self) -> Result<Arc<Account>, EnvironmentError> {
        let id: AccountId = self.config.funding_account_id.parse().map_err(|_| {
            EnvironmentError::InvalidFundingAccountId {
                value: self.config.funding_account_id.clone(),
            }
        })?;
        let key: SecretKey = self
            .config
            .funding_secret_key
            .parse()
            .map_err(|_| EnvironmentError::InvalidFundingKey)?;

        let account = Arc::new(Account::new(id, key, KeyScope::FullAccess));
        *self
            .funding
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::clone(&account));
        Ok(account)
    }

    /// Funding account, once the setup path has published it.
    #[must_use]
    pub fn funding_account(&self) -> Option<Arc<Account>> {
        self.funding
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
