use loadtest_configs::{adjust_timeout, timeouts};
use loadtest_core::{
    node::{NearNodeProxy, RpcError},
    readiness::ReadinessError,
    sim::Environment,
};
use thiserror::Error;
use tokio::sync::watch;

/// Stages the one-time mint initialization moves through, in order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InitStage {
    Uninitialized,
    WaitingOnReadiness,
    RefreshingNonce,
    Ready,
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Readiness(#[from] ReadinessError),
    #[error("funding account is not resolved; setup must publish it before init runs")]
    MissingFundingAccount,
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// One-time initialization for the mint workload.
///
/// Blocks on the readiness gate, then refreshes the funding account's nonce
/// synchronously so the first provisioning transaction cannot race a stale
/// value. Stage transitions are observable through [`Self::stage_watch`].
pub struct MintInitializer {
    stage: watch::Sender<InitStage>,
}

impl MintInitializer {
    #[must_use]
    pub fn new() -> Self {
        let (stage, _) = watch::channel(InitStage::Uninitialized);
        Self { stage }
    }

    /// Subscribe to stage transitions.
    #[must_use]
    pub fn stage_watch(&self) -> watch::Receiver<InitStage> {
        self.stage.subscribe()
    }

    pub async fn run(&self, environment: &Environment) -> Result<(), InitError> {
        self.advance(InitStage::WaitingOnReadiness);
        environment
            .readiness()
            .wait_timeout(adjust_timeout(timeouts::readiness_timeout()))
            .await?;

        let funding = environment
            .funding_account()
            .ok_or(InitError::MissingFundingAccount)?;

        self.advance(InitStage::RefreshingNonce);
        let node = NearNodeProxy::new(environment);
        let nonce = node.refresh_nonce(&funding).await?;

        self.advance(InitStage::Ready);
        tracing::info!(funder = %funding.id(), nonce, "mint initialization complete");
        Ok(())
    }

    fn advance(&self, stage: InitStage) {
        tracing::debug!(?stage, "init stage");
        self.stage.send_replace(stage);
    }
}

impl Default for MintInitializer {
    fn default() -> Self {
        Self::new()
    }
}
