use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use loadtest_core::{
    account::Account,
    node::NearNodeProxy,
    provision::provision_user_account,
    sim::{DynError, Environment, UserBehavior},
};

use super::call::MintInscription;

/// Stats channel for mint submissions.
pub const MINT_LABEL: &str = "Mint Inscription";
/// Ticker minted when none is configured.
pub const DEFAULT_TICK: &str = "abahmane-meme";
/// Units minted per call when no amount is configured.
pub const DEFAULT_MINT_AMOUNT: u64 = 100;

/// Virtual user that mints one inscription per pace tick.
///
/// `on_start` provisions a dedicated sub-account under the funding account,
/// so every user signs with its own key and nonce sequence.
pub struct MintInscriptionUser {
    index: usize,
    tick: String,
    amt: u64,
    active: Option<ActiveUser>,
}

struct ActiveUser {
    node: NearNodeProxy,
    account: Arc<Account>,
}

impl MintInscriptionUser {
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self {
            index,
            tick: DEFAULT_TICK.to_owned(),
            amt: DEFAULT_MINT_AMOUNT,
            active: None,
        }
    }

    #[must_use]
    pub fn with_tick(mut self, tick: impl Into<String>) -> Self {
        self.tick = tick.into();
        self
    }

    #[must_use]
    pub const fn with_amount(mut self, amt: u64) -> Self {
        self.amt = amt;
        self
    }

    #[must_use]
    pub fn tick(&self) -> &str {
        &self.tick
    }

    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.amt
    }
}

#[async_trait]
impl UserBehavior for MintInscriptionUser {
    fn name(&self) -> &str {
        "mint_inscription"
    }

    async fn on_start(&mut self, environment: &Environment) -> Result<(), DynError> {
        let node = NearNodeProxy::new(environment);
        let funder = environment
            .funding_account()
            .ok_or("funding account is not resolved; setup must publish it first")?;

        let label = format!("{}-u{}", environment.config().run_id, self.index);
        let account = provision_user_account(&node, funder, &label).await?;
        tracing::info!(user = %account.id(), tick = %self.tick, "mint user ready");

        self.active = Some(ActiveUser { node, account });
        Ok(())
    }

    async fn task(&mut self, environment: &Environment) -> Result<(), DynError> {
        let active = self.active.as_ref().ok_or("mint user was not started")?;

        let call = match MintInscription::new(
            Arc::clone(&active.account),
            self.tick.as_str(),
            self.amt,
        ) {
            Ok(call) => call,
            Err(error) => {
                // A mint that cannot even be built still counts against the channel.
                environment
                    .stats_handle()
                    .record_failure(MINT_LABEL, Duration::ZERO);
                return Err(error.into());
            }
        };
        let outcome = active.node.send(&call, MINT_LABEL).await?;
        tracing::debug!(user = %active.account.id(), outcome = %outcome, "mint submitted");

        Ok(())
    }
}
