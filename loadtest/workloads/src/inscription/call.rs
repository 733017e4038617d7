use std::sync::{Arc, LazyLock};

use loadtest_core::{
    account::{Account, KeyScope},
    transaction::{CallError, FunctionCall},
};
use near_primitives::types::AccountId;
use serde_json::{Map, Value};

/// Contract that records inscription operations.
pub const INSCRIPTION_CONTRACT: &str = "inscription.near";
/// Method invoked for every inscription operation.
pub const INSCRIBE_METHOD: &str = "inscribe";

const PROTOCOL: &str = "nrc-20";
const MINT_OP: &str = "mint";

static CONTRACT_ID: LazyLock<AccountId> = LazyLock::new(|| {
    INSCRIPTION_CONTRACT
        .parse()
        .expect("inscription contract id is a valid account id")
});

/// One zero-deposit `inscribe` mint against the inscription contract.
#[derive(Debug)]
pub struct MintInscription {
    sender: Arc<Account>,
    tick: String,
    amt: u64,
}

impl MintInscription {
    /// Builds a mint call, rejecting senders whose key could not sign it.
    pub fn new(
        sender: Arc<Account>,
        tick: impl Into<String>,
        amt: u64,
    ) -> Result<Self, CallError> {
        let tick = tick.into();
        if tick.is_empty() {
            return Err(CallError::EmptyTick);
        }
        if sender.key_scope() != KeyScope::FullAccess {
            return Err(CallError::RestrictedKey {
                account: sender.id().clone(),
            });
        }

        Ok(Self { sender, tick, amt })
    }

    /// Like [`Self::new`], but takes the amount in its wire form.
    pub fn with_raw_amount(
        sender: Arc<Account>,
        tick: impl Into<String>,
        amt: &str,
    ) -> Result<Self, CallError> {
        let parsed = amt.parse::<u64>().map_err(|_| CallError::InvalidAmount {
            raw: amt.to_owned(),
        })?;
        Self::new(sender, tick, parsed)
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

impl FunctionCall for MintInscription {
    fn sender_account(&self) -> Arc<Account> {
        Arc::clone(&self.sender)
    }

    fn contract_id(&self) -> AccountId {
        CONTRACT_ID.clone()
    }

    fn method(&self) -> &str {
        INSCRIBE_METHOD
    }

    /// `amt` travels as a decimal string so indexers never hit JSON number
    /// precision limits.
    fn args(&self) -> Result<Map<String, Value>, CallError> {
        let mut args = Map::new();
        args.insert("p".to_owned(), Value::from(PROTOCOL));
        args.insert("op".to_owned(), Value::from(MINT_OP));
        args.insert("tick".to_owned(), Value::from(self.tick.as_str()));
        args.insert("amt".to_owned(), Value::from(self.amt.to_string()));
        Ok(args)
    }
}
