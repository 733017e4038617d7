use std::sync::Arc;

use loadtest_configs::constants::FUNCTION_CALL_GAS;
use near_primitives::{
    action::{Action, FunctionCallAction},
    types::{AccountId, Balance},
};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::account::Account;

#[derive(Debug, Error)]
pub enum CallError {
    #[error("amount '{raw}' is not a non-negative integer")]
    InvalidAmount { raw: String },
    #[error("tick must not be empty")]
    EmptyTick,
    #[error("zero-deposit call signed by restricted key of {account} would be rejected")]
    RestrictedKey { account: AccountId },
    #[error("failed to encode call arguments")]
    ArgsEncoding(#[from] serde_json::Error),
}

/// Complete description of one transaction to submit.
///
/// Descriptors are pure values: they describe the sender, the receiver, and
/// the actions, and execute nothing themselves. Submission happens through
/// [`NearNodeProxy::send`].
///
/// [`NearNodeProxy::send`]: crate::node::NearNodeProxy::send
pub trait TransactionDescriptor: Send + Sync {
    /// Account that signs and pays for the transaction.
    fn sender_account(&self) -> Arc<Account>;

    /// Account the transaction is addressed to.
    fn receiver_id(&self) -> AccountId;

    /// Actions carried by the transaction.
    fn actions(&self) -> Result<Vec<Action>, CallError>;
}

/// Contract-call descriptors: one function call with JSON arguments.
pub trait FunctionCall: Send + Sync {
    fn sender_account(&self) -> Arc<Account>;

    /// Contract receiving the call.
    fn contract_id(&self) -> AccountId;

    /// Method invoked on the contract.
    fn method(&self) -> &str;

    /// JSON argument object, rebuilt on every invocation.
    fn args(&self) -> Result<Map<String, Value>, CallError>;

    /// Deposit attached to the call, in yoctoNEAR.
    fn deposit(&self) -> Balance {
        0
    }
}

impl<T: FunctionCall> TransactionDescriptor for T {
    fn sender_account(&self) -> Arc<Account> {
        FunctionCall::sender_account(self)
    }

    fn receiver_id(&self) -> AccountId {
        self.contract_id()
    }

    fn actions(&self) -> Result<Vec<Action>, CallError> {
        let args = serde_json::to_vec(&self.args()?)?;
        Ok(vec![Action::FunctionCall(Box::new(FunctionCallAction {
            method_name: self.method().to_owned(),
            args,
            gas: FUNCTION_CALL_GAS,
            deposit: self.deposit(),
        }))])
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::account::KeyScope;

    struct SetGreeting {
        sender: Arc<Account>,
    }

    impl FunctionCall for SetGreeting {
        fn sender_account(&self) -> Arc<Account> {
            Arc::clone(&self.sender)
        }

        fn contract_id(&self) -> AccountId {
            "greeter.near".parse().unwrap()
        }

        fn method(&self) -> &str {
            "set_greeting"
        }

        fn args(&self) -> Result<Map<String, Value>, CallError> {
            let mut args = Map::new();
            args.insert("greeting".to_owned(), json!("hello"));
            Ok(args)
        }
    }

    fn call() -> SetGreeting {
        let sender = Arc::new(Account::generate(
            "caller.near".parse().unwrap(),
            KeyScope::FullAccess,
        ));
        SetGreeting { sender }
    }

    #[test]
    fn function_call_lowers_to_single_action() {
        let call = call();
        let actions = TransactionDescriptor::actions(&call).unwrap();

        assert_eq!(actions.len(), 1);
        let Action::FunctionCall(action) = &actions[0] else {
            panic!("expected a function call action");
        };
        assert_eq!(action.method_name, "set_greeting");
        assert_eq!(action.gas, FUNCTION_CALL_GAS);
        assert_eq!(action.deposit, 0);

        let decoded: Value = serde_json::from_slice(&action.args).unwrap();
        assert_eq!(decoded, json!({"greeting": "hello"}));
    }

    #[test]
    fn receiver_is_the_contract() {
        let call = call();
        assert_eq!(
            TransactionDescriptor::receiver_id(&call),
            "greeter.near".parse::<AccountId>().unwrap()
        );
    }

    #[test]
    fn sender_account_returns_the_same_handle() {
        let call = call();
        let from_descriptor = TransactionDescriptor::sender_account(&call);
        assert!(Arc::ptr_eq(&from_descriptor, &call.sender));
    }
}
