use std::sync::Arc;

use loadtest_configs::constants::{DEFAULT_USER_FUNDS, MAX_ACCOUNT_ID_LEN};
use near_primitives::{
    account::{AccessKey, AccessKeyPermission},
    action::{Action, AddKeyAction, CreateAccountAction, TransferAction},
    types::{AccountId, Balance},
};
use thiserror::Error;
use tracing::info;

use crate::{
    account::{Account, KeyScope},
    node::{NearNodeProxy, SendError},
    transaction::{CallError, TransactionDescriptor},
};

/// Stats label for account provisioning submissions.
pub const CREATE_ACCOUNT_LABEL: &str = "Create Account";

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("'{id}' is not a valid sub-account id under '{parent}'")]
    InvalidAccountId { id: String, parent: String },
    #[error(transparent)]
    Send(#[from] SendError),
}

/// Batch creating a funded sub-account with a full-access key.
pub struct CreateSubAccount {
    funder: Arc<Account>,
    new_account: Arc<Account>,
    funds: Balance,
}

impl CreateSubAccount {
    #[must_use]
    pub fn new(funder: Arc<Account>, new_account: Arc<Account>) -> Self {
        Self {
            funder,
            new_account,
            funds: DEFAULT_USER_FUNDS,
        }
    }

    #[must_use]
    pub const fn with_funds(mut self, funds: Balance) -> Self {
        self.funds = funds;
        self
    }
}

impl TransactionDescriptor for CreateSubAccount {
    fn sender_account(&self) -> Arc<Account> {
        Arc::clone(&self.funder)
    }

    fn receiver_id(&self) -> AccountId {
        self.new_account.id().clone()
    }

    fn actions(&self) -> Result<Vec<Action>, CallError> {
        Ok(vec![
            Action::CreateAccount(CreateAccountAction {}),
            Action::Transfer(TransferAction {
                deposit: self.funds,
            }),
            Action::AddKey(Box::new(AddKeyAction {
                public_key: self.new_account.public_key(),
                access_key: AccessKey {
                    nonce: 0,
                    permission: AccessKeyPermission::FullAccess,
                },
            })),
        ])
    }
}

/// Derive `label.parent` as the id of a new sub-account.
pub fn sub_account_id(parent: &AccountId, label: &str) -> Result<AccountId, ProvisionError> {
    let id = format!("{label}.{parent}");
    if id.len() > MAX_ACCOUNT_ID_LEN {
        return Err(ProvisionError::InvalidAccountId {
            id,
            parent: parent.to_string(),
        });
    }
    id.parse().map_err(|_| ProvisionError::InvalidAccountId {
        id,
        parent: parent.to_string(),
    })
}

/// Create and fund a fresh sub-account for one virtual user, leaving its
/// local nonce synced with the chain.
pub async fn provision_user_account(
    node: &NearNodeProxy,
    funder: Arc<Account>,
    label: &str,
) -> Result<Arc<Account>, ProvisionError> {
    let id = sub_account_id(funder.id(), label)?;
    let account = Arc::new(Account::generate(id, KeyScope::FullAccess));

    let batch = CreateSubAccount::new(Arc::clone(&funder), Arc::clone(&account));
    node.send(&batch, CREATE_ACCOUNT_LABEL).await?;
    node.refresh_nonce(account.as_ref())
        .await
        .map_err(SendError::from)?;

    info!(account = %account.id(), funder = %funder.id(), "provisioned user account");
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funder() -> Arc<Account> {
        Arc::new(Account::generate(
            "funder.near".parse().unwrap(),
            KeyScope::FullAccess,
        ))
    }

    #[test]
    fn sub_account_id_joins_label_and_parent() {
        let parent: AccountId = "funder.near".parse().unwrap();
        let id = sub_account_id(&parent, "run1-u7").unwrap();
        assert_eq!(id.as_str(), "run1-u7.funder.near");
    }

    #[test]
    fn sub_account_id_rejects_overlong_ids() {
        let parent: AccountId = "funder.near".parse().unwrap();
        let label = "x".repeat(MAX_ACCOUNT_ID_LEN);
        let err = sub_account_id(&parent, &label).unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidAccountId { .. }));
    }

    #[test]
    fn sub_account_id_rejects_invalid_characters() {
        let parent: AccountId = "funder.near".parse().unwrap();
        let err = sub_account_id(&parent, "No Spaces").unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidAccountId { .. }));
    }

    #[test]
    fn create_sub_account_batch_shape() {
        let funder = funder();
        let fresh = Arc::new(Account::generate(
            "u1.funder.near".parse().unwrap(),
            KeyScope::FullAccess,
        ));
        let batch =
            CreateSubAccount::new(Arc::clone(&funder), Arc::clone(&fresh)).with_funds(7_000);

        assert!(Arc::ptr_eq(&batch.sender_account(), &funder));
        assert_eq!(batch.receiver_id(), *fresh.id());

        let actions = batch.actions().unwrap();
        assert_eq!(actions.len(), 3);
        assert!(matches!(actions[0], Action::CreateAccount(_)));
        let Action::Transfer(transfer) = &actions[1] else {
            panic!("expected a transfer action");
        };
        assert_eq!(transfer.deposit, 7_000);
        let Action::AddKey(add_key) = &actions[2] else {
            panic!("expected an add-key action");
        };
        assert_eq!(add_key.public_key, fresh.public_key());
        assert_eq!(add_key.access_key.nonce, 0);
        assert!(matches!(
            add_key.access_key.permission,
            AccessKeyPermission::FullAccess
        ));
    }
}
