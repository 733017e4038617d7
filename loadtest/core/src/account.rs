use std::sync::atomic::{AtomicU64, Ordering};

use near_crypto::{InMemorySigner, KeyType, PublicKey, SecretKey, Signer};
use near_primitives::types::{AccountId, Nonce};

/// What the account's key is allowed to do on chain.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyScope {
    FullAccess,
    FunctionCallOnly,
}

/// Signing identity plus the locally tracked nonce for one chain account.
///
/// The nonce is kept current locally so concurrent senders never reuse a
/// sequence number: every transaction claims its slot via [`reserve_nonce`]
/// and refreshes from the chain only at well-defined points.
///
/// [`reserve_nonce`]: Account::reserve_nonce
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    signer: Signer,
    key_scope: KeyScope,
    nonce: AtomicU64,
}

impl Account {
    #[must_use]
    pub fn new(id: AccountId, secret_key: SecretKey, key_scope: KeyScope) -> Self {
        let signer = InMemorySigner::from_secret_key(id.clone(), secret_key);
        Self {
            id,
            signer: Signer::InMemory(signer),
            key_scope,
            nonce: AtomicU64::new(0),
        }
    }

    /// Fresh account identity with a random ed25519 key.
    #[must_use]
    pub fn generate(id: AccountId, key_scope: KeyScope) -> Self {
        Self::new(id, SecretKey::from_random(KeyType::ED25519), key_scope)
    }

    #[must_use]
    pub const fn id(&self) -> &AccountId {
        &self.id
    }

    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        self.signer.public_key()
    }

    #[must_use]
    pub const fn signer(&self) -> &Signer {
        &self.signer
    }

    #[must_use]
    pub const fn key_scope(&self) -> KeyScope {
        self.key_scope
    }

    /// Claim the next usable nonce for a transaction signed by this account.
    pub fn reserve_nonce(&self) -> Nonce {
        self.nonce.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Overwrite the local nonce with the chain's current value.
    pub fn set_nonce(&self, nonce: Nonce) {
        self.nonce.store(nonce, Ordering::Relaxed);
    }

    #[must_use]
    pub fn nonce(&self) -> Nonce {
        self.nonce.load(Ordering::Relaxed)
    }
}
