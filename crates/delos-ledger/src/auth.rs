//! Authorization gate trait.
//!
//! The staking core never decides privilege itself. "Is this caller the
//! designated epoch committer" and "may this caller administer the
//! whitelist" are resolved through this trait, wired to the governance
//! module on a real node and to [`StaticAuthorizationGate`] in tests.

use std::collections::HashSet;

use delos_types::AccountId;

/// Resolves privileged roles for the staking core.
pub trait AuthorizationGate {
    /// Whether `caller` is the designated epoch committer.
    fn is_epoch_committer(&self, caller: &AccountId) -> bool;

    /// Whether `caller` holds the governance role (whitelist administration).
    fn is_governance(&self, caller: &AccountId) -> bool;
}

/// Fixed-role gate for tests and simulation.
#[derive(Debug, Default)]
pub struct StaticAuthorizationGate {
    committers: HashSet<AccountId>,
    governors: HashSet<AccountId>,
}

impl StaticAuthorizationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate where `account` holds both the committer and governance roles.
    pub fn single(account: AccountId) -> Self {
        let mut gate = Self::default();
        gate.committers.insert(account);
        gate.governors.insert(account);
        gate
    }

    pub fn add_committer(&mut self, account: AccountId) {
        self.committers.insert(account);
    }

    pub fn add_governor(&mut self, account: AccountId) {
        self.governors.insert(account);
    }
}

impl AuthorizationGate for StaticAuthorizationGate {
    fn is_epoch_committer(&self, caller: &AccountId) -> bool {
        self.committers.contains(caller)
    }

    fn is_governance(&self, caller: &AccountId) -> bool {
        self.governors.contains(caller)
    }
}
