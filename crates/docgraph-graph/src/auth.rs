use std::collections::HashSet;

use docgraph_types::AccountName;

use crate::error::{GraphError, GraphResult};

/// "Does the caller hold credentials for this account?"
///
/// Consulted before document creation, update, certification, and edge
/// creation. Implementations must fail closed.
pub trait Authorizer: Send + Sync {
    fn require_auth(&self, account: &AccountName) -> GraphResult<()>;
}

/// Grants every request. For tests and trusted embedding.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn require_auth(&self, _account: &AccountName) -> GraphResult<()> {
        Ok(())
    }
}

/// Grants only the listed accounts.
#[derive(Debug, Default, Clone)]
pub struct Allowlist {
    accounts: HashSet<AccountName>,
}

impl Allowlist {
    pub fn new(accounts: impl IntoIterator<Item = AccountName>) -> Self {
        Self {
            accounts: accounts.into_iter().collect(),
        }
    }

    pub fn grant(&mut self, account: AccountName) {
        self.accounts.insert(account);
    }

    pub fn revoke(&mut self, account: &AccountName) {
        self.accounts.remove(account);
    }
}

impl Authorizer for Allowlist {
    fn require_auth(&self, account: &AccountName) -> GraphResult<()> {
        if self.accounts.contains(account) {
            Ok(())
        } else {
            Err(GraphError::Unauthorized {
                account: account.clone(),
            })
        }
    }
}
