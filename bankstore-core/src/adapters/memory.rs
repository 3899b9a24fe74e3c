//! In-memory storage implementation
//!
//! Same contract and error semantics as the DuckDB store, without a
//! database. Useful as a test double for code that consumes `Storage`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::result::{Error, LookupKey, Result};
use crate::domain::Account;
use crate::ports::{OpContext, Storage};

#[derive(Debug, Default)]
struct MemoryState {
    last_id: i64,
    accounts: BTreeMap<i64, Account>,
}

/// `Storage` backed by a map guarded by an async `RwLock`
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStore {
    async fn create_account(&self, ctx: &OpContext, account: &Account) -> Result<i64> {
        account.validate()?;
        ctx.run(async {
            let mut state = self.state.write().await;
            if state.accounts.values().any(|a| a.number == account.number) {
                return Err(Error::DuplicateNumber(account.number));
            }

            state.last_id += 1;
            let id = state.last_id;
            let mut stored = account.clone();
            stored.id = Some(id);
            state.accounts.insert(id, stored);
            Ok(id)
        })
        .await
    }

    async fn delete_account(&self, ctx: &OpContext, id: i64) -> Result<()> {
        ctx.run(async {
            self.state.write().await.accounts.remove(&id);
            Ok(())
        })
        .await
    }

    async fn update_account(&self, ctx: &OpContext, account: &Account) -> Result<()> {
        let id = account
            .id
            .ok_or_else(|| Error::validation("cannot update an account that has no id"))?;
        account.validate()?;

        ctx.run(async {
            let mut state = self.state.write().await;
            match state.accounts.get_mut(&id) {
                Some(stored) => {
                    stored.first_name = account.first_name.clone();
                    stored.last_name = account.last_name.clone();
                    stored.balance = account.balance;
                    Ok(())
                }
                None => Err(Error::NotFound(LookupKey::Id(id))),
            }
        })
        .await
    }

    async fn get_accounts(&self, ctx: &OpContext) -> Result<Vec<Account>> {
        ctx.run(async { Ok(self.state.read().await.accounts.values().cloned().collect()) })
            .await
    }

    async fn get_account_by_id(&self, ctx: &OpContext, id: i64) -> Result<Account> {
        ctx.run(async {
            self.state
                .read()
                .await
                .accounts
                .get(&id)
                .cloned()
                .ok_or(Error::NotFound(LookupKey::Id(id)))
        })
        .await
    }

    async fn get_account_by_number(&self, ctx: &OpContext, number: i64) -> Result<Account> {
        ctx.run(async {
            self.state
                .read()
                .await
                .accounts
                .values()
                .find(|a| a.number == number)
                .cloned()
                .ok_or(Error::NotFound(LookupKey::Number(number)))
        })
        .await
    }
}
