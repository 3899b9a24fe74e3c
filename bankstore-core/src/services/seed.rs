//! Seed service - bootstrap demo accounts
//!
//! Seeding gives a fresh database something to log in with. It only goes
//! through the `Storage` port, so it works against any backend.

use std::sync::Arc;

use crate::domain::result::Result;
use crate::domain::{Account, Argon2Params};
use crate::ports::{OpContext, Storage};

/// Fixed demo account: (first name, last name, password)
pub const DEMO_ACCOUNT: (&str, &str, &str) = ("Harry", "Potter", "seed-test-password");

/// Service for seeding accounts into a store
pub struct SeedService {
    store: Arc<dyn Storage>,
    params: Argon2Params,
}

impl SeedService {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self {
            store,
            params: Argon2Params::default(),
        }
    }

    /// Use non-default hashing cost for seeded passwords
    pub fn with_params(mut self, params: Argon2Params) -> Self {
        self.params = params;
        self
    }

    /// Construct and persist one account
    ///
    /// Returns the account with its store-assigned id.
    pub async fn seed_account(
        &self,
        ctx: &OpContext,
        first_name: &str,
        last_name: &str,
        password: &str,
    ) -> Result<Account> {
        let mut account = Account::with_params(first_name, last_name, password, &self.params)?;
        let id = self.store.create_account(ctx, &account).await?;
        account.id = Some(id);

        tracing::debug!(id, number = account.number, "seeded account");
        Ok(account)
    }

    /// Seed the fixed demo account
    pub async fn seed_demo_accounts(&self, ctx: &OpContext) -> Result<Vec<Account>> {
        let (first_name, last_name, password) = DEMO_ACCOUNT;
        let account = self
            .seed_account(ctx, first_name, last_name, password)
            .await?;
        Ok(vec![account])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;

    fn cheap() -> Argon2Params {
        Argon2Params {
            time_cost: 1,
            memory_cost: 8,
            parallelism: 1,
        }
    }

    #[tokio::test]
    async fn test_seed_demo_accounts() {
        let store = Arc::new(InMemoryStore::new());
        let service = SeedService::new(store.clone()).with_params(cheap());
        let ctx = OpContext::background();

        let seeded = service.seed_demo_accounts(&ctx).await.unwrap();
        assert_eq!(seeded.len(), 1);

        let stored = store
            .get_account_by_number(&ctx, seeded[0].number)
            .await
            .unwrap();
        assert_eq!(stored, seeded[0]);
        assert_eq!(stored.full_name(), "Harry Potter");
        assert!(stored.verify_password("seed-test-password"));
    }

    #[tokio::test]
    async fn test_seed_rejects_invalid_input() {
        let store = Arc::new(InMemoryStore::new());
        let service = SeedService::new(store.clone()).with_params(cheap());
        let ctx = OpContext::background();

        assert!(service.seed_account(&ctx, "", "Potter", "pw").await.is_err());
        assert!(store.get_accounts(&ctx).await.unwrap().is_empty());
    }
}
