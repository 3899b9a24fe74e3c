//! Storage port - account persistence abstraction

use async_trait::async_trait;

use super::context::OpContext;
use crate::domain::result::Result;
use crate::domain::Account;

/// Account storage abstraction
///
/// The HTTP layer and the seeder depend only on this trait. Every method
/// takes an [`OpContext`]; when it fires before the operation reaches the
/// database the call returns `Error::DeadlineExceeded` or `Error::Cancelled`
/// and nothing is written. An operation already handed to the database
/// reports its own outcome.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist a new account, returning the id assigned by the store
    ///
    /// `account.id` is ignored.
    async fn create_account(&self, ctx: &OpContext, account: &Account) -> Result<i64>;

    /// Hard delete by id; deleting an unknown id succeeds
    async fn delete_account(&self, ctx: &OpContext, id: i64) -> Result<()>;

    /// Overwrite `first_name`, `last_name` and `balance` of the account with `account.id`
    async fn update_account(&self, ctx: &OpContext, account: &Account) -> Result<()>;

    /// All accounts ordered by id; empty when there are none
    async fn get_accounts(&self, ctx: &OpContext) -> Result<Vec<Account>>;

    async fn get_account_by_id(&self, ctx: &OpContext, id: i64) -> Result<Account>;

    async fn get_account_by_number(&self, ctx: &OpContext, number: i64) -> Result<Account>;
}
