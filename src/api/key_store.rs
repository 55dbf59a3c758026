use crate::account::{get_account_by_key, Account};
use sea_orm::{DatabaseConnection, DbErr};

/// Source of accounts for signature key lookups.
#[async_trait::async_trait]
pub trait KeyStore: Send + Sync {
    /// Account whose key hash equals `key`.
    async fn load_account_by_key(&self, key: &str) -> Result<Option<Account>, DbErr>;
}

/// Looks keys up in the `accounts` table.
pub struct DbKeyStore {
    pub db: &'static DatabaseConnection,
}

#[async_trait::async_trait]
impl KeyStore for DbKeyStore {
    async fn load_account_by_key(&self, key: &str) -> Result<Option<Account>, DbErr> {
        get_account_by_key(self.db, key).await
    }
}
