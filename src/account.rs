use crate::orm::accounts;
use chrono::NaiveDateTime;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr};
use serde::{Deserialize, Serialize};

pub const ANONYMOUS_HANDLE: &str = "anonymous";
pub const ANONYMOUS_KEY: &str = "77b7b7215e8d78452dc40da9efbb65fdc918c757";

bitflags::bitflags! {
    #[derive(Default)]
    pub struct AccountFlags: i16 {
        const DELETED = 0b0001;
    }
}

/// Key material kept in the account metadata blob.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMetadata {
    #[serde(default)]
    pub id: Option<String>,
    /// Base64 of a PKIX (SubjectPublicKeyInfo) DER document.
    #[serde(default)]
    pub public: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMetadata {
    #[serde(default)]
    pub key: Option<KeyMetadata>,
}

impl AccountMetadata {
    pub fn from_json(json: Option<serde_json::Value>) -> Self {
        match json {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("Unreadable account metadata: {}", e);
                Self::default()
            }),
            None => Self::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Account {
    pub id: i64,
    pub key: String,
    pub handle: String,
    pub email: Option<String>,
    pub score: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub flags: AccountFlags,
    pub metadata: AccountMetadata,
}

impl Account {
    /// Identity attached to requests nobody signed.
    pub fn anonymous() -> Self {
        let epoch = chrono::DateTime::<chrono::Utc>::from(std::time::UNIX_EPOCH).naive_utc();
        Self {
            id: 0,
            key: ANONYMOUS_KEY.to_owned(),
            handle: ANONYMOUS_HANDLE.to_owned(),
            email: None,
            score: 0,
            created_at: epoch,
            updated_at: epoch,
            flags: AccountFlags::empty(),
            metadata: AccountMetadata::default(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.id == 0 && self.handle == ANONYMOUS_HANDLE
    }

    pub fn is_deleted(&self) -> bool {
        self.flags.contains(AccountFlags::DELETED)
    }

    pub fn public_key(&self) -> Option<&str> {
        self.metadata
            .key
            .as_ref()
            .and_then(|k| k.public.as_deref())
            .filter(|k| !k.is_empty())
    }

    pub fn score_fmt(&self) -> String {
        crate::format::format_score(self.score)
    }

    /// Frontend profile path.
    pub fn url(&self) -> String {
        format!("/~{}", self.handle)
    }
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            key: model.key,
            handle: model.handle,
            email: model.email,
            score: model.score,
            created_at: model.created_at,
            updated_at: model.updated_at,
            flags: AccountFlags::from_bits_truncate(model.flags),
            metadata: AccountMetadata::from_json(model.metadata),
        }
    }
}

pub async fn get_account_by_handle(
    db: &DatabaseConnection,
    handle: &str,
) -> Result<Option<Account>, DbErr> {
    Ok(accounts::Entity::find()
        .filter(accounts::Column::Handle.eq(handle))
        .one(db)
        .await?
        .map(Account::from))
}

/// Looks up the account owning a key hash, as found in a signature key ID.
pub async fn get_account_by_key(
    db: &DatabaseConnection,
    key: &str,
) -> Result<Option<Account>, DbErr> {
    Ok(accounts::Entity::find()
        .filter(accounts::Column::Key.eq(key))
        .one(db)
        .await?
        .map(Account::from))
}

pub async fn get_account_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Account>, DbErr> {
    Ok(accounts::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(Account::from))
}
