//! ActivityStreams documents served by the API.

use super::identity::{
    actor_id, collection_id, object_id, public_key_id, replies_collection_id, vote_id, Collection,
};
use crate::account::Account;
use crate::config::ApiUrls;
use crate::content::{short_hash, Content};
use crate::format::format_date;
use crate::path::Ancestor;
use crate::vote::LikedItem;
use serde::Serialize;
use serde_json::{json, Value};

pub const ACTIVITY_JSON: &str = "application/activity+json";
pub const ACTIVITY_STREAMS_NS: &str = "https://www.w3.org/ns/activitystreams";
pub const SECURITY_NS: &str = "https://w3id.org/security/v1";
const PEM_LINE: usize = 64;

/// JSON-LD context, including the `score` term the site adds.
pub fn context(urls: &ApiUrls) -> Value {
    json!([
        ACTIVITY_STREAMS_NS,
        SECURITY_NS,
        { "score": format!("{}/ns/#score", urls.site_url) }
    ])
}

/// Wraps a base64 DER document into PEM armour.
pub fn public_key_pem(der_base64: &str) -> String {
    let body: String = der_base64.split_whitespace().collect();
    let mut pem = String::from("-----BEGIN PUBLIC KEY-----\n");
    for line in body.as_bytes().chunks(PEM_LINE) {
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str("-----END PUBLIC KEY-----\n");
    pem
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKey {
    pub id: String,
    pub owner: String,
    pub public_key_pem: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(rename = "@context")]
    pub ld_context: Value,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub preferred_username: String,
    pub name: String,
    pub url: String,
    pub inbox: String,
    pub outbox: String,
    pub liked: String,
    pub score: i64,
    pub published: String,
    pub updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<PublicKey>,
}

impl Person {
    pub fn new(urls: &ApiUrls, account: &Account) -> Self {
        let id = actor_id(urls, &account.handle);
        let public_key = account.public_key().map(|key| PublicKey {
            id: public_key_id(urls, &account.key),
            owner: id.clone(),
            public_key_pem: public_key_pem(key),
        });

        Self {
            ld_context: context(urls),
            preferred_username: account.handle.clone(),
            name: account.handle.clone(),
            url: format!("{}{}", urls.site_url, account.url()),
            inbox: collection_id(urls, &account.handle, Collection::Inbox),
            outbox: collection_id(urls, &account.handle, Collection::Outbox),
            liked: collection_id(urls, &account.handle, Collection::Liked),
            score: account.score,
            published: format_date(account.created_at),
            updated: format_date(account.updated_at),
            kind: "Person",
            public_key,
            id,
        }
    }
}

/// A post or comment. Link posts are `Page`s, text is a `Note`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub ld_context: Option<Value>,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub media_type: String,
    pub published: String,
    pub updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributed_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub score: i64,
    pub replies: String,
}

impl Item {
    /// None for items without a key, which have no ID.
    pub fn from_content(urls: &ApiUrls, item: &Content) -> Option<Self> {
        let id = object_id(urls, item.handle.as_deref(), item.hash())?;
        let ancestor_id = |ancestor: Ancestor| {
            if item.is_top_level() {
                return None;
            }
            item.ancestor_key(ancestor)
                .and_then(|key| object_id(urls, None, short_hash(&key)))
        };

        let (kind, content, url) = if item.is_deleted() {
            ("Tombstone", None, None)
        } else if item.is_link() {
            ("Page", None, item.safe_url())
        } else {
            ("Note", Some(item.data_text()), None)
        };

        Some(Self {
            ld_context: None,
            name: Some(item.title.clone()).filter(|t| !t.is_empty() && !item.is_deleted()),
            media_type: item.mime_type.clone(),
            published: format_date(item.submitted_at),
            updated: format_date(item.updated_at),
            attributed_to: item.handle.as_deref().map(|h| actor_id(urls, h)),
            in_reply_to: ancestor_id(Ancestor::Parent),
            context: ancestor_id(Ancestor::Op),
            score: item.score,
            replies: replies_collection_id(&id),
            kind,
            content,
            url,
            id,
        })
    }

    /// Same item as a standalone document.
    pub fn with_context(mut self, urls: &ApiUrls) -> Self {
        self.ld_context = Some(context(urls));
        self
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Like {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub actor: String,
    pub object: String,
    pub published: String,
}

impl Like {
    pub fn new(urls: &ApiUrls, voter: &Account, liked: &LikedItem) -> Self {
        let hash = short_hash(&liked.key);
        Self {
            id: vote_id(urls, &voter.handle, hash),
            kind: "Like",
            actor: actor_id(urls, &voter.handle),
            object: object_id(urls, None, hash).unwrap_or_default(),
            published: format_date(liked.submitted_at),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedCollection<T> {
    #[serde(rename = "@context")]
    pub ld_context: Value,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub total_items: usize,
    pub ordered_items: Vec<T>,
}

impl<T> OrderedCollection<T> {
    pub fn new(urls: &ApiUrls, id: String, ordered_items: Vec<T>) -> Self {
        Self {
            ld_context: context(urls),
            kind: "OrderedCollection",
            total_items: ordered_items.len(),
            ordered_items,
            id,
        }
    }
}

/// Items mapped to documents, skipping those without an ID.
pub fn items(urls: &ApiUrls, content: &[Content]) -> Vec<Item> {
    content
        .iter()
        .filter_map(|c| Item::from_content(urls, c))
        .collect()
}
