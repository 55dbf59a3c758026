//! Canonical ActivityPub IDs. Every function here is pure: the same account
//! handle or content key always maps to the same URL.

use crate::config::ApiUrls;
use once_cell::sync::Lazy;
use url::Url;

/// Fragment every local public key ID carries.
pub const KEY_FRAGMENT: &str = "main-key";

/// Collections an ID can point at. Each variant knows its own path label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collection<'a> {
    Outbox,
    Inbox,
    Liked,
    /// An actor object, labelled by the first of its display names.
    Person(&'a [String]),
}

impl<'a> Collection<'a> {
    pub fn label(&self) -> &'a str {
        match *self {
            Collection::Outbox => "outbox",
            Collection::Inbox => "inbox",
            Collection::Liked => "liked",
            Collection::Person(names) => names.first().map(String::as_str).unwrap_or(""),
        }
    }
}

static SEGMENT_BASE: Lazy<Url> =
    Lazy::new(|| Url::parse("http://littr.git/").expect("static base URL is valid"));

/// Percent-encodes a single path segment. `/`, `%` and spaces are escaped,
/// while sub-delimiters such as `@`, `:` and `~` stay readable.
pub fn escape(segment: &str) -> String {
    let mut url = SEGMENT_BASE.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(segment);
    }
    url.path().trim_start_matches('/').to_owned()
}

/// `{accounts}/{handle}`
pub fn actor_id(urls: &ApiUrls, handle: &str) -> String {
    format!("{}/{}", urls.accounts_url, escape(handle))
}

/// `{accounts}/{key}`, the form signature key IDs use.
pub fn actor_hash_id(urls: &ApiUrls, key: &str) -> String {
    format!("{}/{}", urls.accounts_url, escape(key))
}

/// `{accounts}/{key}#main-key`
pub fn public_key_id(urls: &ApiUrls, key: &str) -> String {
    format!("{}#{}", actor_hash_id(urls, key), KEY_FRAGMENT)
}

/// `{accounts}/{handle}/{label}`, or `{base}/{label}` for the instance itself.
pub fn collection_id(urls: &ApiUrls, handle: &str, collection: Collection) -> String {
    if handle.is_empty() {
        format!("{}/{}", urls.base_url, collection.label())
    } else {
        format!(
            "{}/{}/{}",
            urls.accounts_url,
            escape(handle),
            collection.label()
        )
    }
}

pub fn replies_collection_id(object_id: &str) -> String {
    format!("{}/replies", object_id)
}

/// ID of a content item. None when there is no key to build it from.
pub fn object_id(urls: &ApiUrls, handle: Option<&str>, key: &str) -> Option<String> {
    if key.is_empty() {
        return None;
    }
    Some(match handle.filter(|h| !h.is_empty()) {
        Some(handle) => format!(
            "{}/{}/outbox/{}",
            urls.accounts_url,
            escape(handle),
            escape(key)
        ),
        None => format!("{}/{}", urls.outbox_url, escape(key)),
    })
}

/// ID of a vote. Votes federate as likes whatever their weight.
pub fn vote_id(urls: &ApiUrls, voter_handle: &str, item_key: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        urls.accounts_url,
        escape(voter_handle),
        Collection::Liked.label(),
        escape(item_key)
    )
}

/// Last path segment of an IRI, ignoring query and fragment.
pub fn last_segment(iri: &str) -> String {
    let path = iri.split(|c: char| c == '#' || c == '?').next().unwrap_or_default();
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_owned()
}

/// Content key from an object ID.
pub fn hash_from_iri(iri: &str) -> String {
    last_segment(iri)
}

/// Account handle from an actor IRI.
pub fn handle_from_iri(iri: &str) -> String {
    last_segment(iri)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> ApiUrls {
        ApiUrls::new(false, "littr.git")
    }

    #[test]
    fn test_escape_keeps_sub_delimiters() {
        assert_eq!(escape("jo@x:~y"), "jo@x:~y");
        assert_eq!(escape("a%2F b"), "a%252F%20b");
        assert_eq!(escape("q?#"), "q%3F%23");
        assert_eq!(
            actor_id(&urls(), "jo@x:~y"),
            "http://littr.git/api/accounts/jo@x:~y"
        );
    }

    #[test]
    fn test_actor_ids() {
        assert_eq!(
            actor_id(&urls(), "johndoe"),
            "http://littr.git/api/accounts/johndoe"
        );
        assert_eq!(
            actor_id(&urls(), "john doe/x"),
            "http://littr.git/api/accounts/john%20doe%2Fx"
        );
        assert_eq!(
            public_key_id(&urls(), "e33c4ff5"),
            "http://littr.git/api/accounts/e33c4ff5#main-key"
        );
    }

    #[test]
    fn test_collection_labels() {
        let names = vec!["John".to_owned(), "Johnny".to_owned()];
        assert_eq!(Collection::Outbox.label(), "outbox");
        assert_eq!(Collection::Inbox.label(), "inbox");
        assert_eq!(Collection::Liked.label(), "liked");
        assert_eq!(Collection::Person(&names).label(), "John");
        assert_eq!(Collection::Person(&[]).label(), "");
    }

    #[test]
    fn test_collection_ids() {
        assert_eq!(
            collection_id(&urls(), "johndoe", Collection::Outbox),
            "http://littr.git/api/accounts/johndoe/outbox"
        );
        assert_eq!(
            collection_id(&urls(), "", Collection::Inbox),
            "http://littr.git/api/inbox"
        );
    }

    #[test]
    fn test_object_ids() {
        assert_eq!(
            object_id(&urls(), Some("johndoe"), "0a1b2c3d").as_deref(),
            Some("http://littr.git/api/accounts/johndoe/outbox/0a1b2c3d")
        );
        assert_eq!(
            object_id(&urls(), None, "0a1b2c3d").as_deref(),
            Some("http://littr.git/api/outbox/0a1b2c3d")
        );
        assert_eq!(
            object_id(&urls(), Some(""), "0a1b2c3d").as_deref(),
            Some("http://littr.git/api/outbox/0a1b2c3d")
        );
        assert_eq!(object_id(&urls(), Some("johndoe"), ""), None);
        assert_eq!(
            replies_collection_id("http://littr.git/api/outbox/0a1b2c3d"),
            "http://littr.git/api/outbox/0a1b2c3d/replies"
        );
    }

    #[test]
    fn test_vote_id_is_always_liked() {
        assert_eq!(
            vote_id(&urls(), "johndoe", "0a1b2c3d"),
            "http://littr.git/api/accounts/johndoe/liked/0a1b2c3d"
        );
    }

    #[test]
    fn test_ids_are_deterministic() {
        assert_eq!(
            object_id(&urls(), Some("johndoe"), "0a1b"),
            object_id(&urls(), Some("johndoe"), "0a1b")
        );
    }

    #[test]
    fn test_iri_segments() {
        assert_eq!(
            hash_from_iri("http://littr.git/api/accounts/johndoe/outbox/0a1b2c3d"),
            "0a1b2c3d"
        );
        assert_eq!(
            handle_from_iri("http://littr.git/api/accounts/johndoe/"),
            "johndoe"
        );
        assert_eq!(
            last_segment("http://littr.git/api/accounts/e33c4ff5#main-key"),
            "e33c4ff5"
        );
        assert_eq!(last_segment(""), "");
    }
}
