use crate::format::{format_date, format_score, relative_date};
use crate::path::{Ancestor, MaterializedPath};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use sea_orm::{
    DatabaseConnection, DbBackend, DbErr, FromQueryResult, Statement, Value,
};
use url::Url;

pub const MIME_TYPE_URL: &str = "application/url";
pub const MAX_CONTENT_ITEMS: u64 = 200;
/// Length of the key prefix used in URLs.
pub const HASH_LENGTH: usize = 8;

bitflags::bitflags! {
    #[derive(Default)]
    pub struct ContentFlags: i16 {
        const DELETED = 0b0001;
    }
}

/// A raw `content_items` row joined with the submitter's handle.
#[derive(Clone, Debug, FromQueryResult)]
pub struct ContentRow {
    pub id: i64,
    pub key: String,
    pub mime_type: String,
    pub data: Option<Vec<u8>>,
    pub title: Option<String>,
    pub score: i64,
    pub submitted_at: NaiveDateTime,
    pub submitted_by: Option<i64>,
    pub updated_at: NaiveDateTime,
    pub flags: i16,
    pub path: Option<String>,
    pub handle: Option<String>,
}

/// A post or comment, ready for templates.
#[derive(Clone, Debug, PartialEq)]
pub struct Content {
    pub id: i64,
    pub key: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub title: String,
    pub score: i64,
    pub submitted_at: NaiveDateTime,
    pub submitted_by: Option<i64>,
    pub updated_at: NaiveDateTime,
    pub flags: ContentFlags,
    pub path: MaterializedPath,
    pub handle: Option<String>,
}

impl From<ContentRow> for Content {
    fn from(row: ContentRow) -> Self {
        // Rows written before paths existed are treated as top-level.
        let path = match row.path {
            Some(path) if !path.is_empty() => MaterializedPath::new(path),
            _ => MaterializedPath::new(row.key.as_str()),
        };
        Self {
            id: row.id,
            key: row.key,
            mime_type: row.mime_type,
            data: row.data.unwrap_or_default(),
            title: row.title.unwrap_or_default(),
            score: row.score,
            submitted_at: row.submitted_at,
            submitted_by: row.submitted_by,
            updated_at: row.updated_at,
            flags: ContentFlags::from_bits_truncate(row.flags),
            path,
            handle: row.handle,
        }
    }
}

impl Content {
    pub fn is_deleted(&self) -> bool {
        self.flags.contains(ContentFlags::DELETED)
    }

    pub fn is_link(&self) -> bool {
        self.mime_type == MIME_TYPE_URL
    }

    pub fn is_top_level(&self) -> bool {
        self.path.depth() <= 1
    }

    /// Short key used in URLs.
    pub fn hash(&self) -> &str {
        short_hash(&self.key)
    }

    pub fn data_text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    fn link_url(&self) -> Option<Url> {
        if !self.is_link() {
            return None;
        }
        Url::parse(self.data_text().trim())
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
    }

    /// Target of a link post. Only http(s) URLs are handed out, anything
    /// else (`javascript:`, `data:`) is dropped.
    pub fn safe_url(&self) -> Option<String> {
        self.link_url().map(String::from)
    }

    /// Host part of a link post, empty for text posts.
    pub fn domain(&self) -> String {
        self.link_url()
            .and_then(|url| url.host_str().map(str::to_owned))
            .unwrap_or_default()
    }

    pub fn score_fmt(&self) -> String {
        format_score(self.score)
    }

    pub fn submitted_ago(&self) -> String {
        relative_date(self.submitted_at, Utc::now().naive_utc())
    }

    pub fn submitted_iso(&self) -> String {
        format_date(self.submitted_at)
    }

    pub fn handle_or_anonymous(&self) -> &str {
        self.handle
            .as_deref()
            .unwrap_or(crate::account::ANONYMOUS_HANDLE)
    }

    pub fn permalink(&self) -> String {
        permalink(self.submitted_at, &self.key)
    }

    /// Key of the requested ancestor, taken from the materialized path.
    pub fn ancestor_key(&self, ancestor: Ancestor) -> Option<String> {
        ancestor
            .resolve(&self.path)
            .and_then(|p| p.last().map(str::to_owned))
    }

    /// `/{p|op}/{hash}/{ancestor}` for comments, None for top-level posts.
    pub fn ancestor_link(&self, ancestor: Ancestor) -> Option<String> {
        if self.is_top_level() {
            return None;
        }
        self.ancestor_key(ancestor).map(|key| {
            format!(
                "/{}/{}/{}",
                ancestor.route(),
                self.hash(),
                short_hash(&key)
            )
        })
    }

    pub fn parent_link(&self) -> String {
        self.ancestor_link(Ancestor::Parent).unwrap_or_default()
    }

    pub fn op_link(&self) -> String {
        self.ancestor_link(Ancestor::Op).unwrap_or_default()
    }

    /// Nesting below `base`, used for comment indentation.
    pub fn level_below(&self, base: &Content) -> usize {
        self.path.depth().saturating_sub(base.path.depth())
    }
}

pub fn short_hash(key: &str) -> &str {
    match key.char_indices().nth(HASH_LENGTH) {
        Some((i, _)) => &key[..i],
        None => key,
    }
}

/// `/{YYYY}/{MM}/{DD}/{hash}`
pub fn permalink(submitted_at: NaiveDateTime, key: &str) -> String {
    format!(
        "/{:04}/{:02}/{:02}/{}",
        submitted_at.year(),
        submitted_at.month(),
        submitted_at.day(),
        short_hash(key)
    )
}

/// Normalizes a key or key prefix taken from a URL. Keys are hex, anything
/// else cannot match and is rejected before reaching the store.
pub fn parse_hash(hash: &str) -> Option<String> {
    if hash.is_empty() || hash.len() > 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(hash.to_ascii_lowercase())
}

fn prefix_pattern(hash: &str) -> Value {
    format!("{}%", hash).into()
}

const SELECT_CONTENT: &str = r#"select "content_items"."id", "content_items"."key", "mime_type", "data", "title",
        "content_items"."score", "submitted_at", "submitted_by", "content_items"."updated_at",
        "content_items"."flags", "content_items"."path"::text as "path", "accounts"."handle"
    from "content_items"
        left join "accounts" on "accounts"."id" = "content_items"."submitted_by""#;

async fn query_content(
    db: &DatabaseConnection,
    sql: String,
    values: Vec<Value>,
) -> Result<Vec<Content>, DbErr> {
    Ok(ContentRow::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        &sql,
        values,
    ))
    .all(db)
    .await?
    .into_iter()
    .map(Content::from)
    .collect())
}

/// Front page feed, best first.
pub async fn get_index_items(db: &DatabaseConnection) -> Result<Vec<Content>, DbErr> {
    let sql = format!(
        r#"{} order by "content_items"."score" desc, "submitted_at" desc limit {}"#,
        SELECT_CONTENT, MAX_CONTENT_ITEMS
    );
    query_content(db, sql, Vec::new()).await
}

/// Everything an account submitted, newest first.
pub async fn get_items_by_submitter(
    db: &DatabaseConnection,
    account_id: i64,
) -> Result<Vec<Content>, DbErr> {
    let sql = format!(
        r#"{} where "submitted_by" = $1 order by "submitted_at" desc"#,
        SELECT_CONTENT
    );
    query_content(db, sql, vec![account_id.into()]).await
}

pub async fn get_item_by_submitter(
    db: &DatabaseConnection,
    account_id: i64,
    hash: &str,
) -> Result<Option<Content>, DbErr> {
    let sql = format!(
        r#"{} where "submitted_by" = $1 and "content_items"."key" like $2 limit 1"#,
        SELECT_CONTENT
    );
    Ok(query_content(db, sql, vec![account_id.into(), prefix_pattern(hash)])
        .await?
        .pop())
}

pub async fn get_item_by_hash(
    db: &DatabaseConnection,
    hash: &str,
) -> Result<Option<Content>, DbErr> {
    let sql = format!(
        r#"{} where "content_items"."key" like $1 limit 1"#,
        SELECT_CONTENT
    );
    Ok(query_content(db, sql, vec![prefix_pattern(hash)]).await?.pop())
}

/// Item behind a permalink: key prefix submitted on the given day.
pub async fn get_item_by_permalink(
    db: &DatabaseConnection,
    day: NaiveDate,
    hash: &str,
) -> Result<Option<Content>, DbErr> {
    let start = match day.and_hms_opt(0, 0, 0) {
        Some(start) => start,
        None => return Ok(None),
    };
    let end = start + Duration::days(1);
    let sql = format!(
        r#"{} where "content_items"."key" like $1 and "submitted_at" >= $2 and "submitted_at" < $3 limit 1"#,
        SELECT_CONTENT
    );
    Ok(
        query_content(db, sql, vec![prefix_pattern(hash), start.into(), end.into()])
            .await?
            .pop(),
    )
}

/// All replies below `path`, in depth-first order.
pub async fn get_descendants(
    db: &DatabaseConnection,
    path: &MaterializedPath,
) -> Result<Vec<Content>, DbErr> {
    let sql = format!(
        r#"{} where "content_items"."path" <@ $1::ltree and nlevel("content_items"."path") > nlevel($1::ltree)
    order by "content_items"."path""#,
        SELECT_CONTENT
    );
    query_content(db, sql, vec![path.as_str().into()]).await
}

/// Submission time and key of an ancestor, enough to build its permalink.
#[derive(Clone, Debug, FromQueryResult)]
pub struct AncestorRow {
    pub submitted_at: NaiveDateTime,
    pub key: String,
}

impl AncestorRow {
    pub fn permalink(&self) -> String {
        permalink(self.submitted_at, &self.key)
    }
}

/// SQL resolving an ancestor of `cur` by truncating its path. The candidate's
/// own path has to equal the truncated path, so `par` is exactly the parent or
/// the root and never some other node sharing a key prefix.
pub fn ancestor_sql(ancestor: Ancestor) -> String {
    let guard = match ancestor.guard_sql() {
        Some(guard) => format!("{} and ", guard),
        None => String::new(),
    };
    format!(
        r#"select "par"."submitted_at", "par"."key" from "content_items" "par"
    inner join "content_items" "cur"
        on {}"par"."path" = subpath("cur"."path", 0, {})
    where "cur"."key" like $1 and "par"."key" like $2
    limit 1"#,
        guard,
        ancestor.level_sql()
    )
}

pub async fn find_ancestor(
    db: &DatabaseConnection,
    ancestor: Ancestor,
    hash: &str,
    ancestor_hash: &str,
) -> Result<Option<AncestorRow>, DbErr> {
    AncestorRow::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        &ancestor_sql(ancestor),
        vec![prefix_pattern(hash), prefix_pattern(ancestor_hash)],
    ))
    .one(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|d| d.and_hms_opt(10, 30, 0))
            .unwrap()
    }

    fn item(key: &str, path: &str) -> Content {
        Content::from(ContentRow {
            id: 1,
            key: key.to_owned(),
            mime_type: "text/plain".to_owned(),
            data: Some(b"hello".to_vec()),
            title: None,
            score: 0,
            submitted_at: at(2018, 3, 4),
            submitted_by: Some(1),
            updated_at: at(2018, 3, 4),
            flags: 0,
            path: Some(path.to_owned()),
            handle: Some("johndoe".to_owned()),
        })
    }

    #[test]
    fn test_permalink() {
        assert_eq!(
            permalink(at(2018, 3, 4), "0a1b2c3d4e5f6a7b"),
            "/2018/03/04/0a1b2c3d"
        );
        assert_eq!(permalink(at(2018, 12, 24), "abc"), "/2018/12/24/abc");
    }

    #[test]
    fn test_parse_hash() {
        assert_eq!(parse_hash("0A1b2C3d"), Some("0a1b2c3d".to_owned()));
        assert_eq!(parse_hash(""), None);
        assert_eq!(parse_hash("abc%"), None);
        assert_eq!(parse_hash("ab_c"), None);
        assert_eq!(parse_hash(&"a".repeat(65)), None);
    }

    #[test]
    fn test_link_domain() {
        let mut link = item("aaaaaaaaaa", "aaaaaaaaaa");
        assert_eq!(link.domain(), "");
        link.mime_type = MIME_TYPE_URL.to_owned();
        link.data = b"https://littr.me/about".to_vec();
        assert!(link.is_link());
        assert_eq!(link.domain(), "littr.me");
        link.data = b"nonsense".to_vec();
        assert_eq!(link.domain(), "");
    }

    #[test]
    fn test_safe_url() {
        let mut link = item("aaaaaaaaaa", "aaaaaaaaaa");
        link.mime_type = MIME_TYPE_URL.to_owned();
        link.data = b"https://littr.me/about".to_vec();
        assert_eq!(link.safe_url().as_deref(), Some("https://littr.me/about"));

        for unsafe_url in [
            "javascript:alert(document.cookie)",
            " JavaScript:alert(1)",
            "data:text/html,<script>alert(1)</script>",
            "//littr.me",
        ] {
            link.data = unsafe_url.as_bytes().to_vec();
            assert_eq!(link.safe_url(), None);
            assert_eq!(link.domain(), "");
        }

        let text = item("bbbbbbbbbb", "bbbbbbbbbb");
        assert_eq!(text.safe_url(), None);
    }

    #[test]
    fn test_deleted_flag() {
        let mut c = item("aaaaaaaaaa", "aaaaaaaaaa");
        assert!(!c.is_deleted());
        c.flags = ContentFlags::from_bits_truncate(1);
        assert!(c.is_deleted());
    }

    #[test]
    fn test_ancestor_links() {
        let reply = item("cccccccc11", "aaaaaaaa11.bbbbbbbb11.cccccccc11");
        assert_eq!(reply.parent_link(), "/p/cccccccc/bbbbbbbb");
        assert_eq!(reply.op_link(), "/op/cccccccc/aaaaaaaa");
        assert_eq!(
            reply.ancestor_key(Ancestor::Parent).as_deref(),
            Some("bbbbbbbb11")
        );

        let post = item("aaaaaaaa11", "aaaaaaaa11");
        assert!(post.is_top_level());
        assert_eq!(post.parent_link(), "");
        assert_eq!(post.op_link(), "");
    }

    #[test]
    fn test_missing_path_is_top_level() {
        let mut row = ContentRow {
            id: 1,
            key: "aaaaaaaa11".to_owned(),
            mime_type: MIME_TYPE_URL.to_owned(),
            data: None,
            title: Some("t".to_owned()),
            score: 0,
            submitted_at: at(2018, 3, 4),
            submitted_by: None,
            updated_at: at(2018, 3, 4),
            flags: 0,
            path: None,
            handle: None,
        };
        let c = Content::from(row.clone());
        assert_eq!(c.path.as_str(), "aaaaaaaa11");
        assert_eq!(c.handle_or_anonymous(), "anonymous");
        row.path = Some(String::new());
        assert!(Content::from(row).is_top_level());
    }

    #[test]
    fn test_level_below() {
        let op = item("aaaaaaaa11", "aaaaaaaa11");
        let reply = item("cccccccc11", "aaaaaaaa11.bbbbbbbb11.cccccccc11");
        assert_eq!(reply.level_below(&op), 2);
        assert_eq!(op.level_below(&reply), 0);
    }

    #[test]
    fn test_ancestor_sql_truncation() {
        assert!(ancestor_sql(Ancestor::Parent)
            .contains(r#"subpath("cur"."path", 0, nlevel("cur"."path") - 1)"#));
        assert!(ancestor_sql(Ancestor::Op).contains(r#"subpath("cur"."path", 0, 1)"#));
    }

    #[test]
    fn test_only_parent_requires_depth() {
        let guard = r#"nlevel("cur"."path") > 1"#;
        assert!(ancestor_sql(Ancestor::Parent).contains(guard));
        assert!(!ancestor_sql(Ancestor::Op).contains(guard));
    }
}
