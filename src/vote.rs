use crate::account::Account;
use crate::content::Content;
use crate::orm::votes;
use chrono::NaiveDateTime;
use sea_orm::{
    entity::*, query::*, DatabaseConnection, DbBackend, DbErr, FromQueryResult, Statement,
};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vote {
    pub submitted_by: i64,
    pub item_id: i64,
    pub weight: i32,
    pub submitted_at: NaiveDateTime,
}

impl Vote {
    pub fn is_up(&self) -> bool {
        self.weight > 0
    }

    pub fn is_down(&self) -> bool {
        self.weight < 0
    }
}

impl From<votes::Model> for Vote {
    fn from(model: votes::Model) -> Self {
        Self {
            submitted_by: model.submitted_by,
            item_id: model.item_id,
            weight: model.weight,
            submitted_at: model.submitted_at,
        }
    }
}

/// The viewer's votes on a page of items, keyed by item id.
#[derive(Clone, Debug, Default)]
pub struct VoteMap(HashMap<i64, Vote>);

impl VoteMap {
    pub fn get(&self, item: &Content) -> Option<&Vote> {
        self.0.get(&item.id)
    }

    /// CSS class for the vote arrows of an item.
    pub fn class_for(&self, item: &Content) -> &'static str {
        match self.get(item) {
            Some(v) if v.is_up() => "voted-up",
            Some(v) if v.is_down() => "voted-down",
            _ => "",
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Vote> for VoteMap {
    fn from_iter<I: IntoIterator<Item = Vote>>(iter: I) -> Self {
        Self(iter.into_iter().map(|v| (v.item_id, v)).collect())
    }
}

pub fn item_ids(items: &[Content]) -> Vec<i64> {
    items.iter().map(|i| i.id).collect()
}

/// Loads what `viewer` voted on `ids`. Anonymous viewers never voted.
pub async fn load_votes(
    db: &DatabaseConnection,
    viewer: &Account,
    ids: &[i64],
) -> Result<VoteMap, DbErr> {
    if viewer.is_anonymous() || ids.is_empty() {
        return Ok(VoteMap::default());
    }

    Ok(votes::Entity::find()
        .filter(votes::Column::SubmittedBy.eq(viewer.id))
        .filter(votes::Column::ItemId.is_in(ids.iter().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(Vote::from)
        .collect())
}

/// A positive vote with the key of the item it was cast on.
#[derive(Clone, Debug, FromQueryResult)]
pub struct LikedItem {
    pub weight: i32,
    pub submitted_at: NaiveDateTime,
    pub key: String,
}

/// Everything `account` liked, newest first.
pub async fn get_liked_by(db: &DatabaseConnection, account: &Account) -> Result<Vec<LikedItem>, DbErr> {
    LikedItem::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        r#"select "votes"."weight", "votes"."submitted_at", "content_items"."key" from "votes"
    inner join "content_items" on "content_items"."id" = "votes"."item_id"
    where "votes"."submitted_by" = $1 and "votes"."weight" > 0
    order by "votes"."submitted_at" desc"#,
        vec![account.id.into()],
    ))
    .all(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentRow;

    fn vote(item_id: i64, weight: i32) -> Vote {
        Vote {
            submitted_by: 1,
            item_id,
            weight,
            submitted_at: Account::anonymous().created_at,
        }
    }

    fn item(id: i64) -> Content {
        Content::from(ContentRow {
            id,
            key: format!("{:010}", id),
            mime_type: "text/plain".to_owned(),
            data: None,
            title: None,
            score: 0,
            submitted_at: Account::anonymous().created_at,
            submitted_by: None,
            updated_at: Account::anonymous().created_at,
            flags: 0,
            path: None,
            handle: None,
        })
    }

    #[test]
    fn test_vote_map_classes() {
        let map: VoteMap = vec![vote(1, 1), vote(2, -1), vote(3, 0)].into_iter().collect();
        assert_eq!(map.len(), 3);
        assert_eq!(map.class_for(&item(1)), "voted-up");
        assert_eq!(map.class_for(&item(2)), "voted-down");
        assert_eq!(map.class_for(&item(3)), "");
        assert_eq!(map.class_for(&item(4)), "");
    }

    #[test]
    fn test_item_ids() {
        assert_eq!(item_ids(&[item(4), item(2)]), vec![4, 2]);
        assert!(item_ids(&[]).is_empty());
    }

    #[actix_rt::test]
    async fn test_anonymous_viewer_skips_store() {
        let db = DatabaseConnection::Disconnected;
        let votes = load_votes(&db, &Account::anonymous(), &[1, 2, 3])
            .await
            .expect("anonymous viewers must not query");
        assert!(votes.is_empty());
    }
}
