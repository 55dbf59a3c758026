use super::activitypub::{items, Item, OrderedCollection};
use super::identity::{collection_id, Collection};
use super::{activity_response, ApiError};
use crate::config::get_config;
use crate::content::{get_index_items, get_item_by_hash, parse_hash};
use crate::db::get_db_pool;
use actix_web::{get, web, HttpResponse};

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(view_outbox).service(view_outbox_item);
}

/// The instance outbox, same items as the front page.
#[get("/outbox")]
async fn view_outbox() -> Result<HttpResponse, ApiError> {
    let urls = &get_config().urls;
    let content = get_index_items(get_db_pool()).await?;

    activity_response(&OrderedCollection::new(
        urls,
        collection_id(urls, "", Collection::Outbox),
        items(urls, &content),
    ))
}

#[get("/outbox/{hash}")]
async fn view_outbox_item(hash: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let urls = &get_config().urls;
    let not_found = || ApiError::not_found(format!("item {:?} not found", hash.as_str()));

    let hash = parse_hash(&hash).ok_or_else(not_found)?;
    let item = get_item_by_hash(get_db_pool(), &hash)
        .await?
        .and_then(|c| Item::from_content(urls, &c))
        .ok_or_else(not_found)?;

    activity_response(&item.with_context(urls))
}
