use super::activitypub::{items, Item, Like, OrderedCollection, Person};
use super::identity::{collection_id, Collection};
use super::{activity_response, ApiAccount, ApiError};
use crate::account::{get_account_by_handle, Account};
use crate::config::get_config;
use crate::content::{get_item_by_submitter, get_items_by_submitter, parse_hash};
use crate::db::get_db_pool;
use crate::logging::Fields;
use crate::vote::get_liked_by;
use actix_web::{get, web, HttpResponse};

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(view_account)
        .service(view_account_outbox)
        .service(view_account_outbox_item)
        .service(view_account_liked);
}

async fn load_account(handle: &str) -> Result<Account, ApiError> {
    get_account_by_handle(get_db_pool(), handle)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("account {:?} not found", handle)))
}

#[get("/accounts/{handle}")]
async fn view_account(
    viewer: ApiAccount,
    handle: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let account = load_account(&handle).await?;
    log::debug!(
        "{} serving actor",
        Fields::new()
            .with("handle", &account.handle)
            .with("viewer", &viewer.0.handle)
    );
    activity_response(&Person::new(&get_config().urls, &account))
}

#[get("/accounts/{handle}/outbox")]
async fn view_account_outbox(handle: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let urls = &get_config().urls;
    let account = load_account(&handle).await?;
    let content = get_items_by_submitter(get_db_pool(), account.id).await?;

    activity_response(&OrderedCollection::new(
        urls,
        collection_id(urls, &account.handle, Collection::Outbox),
        items(urls, &content),
    ))
}

#[get("/accounts/{handle}/outbox/{hash}")]
async fn view_account_outbox_item(
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (handle, hash) = path.into_inner();
    let urls = &get_config().urls;
    let not_found = || ApiError::not_found(format!("item {:?} not found", hash));

    let hash = parse_hash(&hash).ok_or_else(not_found)?;
    let account = load_account(&handle).await?;
    let item = get_item_by_submitter(get_db_pool(), account.id, &hash)
        .await?
        .and_then(|c| Item::from_content(urls, &c))
        .ok_or_else(not_found)?;

    activity_response(&item.with_context(urls))
}

#[get("/accounts/{handle}/liked")]
async fn view_account_liked(handle: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let urls = &get_config().urls;
    let account = load_account(&handle).await?;
    let likes = get_liked_by(get_db_pool(), &account)
        .await?
        .iter()
        .map(|liked| Like::new(urls, &account, liked))
        .collect();

    activity_response(&OrderedCollection::new(
        urls,
        collection_id(urls, &account.handle, Collection::Liked),
        likes,
    ))
}
