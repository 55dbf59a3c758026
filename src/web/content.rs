use super::db_error;
use crate::content::{get_descendants, get_item_by_permalink, parse_hash, Content};
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::vote::{item_ids, load_votes, VoteMap};
use actix_web::{error, get, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
use chrono::NaiveDate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_content);
}

#[derive(Template)]
#[template(path = "content.html")]
pub struct ContentTemplate<'a> {
    pub client: ClientCtx,
    pub title: &'a str,
    pub entry: &'a Content,
    pub replies: &'a [Content],
    pub votes: &'a VoteMap,
}

#[get("/{year:[0-9]+}/{month:[0-9]+}/{day:[0-9]+}/{hash}")]
async fn view_content(
    client: ClientCtx,
    path: web::Path<(i32, u32, u32, String)>,
) -> Result<impl Responder, Error> {
    let (year, month, day, hash) = path.into_inner();
    let not_found = || error::ErrorNotFound("Item not found.");

    let day = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(not_found)?;
    let hash = parse_hash(&hash).ok_or_else(not_found)?;

    let db = get_db_pool();
    let item = get_item_by_permalink(db, day, &hash)
        .await
        .map_err(db_error)?
        .ok_or_else(not_found)?;
    let replies = get_descendants(db, &item.path).await.map_err(db_error)?;

    let mut ids = item_ids(&replies);
    ids.push(item.id);
    let votes = load_votes(db, &client.get_account(), &ids)
        .await
        .map_err(db_error)?;

    let title = if item.title.is_empty() {
        item.hash().to_owned()
    } else {
        item.title.clone()
    };

    Ok(ContentTemplate {
        client,
        title: &title,
        entry: &item,
        replies: &replies,
        votes: &votes,
    }
    .to_response())
}
