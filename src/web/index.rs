use super::db_error;
use crate::content::{get_index_items, Content};
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::vote::{item_ids, load_votes, VoteMap};
use actix_web::{get, Error, Responder};
use askama_actix::{Template, TemplateToResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_index);
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub client: ClientCtx,
    pub title: &'a str,
    pub items: &'a [Content],
    pub votes: &'a VoteMap,
}

#[get("/")]
async fn view_index(client: ClientCtx) -> Result<impl Responder, Error> {
    let db = get_db_pool();
    let items = get_index_items(db).await.map_err(db_error)?;
    let votes = load_votes(db, &client.get_account(), &item_ids(&items))
        .await
        .map_err(db_error)?;

    Ok(IndexTemplate {
        client,
        title: "Index",
        items: &items,
        votes: &votes,
    }
    .to_response())
}
