use super::db_error;
use crate::account::{get_account_by_handle, Account};
use crate::content::{get_items_by_submitter, Content};
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::vote::{item_ids, load_votes, VoteMap};
use actix_web::{error, get, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_user);
}

#[derive(Template)]
#[template(path = "user.html")]
pub struct UserTemplate<'a> {
    pub client: ClientCtx,
    pub title: String,
    pub account: &'a Account,
    pub items: &'a [Content],
    pub votes: &'a VoteMap,
}

#[get("/~{handle}")]
async fn view_user(client: ClientCtx, handle: web::Path<String>) -> Result<impl Responder, Error> {
    let db = get_db_pool();
    let account = get_account_by_handle(db, &handle)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("User not found."))?;

    let items = get_items_by_submitter(db, account.id)
        .await
        .map_err(db_error)?;
    let votes = load_votes(db, &client.get_account(), &item_ids(&items))
        .await
        .map_err(db_error)?;

    Ok(UserTemplate {
        client,
        title: format!("Activity {}", account.handle),
        account: &account,
        items: &items,
        votes: &votes,
    }
    .to_response())
}
