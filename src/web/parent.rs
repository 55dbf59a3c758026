use super::db_error;
use crate::content::{find_ancestor, parse_hash};
use crate::db::get_db_pool;
use crate::path::Ancestor;
use actix_web::http::header;
use actix_web::{error, get, web, Error, HttpResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_parent);
}

/// Redirects from a comment to the permalink of its parent (`p`) or of the
/// thread root (`op`).
#[get("/{ancestor:p|op}/{hash}/{parent}")]
async fn view_parent(path: web::Path<(String, String, String)>) -> Result<HttpResponse, Error> {
    let (ancestor, hash, parent) = path.into_inner();
    redirect_to_ancestor(get_db_pool(), &ancestor, &hash, &parent).await
}

pub async fn redirect_to_ancestor(
    db: &DatabaseConnection,
    route: &str,
    hash: &str,
    parent: &str,
) -> Result<HttpResponse, Error> {
    let not_found = || error::ErrorNotFound("Item not found.");

    let ancestor = Ancestor::from_route(route).ok_or_else(not_found)?;
    let hash = parse_hash(hash).ok_or_else(not_found)?;
    let parent = parse_hash(parent).ok_or_else(not_found)?;

    let found = find_ancestor(db, ancestor, &hash, &parent)
        .await
        .map_err(db_error)?
        .ok_or_else(not_found)?;

    Ok(HttpResponse::MovedPermanently()
        .append_header((header::LOCATION, found.permalink()))
        .finish())
}
