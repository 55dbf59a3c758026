pub mod asset;
pub mod content;
pub mod error;
pub mod index;
pub mod parent;
pub mod user;

use actix_web::{error as http_error, Error};
use sea_orm::DbErr;

/// Configures the web app
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Assets first, the other patterns would swallow `/assets/a/b`.
    asset::configure(conf);
    index::configure(conf);
    user::configure(conf);
    parent::configure(conf);
    content::configure(conf);
}

/// Logs a store failure and turns it into a 500.
pub(crate) fn db_error(e: DbErr) -> Error {
    log::error!("Query failed: {}", e);
    http_error::ErrorInternalServerError("Could not load content.")
}
