//! Federation API mounted under `/api`.

pub mod accounts;
pub mod activitypub;
pub mod error;
pub mod identity;
pub mod key_store;
pub mod middleware;
pub mod outbox;
pub mod signature;

pub use error::ApiError;
pub use key_store::{DbKeyStore, KeyStore};
pub use middleware::{ApiAccount, VerifyHttpSignature};

use crate::config::get_config;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;

pub fn configure(conf: &mut web::ServiceConfig) {
    routes(&get_config().host_name)(conf)
}

/// The `/api` scope, announcing `realm` in signature challenges.
pub fn routes(realm: &str) -> impl FnOnce(&mut web::ServiceConfig) + '_ {
    move |conf| {
        conf.service(
            web::scope("/api")
                .wrap(VerifyHttpSignature::new(realm))
                .configure(accounts::configure)
                .configure(outbox::configure)
                .default_service(web::route().to(not_found)),
        );
    }
}

/// Anything under `/api` no route matched.
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    Err(ApiError::not_found(format!("no such resource {:?}", req.path())))
}

/// Serializes an ActivityStreams document into a response.
pub fn activity_response<T: Serialize>(document: &T) -> Result<HttpResponse, ApiError> {
    let body = serde_json::to_string(document).map_err(ApiError::internal)?;
    Ok(HttpResponse::Ok()
        .content_type(activitypub::ACTIVITY_JSON)
        .body(body))
}
