use super::error::ApiError;
use super::key_store::KeyStore;
use super::signature::Verifier;
use crate::account::Account;
use crate::logging::Fields;
use actix_utils::future::{ok, Ready};
use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web::Data, Error, FromRequest, HttpMessage, HttpRequest, ResponseError};
use futures_util::future::{FutureExt as _, LocalBoxFuture};
use std::rc::Rc;
use std::sync::Arc;

/// Account a request to the API acts as. Anonymous unless it carried a valid
/// HTTP signature.
#[derive(Clone, Debug)]
pub struct ApiAccount(pub Account);

impl ApiAccount {
    pub fn is_anonymous(&self) -> bool {
        self.0.is_anonymous()
    }
}

impl FromRequest for ApiAccount {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<ApiAccount>() {
            Some(account) => ok(account.clone()),
            None => ok(ApiAccount(Account::anonymous())),
        }
    }
}

/// Verifies HTTP signatures on requests that carry an `Authorization` header.
///
/// Needs a `Data<Arc<dyn KeyStore>>` registered on the app.
#[derive(Clone, Debug)]
pub struct VerifyHttpSignature {
    verifier: Rc<Verifier>,
    challenge: Rc<str>,
}

impl VerifyHttpSignature {
    /// `realm` is announced in the challenge, normally the public host name.
    pub fn new(realm: &str) -> Self {
        let verifier = Verifier::default();
        let challenge = verifier.challenge(realm);
        Self {
            verifier: Rc::new(verifier),
            challenge: Rc::from(challenge),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for VerifyHttpSignature
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = VerifyHttpSignatureMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(VerifyHttpSignatureMiddleware {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
            challenge: self.challenge.clone(),
        })
    }
}

pub struct VerifyHttpSignatureMiddleware<S> {
    service: Rc<S>,
    verifier: Rc<Verifier>,
    challenge: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for VerifyHttpSignatureMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let verifier = self.verifier.clone();
        let challenge = self.challenge.clone();

        async move {
            // Only verify a signature if one is present.
            if !req.headers().contains_key(AUTHORIZATION) {
                req.extensions_mut()
                    .insert(ApiAccount(Account::anonymous()));
                return service.call(req).await.map(|res| res.map_into_left_body());
            }

            let store = match req.app_data::<Data<Arc<dyn KeyStore>>>() {
                Some(store) => store.clone(),
                None => {
                    let err = ApiError::internal("No KeyStore available through web server.");
                    return Ok(req.into_response(err.error_response()).map_into_right_body());
                }
            };

            let verified = verifier
                .verify(store.get_ref().as_ref(), req.method(), req.uri(), req.headers())
                .await;

            match verified {
                Ok(account) => {
                    log::debug!(
                        "{} loaded account from http signature header",
                        Fields::new()
                            .with("handle", &account.handle)
                            .with("hash", &account.key)
                    );
                    req.extensions_mut().insert(ApiAccount(account));
                    service.call(req).await.map(|res| res.map_into_left_body())
                }
                Err(e) => {
                    log::info!(
                        "{} rejected http signature",
                        Fields::new()
                            .with("uri", req.uri())
                            .with("error", &e)
                    );
                    let err = ApiError::unauthorized(e, &challenge);
                    Ok(req.into_response(err.error_response()).map_into_right_body())
                }
            }
        }
        .boxed_local()
    }
}
