use crate::account::{get_account_by_id, Account, ANONYMOUS_HANDLE};
use crate::config::get_config;
use crate::db::get_db_pool;
use actix_session::{Session, SessionExt};
use actix_utils::future::{ok, Ready};
use actix_web::dev::{
    forward_ready, Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform,
};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{FutureExt as _, LocalBoxFuture};
use std::time::{Duration, Instant};
use std::{cell::RefCell, rc::Rc};

/// Session key holding the logged in account's id.
pub const SESSION_ACCOUNT_ID: &str = "account_id";

/// Viewer data stored for a single request cycle.
#[derive(Clone, Debug)]
pub struct ClientCtxInner {
    pub account: Option<Account>,
    pub inverted_theme: bool,
    pub request_start: Instant,
}

impl Default for ClientCtxInner {
    fn default() -> Self {
        Self {
            account: None,
            inverted_theme: false,
            request_start: Instant::now(),
        }
    }
}

/// Client context passed to routes.
/// Wraps ClientCtxInner, which is set at the beginning of the request.
#[derive(Clone, Debug, Default)]
pub struct ClientCtx(Rc<RefCell<ClientCtxInner>>);

impl ClientCtx {
    fn get_client_ctx(extensions: &mut Extensions) -> Self {
        match extensions.get::<Rc<RefCell<ClientCtxInner>>>() {
            // Existing record in extensions; pull it.
            Some(s_impl) => Self(Rc::clone(s_impl)),
            // No existing record; create and insert it.
            None => {
                let inner = Rc::new(RefCell::new(ClientCtxInner::default()));
                extensions.insert(inner.clone());
                Self(inner)
            }
        }
    }

    /// The logged in account, or the anonymous one.
    pub fn get_account(&self) -> Account {
        self.0
            .borrow()
            .account
            .clone()
            .unwrap_or_else(Account::anonymous)
    }

    pub fn get_handle(&self) -> String {
        match &self.0.borrow().account {
            Some(account) => account.handle.to_owned(),
            None => ANONYMOUS_HANDLE.to_owned(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.0.borrow().account.is_some()
    }

    pub fn inverted_theme(&self) -> bool {
        self.0.borrow().inverted_theme
    }

    /// Returns Duration representing request time.
    pub fn request_time(&self) -> Duration {
        Instant::now() - self.0.borrow().request_start
    }

    /// Returns human readable representing request time.
    pub fn request_time_as_string(&self) -> String {
        let us = self.request_time().as_micros();
        if us > 5000 {
            format!("{}ms", us / 1000)
        } else {
            format!("{}μs", us)
        }
    }
}

/// Provides `client: ClientCtx` in the parameters of route functions.
impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ok(ClientCtx::get_client_ctx(&mut req.extensions_mut()))
    }
}

impl<S, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = ClientCtxMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ClientCtxMiddleware { service })
    }
}

/// Resolves the viewer from the cookie session.
pub struct ClientCtxMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let session: Session = req.get_session();
        let ctx = ClientCtx::get_client_ctx(&mut req.extensions_mut());
        ctx.0.borrow_mut().inverted_theme = get_config().inverted_theme;
        let fut = self.service.call(req);

        async move {
            match session.get::<i64>(SESSION_ACCOUNT_ID) {
                Ok(Some(id)) => match get_account_by_id(get_db_pool(), id).await {
                    Ok(account) => {
                        ctx.0.borrow_mut().account = account.filter(|a| !a.is_deleted());
                    }
                    Err(e) => log::error!("ClientCtxMiddleware: get_account_by_id(): {}", e),
                },
                Ok(None) => {}
                Err(e) => {
                    log::error!("ClientCtxMiddleware: Session::get(): {}", e);
                }
            };
            Ok(fut.await?)
        }
        .boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_anonymous() {
        let client = ClientCtx::default();
        assert!(!client.is_user());
        assert_eq!(client.get_handle(), "anonymous");
        assert!(client.get_account().is_anonymous());
        assert!(!client.inverted_theme());
    }

    #[test]
    fn test_context_is_shared_through_extensions() {
        let mut extensions = Extensions::new();
        let first = ClientCtx::get_client_ctx(&mut extensions);
        let mut account = Account::anonymous();
        account.id = 7;
        account.handle = "johndoe".to_owned();
        first.0.borrow_mut().account = Some(account);

        let second = ClientCtx::get_client_ctx(&mut extensions);
        assert!(second.is_user());
        assert_eq!(second.get_handle(), "johndoe");
    }
}
