use crate::logging::Fields;
use actix_utils::future::{ok, Ready};
use actix_web::body::{BodySize, MessageBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::Error;
use futures_util::future::{FutureExt as _, LocalBoxFuture};
use std::time::Instant;

/// Logs one line per request. Failed requests (status >= 400) log at warn.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestLog;

impl<S, B> Transform<S, ServiceRequest> for RequestLog
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLogMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestLogMiddleware { service })
    }
}

pub struct RequestLogMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLogMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let fields = Fields::new()
            .with("method", req.method())
            .with("host", req.connection_info().host())
            .with("uri", req.uri())
            .with("proto", format!("{:?}", req.version()));
        let fut = self.service.call(req);

        async move {
            let res = fut.await?;
            let length = match res.response().body().size() {
                BodySize::Sized(len) => len,
                _ => 0,
            };
            let fields = fields
                .with("status", res.status().as_u16())
                .with("length", length)
                .with("duration", format!("{:?}", start.elapsed()));

            if res.status().as_u16() >= 400 {
                log::warn!("FAIL {}", fields);
            } else {
                log::info!("OK {}", fields);
            }
            Ok(res)
        }
        .boxed_local()
    }
}
