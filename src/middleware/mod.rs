mod client_ctx;
mod request_log;

pub use client_ctx::{ClientCtx, ClientCtxInner, SESSION_ACCOUNT_ID};
pub use request_log::RequestLog;

// Documentation for middleware can be found here:
// https://github.com/actix/actix-web/blob/master/src/middleware/normalize.rs
