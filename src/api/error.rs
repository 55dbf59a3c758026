use actix_web::http::header::{self, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt::{Display, Formatter};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Debug, Serialize)]
struct ErrorItem<'a> {
    code: u16,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    status: u16,
    errors: Vec<ErrorItem<'a>>,
}

/// Error rendered as the API's JSON error document.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    messages: Vec<String>,
    challenge: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Display) -> Self {
        let message = message.to_string();
        if status.is_server_error() {
            log::error!("api: {}", message);
        } else {
            log::debug!("api: {} {}", status.as_u16(), message);
        }
        Self {
            status,
            messages: vec![message],
            challenge: None,
        }
    }

    pub fn not_found(message: impl Display) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// 401 carrying a `WWW-Authenticate` challenge.
    pub fn unauthorized(message: impl Display, challenge: &str) -> Self {
        let mut err = Self::new(StatusCode::UNAUTHORIZED, message);
        err.challenge = Some(challenge.to_owned());
        err
    }

    pub fn challenge(&self) -> Option<&str> {
        self.challenge.as_deref()
    }

    /// Serialized error document.
    pub fn body(&self) -> String {
        let body = ErrorBody {
            status: self.status.as_u16(),
            errors: self
                .messages
                .iter()
                .map(|message| ErrorItem {
                    code: self.status.as_u16(),
                    message,
                })
                .collect(),
        };
        serde_json::to_string(&body).unwrap_or_else(|_| {
            format!(r#"{{"status":{},"errors":[]}}"#, self.status.as_u16())
        })
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.messages.join("; "))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        let mut res = HttpResponse::build(self.status);
        res.insert_header((header::CONTENT_TYPE, JSON_CONTENT_TYPE));
        if let Some(challenge) = &self.challenge {
            match HeaderValue::from_str(challenge) {
                Ok(value) => {
                    res.insert_header((header::WWW_AUTHENTICATE, value));
                }
                Err(e) => log::error!("Unusable challenge {:?}: {}", challenge, e),
            }
        }
        res.body(self.body())
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::MessageBody;

    #[test]
    fn test_error_body_shape() {
        let err = ApiError::not_found("user \"johndoe\" not found");
        let json: serde_json::Value = serde_json::from_str(&err.body()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": 404,
                "errors": [{"code": 404, "message": "user \"johndoe\" not found"}]
            })
        );
    }

    #[test]
    fn test_error_response_headers() {
        let err = ApiError::unauthorized("bad signature", r#"Signature realm="littr.git""#);
        let res = err.error_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            res.headers().get(header::CONTENT_TYPE).unwrap(),
            JSON_CONTENT_TYPE
        );
        assert_eq!(
            res.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            r#"Signature realm="littr.git""#
        );
        let body = res.into_body().try_into_bytes().unwrap();
        assert!(String::from_utf8_lossy(&body).contains("bad signature"));
    }
}
