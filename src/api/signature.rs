//! HTTP Signatures (draft-cavage-http-signatures) verification.
//!
//! keyId="http://littr.git/api/accounts/e33c4ff5#main-key"

use super::identity::KEY_FRAGMENT;
use super::key_store::KeyStore;
use crate::account::Account;
use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::http::{Method, Uri};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use derive_more::Display;
use once_cell::sync::Lazy;
use regex::Regex;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier as _;
use rsa::RsaPublicKey;
use sha2::Sha256;
use std::collections::HashMap;

pub const REQUEST_TARGET: &str = "(request-target)";
/// Headers every signature must cover.
pub const REQUIRED_HEADERS: [&str; 3] = [REQUEST_TARGET, "host", "date"];

static PARAM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z]+)\s*=\s*"([^"]*)""#).expect("signature param regex is valid")
});

#[derive(Debug, Display, PartialEq, Eq)]
pub enum SignatureError {
    #[display(fmt = "malformed signature header")]
    MalformedHeader,
    #[display(fmt = "signature header has no {} parameter", _0)]
    MissingParam(&'static str),
    #[display(fmt = "unsupported signature algorithm {:?}", _0)]
    UnsupportedAlgorithm(String),
    #[display(fmt = "signature does not cover required header {:?}", _0)]
    MissingRequiredHeader(&'static str),
    #[display(fmt = "signed header {:?} is missing from the request", _0)]
    MissingHeader(String),
    #[display(fmt = "invalid key id {:?}", _0)]
    InvalidKeyId(String),
    #[display(fmt = "invalid key")]
    InvalidKeyFragment,
    #[display(fmt = "no account for key {:?}", _0)]
    AccountNotFound(String),
    #[display(fmt = "could not load account: {}", _0)]
    Store(String),
    #[display(fmt = "account {:?} has no public key", _0)]
    MissingPublicKey(String),
    #[display(fmt = "unable to parse public key: {}", _0)]
    KeyParse(String),
    #[display(fmt = "signature is not valid base64")]
    SignatureEncoding,
    #[display(fmt = "signature verification failed")]
    BadSignature,
}

impl std::error::Error for SignatureError {}

/// Parameters of a `Signature` authorization header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureParams {
    pub key_id: String,
    pub algorithm: Option<String>,
    /// Covered headers, lowercase, in signing order.
    pub headers: Vec<String>,
    pub signature: String,
}

impl SignatureParams {
    /// Parses `[Signature ]keyId="…",algorithm="…",headers="…",signature="…"`.
    pub fn parse(value: &str) -> Result<Self, SignatureError> {
        let value = value.trim();
        let value = match value.split_once(' ') {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("signature") => rest,
            _ => value,
        };

        let params: HashMap<&str, &str> = PARAM_REGEX
            .captures_iter(value)
            .filter_map(|cap| Some((cap.get(1)?.as_str(), cap.get(2)?.as_str())))
            .collect();
        if params.is_empty() {
            return Err(SignatureError::MalformedHeader);
        }

        let key_id = params
            .get("keyId")
            .filter(|v| !v.is_empty())
            .ok_or(SignatureError::MissingParam("keyId"))?;
        let signature = params
            .get("signature")
            .filter(|v| !v.is_empty())
            .ok_or(SignatureError::MissingParam("signature"))?;
        let headers = match params.get("headers") {
            Some(list) => list
                .split_whitespace()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
            None => vec!["date".to_owned()],
        };

        Ok(Self {
            key_id: key_id.to_string(),
            algorithm: params.get("algorithm").map(|a| a.to_string()),
            headers,
            signature: signature.to_string(),
        })
    }

    pub fn covers(&self, header: &str) -> bool {
        self.headers.iter().any(|h| h == header)
    }
}

/// Resolves a key ID to the account key hash it names. The fragment has to be
/// `main-key` and the last path segment is the hash.
pub fn key_hash_from_id(key_id: &str) -> Result<String, SignatureError> {
    let url =
        url::Url::parse(key_id).map_err(|_| SignatureError::InvalidKeyId(key_id.to_owned()))?;
    if url.fragment() != Some(KEY_FRAGMENT) {
        return Err(SignatureError::InvalidKeyFragment);
    }
    let hash = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .ok_or_else(|| SignatureError::InvalidKeyId(key_id.to_owned()))?;
    Ok(hash.to_owned())
}

/// Decodes the PKIX public key stored in an account's metadata.
pub fn public_key_for(account: &Account) -> Result<RsaPublicKey, SignatureError> {
    let encoded = account
        .public_key()
        .ok_or_else(|| SignatureError::MissingPublicKey(account.handle.clone()))?;
    let der = BASE64
        .decode(encoded.trim())
        .map_err(|e| SignatureError::KeyParse(e.to_string()))?;
    RsaPublicKey::from_public_key_der(&der).map_err(|e| SignatureError::KeyParse(e.to_string()))
}

/// Rebuilds the string the client signed.
pub fn signing_string(
    covered: &[String],
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
) -> Result<String, SignatureError> {
    let mut lines = Vec::with_capacity(covered.len());
    for name in covered {
        let value = if name == REQUEST_TARGET {
            let target = uri
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or_else(|| uri.path());
            format!("{} {}", method.as_str().to_lowercase(), target)
        } else {
            let values = headers
                .get_all(name.as_str())
                .filter_map(|v| v.to_str().ok())
                .map(str::trim)
                .collect::<Vec<_>>();
            if !values.is_empty() {
                values.join(", ")
            } else if name == "host" && uri.authority().is_some() {
                uri.authority().map(|a| a.to_string()).unwrap_or_default()
            } else {
                return Err(SignatureError::MissingHeader(name.clone()));
            }
        };
        lines.push(format!("{}: {}", name, value));
    }
    Ok(lines.join("\n"))
}

/// Checks signatures against public keys found through a `KeyStore`.
#[derive(Clone, Debug)]
pub struct Verifier {
    required: Vec<&'static str>,
}

impl Default for Verifier {
    fn default() -> Self {
        Self {
            required: REQUIRED_HEADERS.to_vec(),
        }
    }
}

impl Verifier {
    pub fn required_headers(&self) -> &[&'static str] {
        &self.required
    }

    /// `WWW-Authenticate` value sent along with a 401.
    pub fn challenge(&self, realm: &str) -> String {
        let mut params = Vec::new();
        if !realm.is_empty() {
            params.push(format!("realm={:?}", realm));
        }
        if !self.required.is_empty() {
            params.push(format!("headers={:?}", self.required.join(" ")));
        }
        if params.is_empty() {
            "Signature".to_owned()
        } else {
            format!("Signature {}", params.join(", "))
        }
    }

    /// Verifies the signature in the `Authorization` header and returns the
    /// account owning the key.
    pub async fn verify(
        &self,
        store: &dyn KeyStore,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
    ) -> Result<Account, SignatureError> {
        let value = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(SignatureError::MalformedHeader)?;
        let params = SignatureParams::parse(value)?;

        if let Some(algorithm) = &params.algorithm {
            match algorithm.to_ascii_lowercase().as_str() {
                "rsa-sha256" | "hs2019" => {}
                _ => return Err(SignatureError::UnsupportedAlgorithm(algorithm.clone())),
            }
        }
        if let Some(missing) = self.required.iter().find(|h| !params.covers(h)) {
            return Err(SignatureError::MissingRequiredHeader(*missing));
        }

        let hash = key_hash_from_id(&params.key_id)?;
        let account = store
            .load_account_by_key(&hash)
            .await
            .map_err(|e| SignatureError::Store(e.to_string()))?
            .filter(|account| !account.is_deleted())
            .ok_or_else(|| SignatureError::AccountNotFound(hash.clone()))?;
        let key = public_key_for(&account)?;

        let message = signing_string(&params.headers, method, uri, headers)?;
        let raw = BASE64
            .decode(params.signature.trim())
            .map_err(|_| SignatureError::SignatureEncoding)?;
        let signature =
            Signature::try_from(raw.as_slice()).map_err(|_| SignatureError::BadSignature)?;
        VerifyingKey::<Sha256>::new(key)
            .verify(message.as_bytes(), &signature)
            .map_err(|_| SignatureError::BadSignature)?;

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;

    #[test]
    fn test_parse_params() {
        let params = SignatureParams::parse(
            r#"Signature keyId="http://littr.git/api/accounts/e33c4ff5#main-key",algorithm="rsa-sha256",headers="(request-target) Host date",signature="c2lnbmVk""#,
        )
        .unwrap();
        assert_eq!(params.key_id, "http://littr.git/api/accounts/e33c4ff5#main-key");
        assert_eq!(params.algorithm.as_deref(), Some("rsa-sha256"));
        assert_eq!(params.headers, vec!["(request-target)", "host", "date"]);
        assert_eq!(params.signature, "c2lnbmVk");
    }

    #[test]
    fn test_parse_defaults_to_date() {
        let params = SignatureParams::parse(r#"keyId="k#main-key", signature="c2ln""#).unwrap();
        assert_eq!(params.headers, vec!["date"]);
        assert_eq!(params.algorithm, None);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            SignatureParams::parse("Bearer abcdef"),
            Err(SignatureError::MalformedHeader)
        );
        assert_eq!(
            SignatureParams::parse(r#"Signature signature="c2ln""#),
            Err(SignatureError::MissingParam("keyId"))
        );
        assert_eq!(
            SignatureParams::parse(r#"Signature keyId="k""#),
            Err(SignatureError::MissingParam("signature"))
        );
    }

    #[test]
    fn test_key_hash_from_id() {
        assert_eq!(
            key_hash_from_id("http://littr.git/api/accounts/e33c4ff5#main-key"),
            Ok("e33c4ff5".to_owned())
        );
        assert_eq!(
            key_hash_from_id("http://littr.git/api/accounts/e33c4ff5#other-key"),
            Err(SignatureError::InvalidKeyFragment)
        );
        assert_eq!(
            key_hash_from_id("http://littr.git/api/accounts/e33c4ff5"),
            Err(SignatureError::InvalidKeyFragment)
        );
        assert!(matches!(
            key_hash_from_id("not a url"),
            Err(SignatureError::InvalidKeyId(_))
        ));
    }

    #[test]
    fn test_public_key_errors() {
        let account = Account::anonymous();
        assert!(matches!(
            public_key_for(&account),
            Err(SignatureError::MissingPublicKey(_))
        ));

        let mut account = Account::anonymous();
        account.metadata.key = Some(crate::account::KeyMetadata {
            id: None,
            public: Some("bm90IGEga2V5".to_owned()),
        });
        assert!(matches!(
            public_key_for(&account),
            Err(SignatureError::KeyParse(_))
        ));
    }

    #[test]
    fn test_signing_string() {
        let mut headers = HeaderMap::new();
        headers.insert(
            actix_web::http::header::HOST,
            HeaderValue::from_static("littr.git"),
        );
        headers.insert(
            actix_web::http::header::DATE,
            HeaderValue::from_static("Tue, 07 Jun 2014 20:51:35 GMT"),
        );
        let uri: Uri = "/api/accounts/johndoe?page=2".parse().unwrap();
        let covered = vec![
            "(request-target)".to_owned(),
            "host".to_owned(),
            "date".to_owned(),
        ];
        assert_eq!(
            signing_string(&covered, &Method::GET, &uri, &headers).unwrap(),
            "(request-target): get /api/accounts/johndoe?page=2\nhost: littr.git\ndate: Tue, 07 Jun 2014 20:51:35 GMT"
        );

        let covered = vec!["digest".to_owned()];
        assert_eq!(
            signing_string(&covered, &Method::GET, &uri, &headers),
            Err(SignatureError::MissingHeader("digest".to_owned()))
        );
    }

    #[test]
    fn test_challenge() {
        let verifier = Verifier::default();
        assert_eq!(
            verifier.challenge("littr.git"),
            r#"Signature realm="littr.git", headers="(request-target) host date""#
        );
        assert_eq!(
            verifier.challenge(""),
            r#"Signature headers="(request-target) host date""#
        );
    }
}
