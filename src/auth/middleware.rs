use actix_web::{Error, FromRequest, HttpRequest, dev::Payload};
use std::future::{Ready, ready};
use uuid::Uuid;

/// Header the upstream gateway sets after authenticating the caller.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// The caller's user id, as vouched for by the gateway.
///
/// Authentication happens before requests reach this service; the extractor
/// only parses the forwarded identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_user(req))
    }
}

fn extract_user(req: &HttpRequest) -> Result<AuthenticatedUser, Error> {
    let raw = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            actix_web::error::ErrorUnauthorized(format!("Missing {USER_ID_HEADER} header"))
        })?;

    let id = Uuid::parse_str(raw.trim()).map_err(|e| {
        actix_web::error::ErrorUnauthorized(format!("Invalid {USER_ID_HEADER} header: {e}"))
    })?;

    Ok(AuthenticatedUser(id))
}
