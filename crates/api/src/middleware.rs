//! Principal extraction middleware.
//!
//! The API sits behind an authenticating gateway that forwards the verified
//! identity in headers: `x-user-id` (UUID), `x-user-role`
//! (`buyer`/`vendor`/`admin`) and, for vendors, `x-vendor-id` (UUID).
//! Requests without a usable identity are rejected before reaching any
//! handler.

use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::context::{Principal, Role};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const VENDOR_ID_HEADER: &str = "x-vendor-id";

pub async fn principal_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let principal = extract_principal(req.headers())?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

fn extract_principal(headers: &HeaderMap) -> Result<Principal, StatusCode> {
    let user_id = header_str(headers, USER_ID_HEADER)?
        .ok_or(StatusCode::UNAUTHORIZED)?
        .parse()
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let role = match header_str(headers, USER_ROLE_HEADER)? {
        Some(raw) => Role::parse(raw).ok_or(StatusCode::UNAUTHORIZED)?,
        None => Role::Buyer,
    };

    let vendor_id = match header_str(headers, VENDOR_ID_HEADER)? {
        Some(raw) => Some(raw.parse().map_err(|_| StatusCode::UNAUTHORIZED)?),
        None => None,
    };

    // A vendor without a vendor identity cannot be authorized for anything.
    if role == Role::Vendor && vendor_id.is_none() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(Principal::new(user_id, role, vendor_id))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, StatusCode> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => {
            let value = value.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?.trim();
            if value.is_empty() {
                Ok(None)
            } else {
                Ok(Some(value))
            }
        }
    }
}
