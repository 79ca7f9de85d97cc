//! Caller identity middleware for protected routes.
//!
//! Authentication happens upstream; the identity provider forwards the
//! verified caller in `x-caller-id` and `x-caller-role`.

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use forwardsflow_shared::AppError;

use crate::ApiError;

/// Header carrying the caller's user id.
pub const CALLER_ID_HEADER: &str = "x-caller-id";
/// Header carrying the caller's role.
pub const CALLER_ROLE_HEADER: &str = "x-caller-role";

/// Role of the authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerRole {
    /// Small business applying for loans.
    Sme,
    /// Investor funding loans.
    Investor,
    /// Bank staff handling approvals and payments.
    BankAdmin,
    /// Platform administrator.
    SuperAdmin,
}

impl CallerRole {
    /// Parses the header value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sme" => Some(Self::Sme),
            "investor" => Some(Self::Investor),
            "bank_admin" => Some(Self::BankAdmin),
            "super_admin" => Some(Self::SuperAdmin),
            _ => None,
        }
    }

    /// Whether the role may decide loans and move money.
    #[must_use]
    pub fn is_operator(self) -> bool {
        matches!(self, Self::BankAdmin | Self::SuperAdmin)
    }
}

/// Authenticated caller, available to handlers behind [`caller_middleware`].
#[derive(Debug, Clone)]
pub struct Caller {
    /// Caller's user id.
    pub id: String,
    /// Caller's role.
    pub role: CallerRole,
}

impl Caller {
    fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let id = header(CALLER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized(format!("{CALLER_ID_HEADER} header is required")))?;
        let role = header(CALLER_ROLE_HEADER)
            .and_then(CallerRole::parse)
            .ok_or_else(|| {
                AppError::Unauthorized(format!("{CALLER_ROLE_HEADER} header is missing or unknown"))
            })?;

        Ok(Self {
            id: id.to_string(),
            role,
        })
    }

    /// Rejects callers that are not bank or platform administrators.
    pub fn require_operator(&self) -> Result<(), ApiError> {
        if self.role.is_operator() {
            Ok(())
        } else {
            Err(AppError::Forbidden("bank_admin or super_admin role required".to_string()).into())
        }
    }
}

/// Middleware that resolves the caller and stores it in request extensions.
pub async fn caller_middleware(mut request: Request, next: Next) -> Response {
    match Caller::from_headers(request.headers()) {
        Ok(caller) => {
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()).into())
    }
}
