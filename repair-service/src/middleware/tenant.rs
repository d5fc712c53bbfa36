//! Tenant context for multi-tenancy support.
//!
//! The gateway authenticates the caller and forwards the organization, user
//! and role as headers. The organization is never read from request bodies.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use repair_core::error::AppError;

use crate::models::UserRole;

pub const ORG_ID_HEADER: &str = "X-Org-ID";
pub const USER_ID_HEADER: &str = "X-User-ID";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

#[derive(Debug, Clone)]
pub struct TenantContext {
    pub org_id: String,
    pub user_id: Option<String>,
    pub role: Option<UserRole>,
}

impl TenantContext {
    /// Reject the request unless the caller carries one of `allowed`.
    pub fn require_role(&self, allowed: &[UserRole]) -> Result<(), AppError> {
        match self.role {
            Some(role) if allowed.contains(&role) => Ok(()),
            role => {
                tracing::warn!(
                    org_id = %self.org_id,
                    user_id = ?self.user_id,
                    role = ?role,
                    "Insufficient role"
                );
                Err(AppError::Forbidden(anyhow::anyhow!(
                    "Not authorized for this action"
                )))
            }
        }
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let org_id = header(parts, ORG_ID_HEADER).ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing X-Org-ID header"))
        })?;
        let user_id = header(parts, USER_ID_HEADER).map(str::to_string);
        let role = header(parts, USER_ROLE_HEADER).and_then(UserRole::parse);

        let span = tracing::Span::current();
        span.record("org_id", org_id);
        if let Some(ref uid) = user_id {
            span.record("user_id", uid.as_str());
        }

        Ok(TenantContext {
            org_id: org_id.to_string(),
            user_id,
            role,
        })
    }
}
