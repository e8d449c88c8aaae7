use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

use crate::domain::types::PermissionData;

/// Identity service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("not authenticated")]
    NotAuthenticated { redirect_to: Option<String> },
    #[error("recent verification required")]
    ReverificationRequired { verify_url: String },
    #[error("missing permission")]
    MissingPermission(PermissionData),
    #[error("missing role {0}")]
    MissingRole(String),
    #[error("user not found")]
    UserNotFound,
    #[error("invalid code")]
    InvalidCode,
    #[error("two-factor enrollment is managed at POST /auth/2fa")]
    UnsupportedVerificationKind,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("a user already exists with this email")]
    EmailTaken,
    #[error("a user already exists with this username")]
    UsernameTaken,
    #[error("default role missing")]
    MissingDefaultRole,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl IdentityError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotAuthenticated { .. } => "NOT_AUTHENTICATED",
            Self::ReverificationRequired { .. } => "REVERIFICATION_REQUIRED",
            Self::MissingPermission(_) => "MISSING_PERMISSION",
            Self::MissingRole(_) => "MISSING_ROLE",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::InvalidCode => "INVALID_CODE",
            Self::UnsupportedVerificationKind => "UNSUPPORTED_VERIFICATION_KIND",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::MissingDefaultRole => "MISSING_DEFAULT_ROLE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Login URL carrying the page to return to once authenticated.
    pub fn login_url(redirect_to: Option<&str>) -> String {
        match redirect_to {
            Some(dest) if !dest.is_empty() => {
                let query: String = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("redirectTo", dest)
                    .finish();
                format!("/login?{query}")
            }
            _ => "/login".to_owned(),
        }
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        // Unauthenticated and stale-2fa callers get a see-other redirect into the
        // login / verify flow instead of a JSON error.
        match &self {
            Self::NotAuthenticated { redirect_to } => {
                return Redirect::to(&Self::login_url(redirect_to.as_deref())).into_response();
            }
            Self::ReverificationRequired { verify_url } => {
                return Redirect::to(verify_url).into_response();
            }
            _ => {}
        }

        let status = match &self {
            Self::MissingPermission(_) | Self::MissingRole(_) => StatusCode::FORBIDDEN,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::InvalidCode | Self::InvalidCredentials | Self::UnsupportedVerificationKind => {
                StatusCode::BAD_REQUEST
            }
            Self::EmailTaken | Self::UsernameTaken => StatusCode::CONFLICT,
            Self::MissingDefaultRole | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotAuthenticated { .. } | Self::ReverificationRequired { .. } => unreachable!(),
        };
        // Log 500s only. 4xx are expected client errors; TraceLayer already records
        // method/uri/status for every request.
        match &self {
            Self::Internal(e) => tracing::error!(error = %e, kind = "INTERNAL", "internal error"),
            Self::MissingDefaultRole => {
                tracing::error!(kind = "MISSING_DEFAULT_ROLE", "role seed data is absent");
            }
            _ => {}
        }
        let body = match &self {
            Self::MissingPermission(permission) => serde_json::json!({
                "error": "Unauthorized",
                "requiredPermission": permission,
                "message": format!("Unauthorized: required permissions: {permission}"),
            }),
            Self::MissingRole(role) => serde_json::json!({
                "error": "Unauthorized",
                "requiredRole": role,
                "message": format!("Unauthorized: required role: {role}"),
            }),
            _ => serde_json::json!({
                "kind": self.kind(),
                "message": self.to_string(),
            }),
        };
        (status, axum::Json(body)).into_response()
    }
}
