use sea_orm::DatabaseConnection;

use crate::infra::db::{DbSessionRepository, DbUserRepository, DbVerificationRepository};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    /// External origin of the app (e.g. "https://notes.example.com"), used to
    /// build absolute verify URLs for emailed codes.
    pub public_origin: String,
    /// Cookie domain attribute.
    pub cookie_domain: String,
    /// Issuer label shown by authenticator apps.
    pub totp_issuer: String,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn session_repo(&self) -> DbSessionRepository {
        DbSessionRepository {
            db: self.db.clone(),
        }
    }

    pub fn verification_repo(&self) -> DbVerificationRepository {
        DbVerificationRepository {
            db: self.db.clone(),
        }
    }
}
