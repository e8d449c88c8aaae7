#![allow(async_fn_in_trait)]

use uuid::Uuid;

use crate::domain::types::{
    OutboxEvent, PermissionData, Session, User, Verification, VerificationKind,
};
use crate::error::IdentityError;

/// Everything we need to know about a new account before any row exists.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub name: Option<String>,
}

/// Repository for user accounts, their credentials and their grants.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, IdentityError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, IdentityError>;

    async fn list(&self) -> Result<Vec<User>, IdentityError>;

    /// The stored argon2 hash, or `None` when the account has no password
    /// (connection-only accounts).
    async fn password_hash(&self, user_id: Uuid) -> Result<Option<String>, IdentityError>;

    async fn set_password_hash(&self, user_id: Uuid, hash: &str) -> Result<(), IdentityError>;

    /// Create the user, its password row, its default `user` role grant and a
    /// first session, all in one transaction. A missing `user` role rolls the
    /// whole thing back with [`IdentityError::MissingDefaultRole`].
    async fn create_with_password(
        &self,
        user: &NewUser,
        password_hash: &str,
    ) -> Result<Session, IdentityError>;

    /// Same as [`create_with_password`](Self::create_with_password) but the
    /// account is anchored to an external provider identity instead of a
    /// password.
    async fn create_with_connection(
        &self,
        user: &NewUser,
        provider_name: &str,
        provider_id: &str,
    ) -> Result<Session, IdentityError>;

    /// Delete a user. Sessions, password, connections and role grants go with
    /// it (cascade). Returns `true` if a row was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, IdentityError>;

    async fn has_role(&self, user_id: Uuid, role: &str) -> Result<bool, IdentityError>;

    /// Whether any of the user's roles carries a permission matching
    /// action/entity and, if given, one of the access levels.
    async fn has_permission(
        &self,
        user_id: Uuid,
        permission: &PermissionData,
    ) -> Result<bool, IdentityError>;
}

/// Repository for login sessions.
pub trait SessionRepository: Send + Sync {
    /// Insert a fresh session expiring [`SESSION_TTL_SECS`] from now.
    ///
    /// [`SESSION_TTL_SECS`]: crate::domain::types::SESSION_TTL_SECS
    async fn create(&self, user_id: Uuid) -> Result<Session, IdentityError>;

    /// Find a session that has not expired yet. Expired rows are invisible
    /// here; they are garbage, not state.
    async fn find_active(&self, id: Uuid) -> Result<Option<Session>, IdentityError>;

    /// Delete a session. Returns `true` if a row was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, IdentityError>;

    /// Stamp the session as having just passed a 2FA check.
    async fn mark_verified(&self, id: Uuid) -> Result<(), IdentityError>;
}

/// Repository for one-time-code challenges.
pub trait VerificationRepository: Send + Sync {
    /// Insert or replace the row for (target, kind). A re-request always wins;
    /// the previous code dies with the previous secret.
    async fn upsert(&self, verification: &Verification) -> Result<(), IdentityError>;

    /// Same as [`upsert`](Self::upsert) plus an outbox event in the same
    /// transaction, for codes delivered out of band.
    async fn upsert_with_outbox(
        &self,
        verification: &Verification,
        event: &OutboxEvent,
    ) -> Result<(), IdentityError>;

    /// Find the challenge for (target, kind) if one exists and has not
    /// expired. Absent and expired are indistinguishable to callers.
    async fn find_active(
        &self,
        target: &str,
        kind: VerificationKind,
    ) -> Result<Option<Verification>, IdentityError>;

    /// Whether an active challenge exists for (target, kind).
    async fn exists(&self, target: &str, kind: VerificationKind) -> Result<bool, IdentityError>;

    /// Delete the challenge for (target, kind). Returns `true` if a row was
    /// deleted.
    async fn delete(&self, target: &str, kind: VerificationKind) -> Result<bool, IdentityError>;
}
