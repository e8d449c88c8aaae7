use tracing::warn;
use uuid::Uuid;

use crate::domain::repository::{SessionRepository, UserRepository, VerificationRepository};
use crate::domain::types::{Session, VerificationKind};
use crate::error::IdentityError;
use crate::usecase::password::verify_password;

pub struct LoginInput {
    pub username: String,
    pub password: String,
}

pub struct LoginOutput {
    pub session: Session,
    /// Set when the account has a standing 2FA enrollment. The session exists
    /// but stays unverified until a code checks out.
    pub requires_two_factor: bool,
}

pub struct LoginUseCase<U, S, V>
where
    U: UserRepository,
    S: SessionRepository,
    V: VerificationRepository,
{
    pub users: U,
    pub sessions: S,
    pub verifications: V,
}

impl<U, S, V> LoginUseCase<U, S, V>
where
    U: UserRepository,
    S: SessionRepository,
    V: VerificationRepository,
{
    /// `None` for an unknown username, a passwordless account or a wrong
    /// password. The three cases are deliberately indistinguishable so a
    /// caller cannot probe which usernames exist.
    pub async fn execute(&self, input: LoginInput) -> Result<Option<LoginOutput>, IdentityError> {
        let Some(user) = self.users.find_by_username(&input.username).await? else {
            return Ok(None);
        };
        let Some(hash) = self.users.password_hash(user.id).await? else {
            return Ok(None);
        };
        if !verify_password(&input.password, &hash) {
            return Ok(None);
        }

        let session = self.sessions.create(user.id).await?;
        let requires_two_factor = self
            .verifications
            .exists(&user.id.to_string(), VerificationKind::TwoFactor)
            .await?;
        Ok(Some(LoginOutput {
            session,
            requires_two_factor,
        }))
    }
}

pub struct LogoutUseCase<S>
where
    S: SessionRepository,
{
    pub sessions: S,
}

impl<S> LogoutUseCase<S>
where
    S: SessionRepository,
{
    /// Best effort. A failed delete is logged and swallowed; the cookie gets
    /// cleared no matter what happened here.
    pub async fn execute(&self, session_id: Uuid) {
        if let Err(e) = self.sessions.delete(session_id).await {
            warn!(error = %e, %session_id, "failed to delete session on logout");
        }
    }
}

pub struct AuthenticateUseCase<S>
where
    S: SessionRepository,
{
    pub sessions: S,
}

impl<S> AuthenticateUseCase<S>
where
    S: SessionRepository,
{
    /// Resolve a presented session id. Expired and unknown ids both come back
    /// as `None`; the caller clears the cookie either way.
    pub async fn execute(&self, session_id: Uuid) -> Result<Option<Session>, IdentityError> {
        self.sessions.find_active(session_id).await
    }
}
