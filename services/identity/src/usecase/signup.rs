use crate::domain::repository::{NewUser, UserRepository, VerificationRepository};
use crate::domain::types::{Session, VerificationKind};
use crate::error::IdentityError;
use crate::usecase::password::hash_password;

pub struct SignupInput {
    pub email: String,
    pub username: String,
    pub name: Option<String>,
    pub password: String,
    /// The onboarding code that was emailed to `email`.
    pub code: String,
}

/// Password signup. The email must carry an unexpired onboarding code; the
/// code is burnt before any row is written.
pub struct SignupUseCase<U, V>
where
    U: UserRepository,
    V: VerificationRepository,
{
    pub users: U,
    pub verifications: V,
}

impl<U, V> SignupUseCase<U, V>
where
    U: UserRepository,
    V: VerificationRepository,
{
    pub async fn execute(&self, input: SignupInput) -> Result<Session, IdentityError> {
        let Some(verification) = self
            .verifications
            .find_active(&input.email, VerificationKind::Onboarding)
            .await?
        else {
            return Err(IdentityError::InvalidCode);
        };
        if !verification.totp.verify(&input.code) {
            return Err(IdentityError::InvalidCode);
        }

        // Uniqueness first: a conflict must not burn a still-good code.
        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(IdentityError::EmailTaken);
        }
        if self.users.find_by_username(&input.username).await?.is_some() {
            return Err(IdentityError::UsernameTaken);
        }

        self.verifications
            .delete(&input.email, VerificationKind::Onboarding)
            .await?;

        let hash = hash_password(&input.password)?;
        let user = NewUser {
            email: input.email,
            username: input.username,
            name: input.name,
        };
        self.users.create_with_password(&user, &hash).await
    }
}

pub struct SignupWithConnectionInput {
    pub email: String,
    pub username: String,
    pub name: Option<String>,
    pub provider_name: String,
    pub provider_id: String,
}

/// Signup anchored to an external provider identity. No onboarding code: the
/// provider already attested the email.
pub struct SignupWithConnectionUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
}

impl<U> SignupWithConnectionUseCase<U>
where
    U: UserRepository,
{
    pub async fn execute(
        &self,
        input: SignupWithConnectionInput,
    ) -> Result<Session, IdentityError> {
        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(IdentityError::EmailTaken);
        }
        if self.users.find_by_username(&input.username).await?.is_some() {
            return Err(IdentityError::UsernameTaken);
        }
        let user = NewUser {
            email: input.email,
            username: input.username,
            name: input.name,
        };
        self.users
            .create_with_connection(&user, &input.provider_name, &input.provider_id)
            .await
    }
}
