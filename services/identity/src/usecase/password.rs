use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::domain::repository::{UserRepository, VerificationRepository};
use crate::domain::types::VerificationKind;
use crate::error::IdentityError;

pub fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Internal(anyhow::anyhow!("hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub struct ResetPasswordInput {
    /// Email or username, matching what the reset code was issued against.
    pub target: String,
    pub code: String,
    pub new_password: String,
}

/// Checks and burns a reset-password code, then replaces the stored hash.
pub struct ResetPasswordUseCase<U, V>
where
    U: UserRepository,
    V: VerificationRepository,
{
    pub users: U,
    pub verifications: V,
}

impl<U, V> ResetPasswordUseCase<U, V>
where
    U: UserRepository,
    V: VerificationRepository,
{
    pub async fn execute(&self, input: ResetPasswordInput) -> Result<(), IdentityError> {
        let Some(verification) = self
            .verifications
            .find_active(&input.target, VerificationKind::ResetPassword)
            .await?
        else {
            return Err(IdentityError::InvalidCode);
        };
        if !verification.totp.verify(&input.code) {
            return Err(IdentityError::InvalidCode);
        }

        // Resolve the account before burning the code so a lookup failure
        // leaves the challenge usable.
        let user = match self.users.find_by_email(&input.target).await? {
            Some(user) => Some(user),
            None => self.users.find_by_username(&input.target).await?,
        };
        // An unknown target answers like a bad code; resets must not confirm
        // which accounts exist.
        let Some(user) = user else {
            return Err(IdentityError::InvalidCode);
        };

        self.verifications
            .delete(&input.target, VerificationKind::ResetPassword)
            .await?;
        let hash = hash_password(&input.new_password)?;
        self.users.set_password_hash(user.id, &hash).await?;
        Ok(())
    }
}
