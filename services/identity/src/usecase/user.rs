use uuid::Uuid;

use crate::domain::repository::UserRepository;
use crate::domain::types::User;
use crate::error::IdentityError;
use crate::usecase::permission::{require_permission, require_role};

/// Admin-only roster of all accounts.
pub struct ListUsersUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
}

impl<U> ListUsersUseCase<U>
where
    U: UserRepository,
{
    pub async fn execute(&self, actor: Uuid) -> Result<Vec<User>, IdentityError> {
        require_role(&self.users, actor, "admin").await?;
        self.users.list().await
    }
}

/// Delete an account. Self-deletion needs `delete:user:own`; deleting someone
/// else needs `delete:user:any`.
pub struct DeleteUserUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
}

impl<U> DeleteUserUseCase<U>
where
    U: UserRepository,
{
    pub async fn execute(&self, actor: Uuid, username: &str) -> Result<(), IdentityError> {
        let target = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(IdentityError::UserNotFound)?;
        let required = if actor == target.id {
            "delete:user:own"
        } else {
            "delete:user:any"
        };
        require_permission(&self.users, actor, required).await?;
        self.users.delete(target.id).await?;
        Ok(())
    }
}
