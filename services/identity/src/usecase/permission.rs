use uuid::Uuid;

use crate::domain::repository::UserRepository;
use crate::domain::types::PermissionData;
use crate::error::IdentityError;

/// Fail with a 403 envelope unless the user holds a permission matching the
/// given `action:entity[:access,...]` string.
pub async fn require_permission<U>(
    users: &U,
    user_id: Uuid,
    permission: &str,
) -> Result<(), IdentityError>
where
    U: UserRepository,
{
    let data: PermissionData = permission
        .parse()
        .map_err(|e| IdentityError::Internal(anyhow::Error::new(e)))?;
    if users.has_permission(user_id, &data).await? {
        Ok(())
    } else {
        Err(IdentityError::MissingPermission(data))
    }
}

/// Fail with a 403 envelope unless the user holds the named role.
pub async fn require_role<U>(users: &U, user_id: Uuid, role: &str) -> Result<(), IdentityError>
where
    U: UserRepository,
{
    if users.has_role(user_id, role).await? {
        Ok(())
    } else {
        Err(IdentityError::MissingRole(role.to_owned()))
    }
}
