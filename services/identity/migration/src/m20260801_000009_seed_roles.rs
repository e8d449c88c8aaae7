use sea_orm_migration::prelude::*;
use uuid::Uuid;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Seed the baseline roles and user-entity permissions. Signup depends on the
/// `user` role existing; its absence rolls back the whole signup transaction.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let user_role = Uuid::new_v4();
        let admin_role = Uuid::new_v4();

        let mut roles = Query::insert()
            .into_table(Roles::Table)
            .columns([
                Roles::Id,
                Roles::Name,
                Roles::Description,
                Roles::CreatedAt,
                Roles::UpdatedAt,
            ])
            .to_owned();
        for (id, name, description) in [
            (user_role, "user", "baseline role for every account"),
            (admin_role, "admin", "operators of the service"),
        ] {
            roles.values_panic([
                id.into(),
                name.into(),
                description.into(),
                Expr::current_timestamp().into(),
                Expr::current_timestamp().into(),
            ]);
        }
        manager.exec_stmt(roles).await?;

        let mut permissions = Query::insert()
            .into_table(Permissions::Table)
            .columns([
                Permissions::Id,
                Permissions::Action,
                Permissions::Entity,
                Permissions::Access,
                Permissions::Description,
                Permissions::CreatedAt,
                Permissions::UpdatedAt,
            ])
            .to_owned();
        let mut junctions = Query::insert()
            .into_table(PermissionRoles::Table)
            .columns([PermissionRoles::PermissionId, PermissionRoles::RoleId])
            .to_owned();
        for action in ["create", "read", "update", "delete"] {
            for access in ["own", "any"] {
                let id = Uuid::new_v4();
                permissions.values_panic([
                    id.into(),
                    action.into(),
                    "user".into(),
                    access.into(),
                    "".into(),
                    Expr::current_timestamp().into(),
                    Expr::current_timestamp().into(),
                ]);
                // Members manage their own account; admins manage anyone's.
                let role = if access == "own" { user_role } else { admin_role };
                junctions.values_panic([id.into(), role.into()]);
            }
        }
        manager.exec_stmt(permissions).await?;
        manager.exec_stmt(junctions).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Permissions::Table)
                    .and_where(Expr::col(Permissions::Entity).eq("user"))
                    .to_owned(),
            )
            .await?;
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Roles::Table)
                    .and_where(Expr::col(Roles::Name).is_in(["user", "admin"]))
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum Roles {
    Table,
    Id,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Permissions {
    Table,
    Id,
    Action,
    Entity,
    Access,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum PermissionRoles {
    Table,
    PermissionId,
    RoleId,
}
