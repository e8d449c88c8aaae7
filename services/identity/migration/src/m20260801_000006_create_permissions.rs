use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Permissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Permissions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Permissions::Action).string().not_null())
                    .col(ColumnDef::new(Permissions::Entity).string().not_null())
                    .col(ColumnDef::new(Permissions::Access).string().not_null())
                    .col(
                        ColumnDef::new(Permissions::Description)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Permissions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Permissions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Permissions::Table)
                    .col(Permissions::Action)
                    .col(Permissions::Entity)
                    .col(Permissions::Access)
                    .unique()
                    .name("uniq_permissions_action_entity_access")
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PermissionRoles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PermissionRoles::PermissionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PermissionRoles::RoleId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(PermissionRoles::PermissionId)
                            .col(PermissionRoles::RoleId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PermissionRoles::Table, PermissionRoles::PermissionId)
                            .to(Permissions::Table, Permissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PermissionRoles::Table, PermissionRoles::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PermissionRoles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Permissions::Table).to_owned())
            .await
    }
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

#[derive(Iden)]
enum Roles {
    Table,
    Id,
}
