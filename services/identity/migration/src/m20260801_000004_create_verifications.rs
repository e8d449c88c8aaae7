use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Verifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Verifications::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Verifications::Kind).string().not_null())
                    .col(ColumnDef::new(Verifications::Target).string().not_null())
                    .col(ColumnDef::new(Verifications::Secret).string().not_null())
                    .col(ColumnDef::new(Verifications::Algorithm).string().not_null())
                    .col(ColumnDef::new(Verifications::Digits).integer().not_null())
                    .col(
                        ColumnDef::new(Verifications::Period)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Verifications::CharSet).string().not_null())
                    .col(
                        ColumnDef::new(Verifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Verifications::ExpiresAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // One live challenge per (target, kind) — prepare upserts against this.
        manager
            .create_index(
                Index::create()
                    .table(Verifications::Table)
                    .col(Verifications::Target)
                    .col(Verifications::Kind)
                    .unique()
                    .name("uniq_verifications_target_kind")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Verifications::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Verifications {
    Table,
    Id,
    Kind,
    Target,
    Secret,
    Algorithm,
    Digits,
    Period,
    CharSet,
    CreatedAt,
    ExpiresAt,
}
