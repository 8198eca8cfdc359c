//! Create `provider_application` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProviderApplication::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProviderApplication::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProviderApplication::Kind)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProviderApplication::UserId).string_len(32))
                    .col(
                        ColumnDef::new(ProviderApplication::Name)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProviderApplication::Email)
                            .string_len(320)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProviderApplication::Phone).string_len(32))
                    .col(ColumnDef::new(ProviderApplication::Location).string_len(128))
                    .col(
                        ColumnDef::new(ProviderApplication::Details)
                            .json_binary()
                            .not_null()
                            .default("{}"),
                    )
                    .col(
                        ColumnDef::new(ProviderApplication::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(ProviderApplication::ReviewedBy).string_len(32))
                    .col(ColumnDef::new(ProviderApplication::ReviewNote).text())
                    .col(
                        ColumnDef::new(ProviderApplication::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ProviderApplication::ReviewedAt)
                            .timestamp_with_time_zone(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_provider_application_reviewer")
                            .from(ProviderApplication::Table, ProviderApplication::ReviewedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: pending queue by kind
        manager
            .create_index(
                Index::create()
                    .name("idx_provider_application_status_kind")
                    .table(ProviderApplication::Table)
                    .col(ProviderApplication::Status)
                    .col(ProviderApplication::Kind)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProviderApplication::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ProviderApplication {
    Table,
    Id,
    Kind,
    UserId,
    Name,
    Email,
    Phone,
    Location,
    Details,
    Status,
    ReviewedBy,
    ReviewNote,
    CreatedAt,
    ReviewedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
