//! Create `business_profile` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BusinessProfile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BusinessProfile::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BusinessProfile::UserId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(BusinessProfile::CompanyName)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BusinessProfile::Description).text())
                    .col(ColumnDef::new(BusinessProfile::Location).string_len(128))
                    .col(ColumnDef::new(BusinessProfile::Address).string_len(512))
                    .col(ColumnDef::new(BusinessProfile::Phone).string_len(32))
                    .col(ColumnDef::new(BusinessProfile::Website).string_len(512))
                    .col(ColumnDef::new(BusinessProfile::RegistrationCode).string_len(32))
                    .col(ColumnDef::new(BusinessProfile::ImageUrl).string_len(512))
                    .col(ColumnDef::new(BusinessProfile::WeeklySchedule).json_binary())
                    .col(
                        ColumnDef::new(BusinessProfile::Rating)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(BusinessProfile::ReviewCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BusinessProfile::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(BusinessProfile::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(BusinessProfile::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_business_profile_user")
                            .from(BusinessProfile::Table, BusinessProfile::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_business_profile_location")
                    .table(BusinessProfile::Table)
                    .col(BusinessProfile::Location)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BusinessProfile::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum BusinessProfile {
    Table,
    Id,
    UserId,
    CompanyName,
    Description,
    Location,
    Address,
    Phone,
    Website,
    RegistrationCode,
    ImageUrl,
    WeeklySchedule,
    Rating,
    ReviewCount,
    Verified,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
