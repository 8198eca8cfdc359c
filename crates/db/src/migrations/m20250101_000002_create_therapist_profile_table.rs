//! Create `therapist_profile` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TherapistProfile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TherapistProfile::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TherapistProfile::UserId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(TherapistProfile::Name)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TherapistProfile::Title).string_len(256))
                    .col(ColumnDef::new(TherapistProfile::Bio).text())
                    .col(
                        ColumnDef::new(TherapistProfile::Specialties)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(TherapistProfile::Specializations)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(TherapistProfile::MedicalCode).string_len(64))
                    .col(ColumnDef::new(TherapistProfile::Location).string_len(128))
                    .col(ColumnDef::new(TherapistProfile::PriceRange).string_len(64))
                    .col(
                        ColumnDef::new(TherapistProfile::Languages)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(TherapistProfile::Education)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(TherapistProfile::Availability).string_len(256))
                    .col(ColumnDef::new(TherapistProfile::WeeklySchedule).json_binary())
                    .col(
                        ColumnDef::new(TherapistProfile::AvailableSlots)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(TherapistProfile::ImageUrl).string_len(512))
                    .col(
                        ColumnDef::new(TherapistProfile::Rating)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(TherapistProfile::ReviewCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TherapistProfile::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TherapistProfile::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(TherapistProfile::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_therapist_profile_user")
                            .from(TherapistProfile::Table, TherapistProfile::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: location filter
        manager
            .create_index(
                Index::create()
                    .name("idx_therapist_profile_location")
                    .table(TherapistProfile::Table)
                    .col(TherapistProfile::Location)
                    .to_owned(),
            )
            .await?;

        // Index: default listing order
        manager
            .create_index(
                Index::create()
                    .name("idx_therapist_profile_rating")
                    .table(TherapistProfile::Table)
                    .col(TherapistProfile::Rating)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TherapistProfile::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TherapistProfile {
    Table,
    Id,
    UserId,
    Name,
    Title,
    Bio,
    Specialties,
    Specializations,
    MedicalCode,
    Location,
    PriceRange,
    Languages,
    Education,
    Availability,
    WeeklySchedule,
    AvailableSlots,
    ImageUrl,
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
