//! Create `booking` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Booking::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Booking::ClientId).string_len(32).not_null())
                    .col(ColumnDef::new(Booking::TherapistId).string_len(32))
                    .col(ColumnDef::new(Booking::BusinessId).string_len(32))
                    .col(ColumnDef::new(Booking::OfferId).string_len(32))
                    .col(ColumnDef::new(Booking::Date).date().not_null())
                    .col(ColumnDef::new(Booking::Time).string_len(5).not_null())
                    .col(
                        ColumnDef::new(Booking::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Booking::Notes).text())
                    .col(
                        ColumnDef::new(Booking::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Booking::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_client")
                            .from(Booking::Table, Booking::ClientId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_therapist_profile")
                            .from(Booking::Table, Booking::TherapistId)
                            .to(TherapistProfile::Table, TherapistProfile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_business_profile")
                            .from(Booking::Table, Booking::BusinessId)
                            .to(BusinessProfile::Table, BusinessProfile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_offer")
                            .from(Booking::Table, Booking::OfferId)
                            .to(Offer::Table, Offer::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booking_client_id")
                    .table(Booking::Table)
                    .col(Booking::ClientId)
                    .to_owned(),
            )
            .await?;

        // Composite indexes for the availability lookup
        manager
            .create_index(
                Index::create()
                    .name("idx_booking_therapist_date")
                    .table(Booking::Table)
                    .col(Booking::TherapistId)
                    .col(Booking::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booking_business_date")
                    .table(Booking::Table)
                    .col(Booking::BusinessId)
                    .col(Booking::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Booking {
    Table,
    Id,
    ClientId,
    TherapistId,
    BusinessId,
    OfferId,
    Date,
    Time,
    Status,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum TherapistProfile {
    Table,
    Id,
}

#[derive(Iden)]
enum BusinessProfile {
    Table,
    Id,
}

#[derive(Iden)]
enum Offer {
    Table,
    Id,
}
