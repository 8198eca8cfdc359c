//! Create `offer` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Offer::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Offer::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Offer::TherapistId).string_len(32))
                    .col(ColumnDef::new(Offer::BusinessId).string_len(32))
                    .col(ColumnDef::new(Offer::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Offer::Description).text())
                    .col(ColumnDef::new(Offer::LongDescription).text())
                    .col(ColumnDef::new(Offer::Price).integer().not_null())
                    .col(ColumnDef::new(Offer::OriginalPrice).integer())
                    .col(ColumnDef::new(Offer::Location).string_len(128))
                    .col(ColumnDef::new(Offer::Duration).string_len(64))
                    .col(ColumnDef::new(Offer::Category).string_len(64))
                    .col(
                        ColumnDef::new(Offer::Tags)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(Offer::ImageUrl).string_len(512))
                    .col(ColumnDef::new(Offer::Validity).string_len(64))
                    .col(
                        ColumnDef::new(Offer::Availability)
                            .json_binary()
                            .not_null()
                            .default("{}"),
                    )
                    .col(
                        ColumnDef::new(Offer::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Offer::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Offer::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_offer_therapist_profile")
                            .from(Offer::Table, Offer::TherapistId)
                            .to(TherapistProfile::Table, TherapistProfile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_offer_business_profile")
                            .from(Offer::Table, Offer::BusinessId)
                            .to(BusinessProfile::Table, BusinessProfile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_offer_therapist_id")
                    .table(Offer::Table)
                    .col(Offer::TherapistId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_offer_business_id")
                    .table(Offer::Table)
                    .col(Offer::BusinessId)
                    .to_owned(),
            )
            .await?;

        // Index: public catalogue filters
        manager
            .create_index(
                Index::create()
                    .name("idx_offer_active_category")
                    .table(Offer::Table)
                    .col(Offer::Active)
                    .col(Offer::Category)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Offer::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Offer {
    Table,
    Id,
    TherapistId,
    BusinessId,
    Title,
    Description,
    LongDescription,
    Price,
    OriginalPrice,
    Location,
    Duration,
    Category,
    Tags,
    ImageUrl,
    Validity,
    Availability,
    Active,
    CreatedAt,
    UpdatedAt,
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
