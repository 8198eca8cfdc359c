//! Create `booking_message` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BookingMessage::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BookingMessage::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BookingMessage::BookingId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BookingMessage::SenderId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BookingMessage::Content).text().not_null())
                    .col(ColumnDef::new(BookingMessage::ReadAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(BookingMessage::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_message_booking")
                            .from(BookingMessage::Table, BookingMessage::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_message_sender")
                            .from(BookingMessage::Table, BookingMessage::SenderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Composite index for the per-booking thread
        manager
            .create_index(
                Index::create()
                    .name("idx_booking_message_thread")
                    .table(BookingMessage::Table)
                    .col(BookingMessage::BookingId)
                    .col(BookingMessage::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BookingMessage::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum BookingMessage {
    Table,
    Id,
    BookingId,
    SenderId,
    Content,
    ReadAt,
    CreatedAt,
}

#[derive(Iden)]
enum Booking {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
