//! Forbid two live bookings for the same provider slot.
//!
//! Partial unique indexes cannot be expressed with the schema builder,
//! so raw SQL is used. Cancelled bookings free their slot.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_booking_therapist_slot
            ON booking (therapist_id, date, time)
            WHERE therapist_id IS NOT NULL AND status <> 'cancelled'
            ",
        )
        .await?;

        db.execute_unprepared(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_booking_business_slot
            ON booking (business_id, date, time)
            WHERE therapist_id IS NULL AND business_id IS NOT NULL AND status <> 'cancelled'
            ",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP INDEX IF EXISTS idx_booking_therapist_slot")
            .await?;
        db.execute_unprepared("DROP INDEX IF EXISTS idx_booking_business_slot")
            .await?;

        Ok(())
    }
}
