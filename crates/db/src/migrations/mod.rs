//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_user_table;
mod m20250101_000002_create_therapist_profile_table;
mod m20250101_000003_create_business_profile_table;
mod m20250101_000004_create_provider_application_table;
mod m20250101_000005_create_offer_table;
mod m20250101_000006_create_booking_table;
mod m20250101_000007_create_booking_message_table;
mod m20250101_000008_create_review_table;
mod m20250101_000009_create_contact_submission_table;
mod m20250101_000010_create_article_table;
mod m20250101_000011_add_booking_slot_uniqueness;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_user_table::Migration),
            Box::new(m20250101_000002_create_therapist_profile_table::Migration),
            Box::new(m20250101_000003_create_business_profile_table::Migration),
            Box::new(m20250101_000004_create_provider_application_table::Migration),
            Box::new(m20250101_000005_create_offer_table::Migration),
            Box::new(m20250101_000006_create_booking_table::Migration),
            Box::new(m20250101_000007_create_booking_message_table::Migration),
            Box::new(m20250101_000008_create_review_table::Migration),
            Box::new(m20250101_000009_create_contact_submission_table::Migration),
            Box::new(m20250101_000010_create_article_table::Migration),
            Box::new(m20250101_000011_add_booking_slot_uniqueness::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_names_are_unique_and_ordered() {
        let names: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_string())
            .collect();

        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names, sorted);
    }
}
