//! Back-office user administration and dashboard statistics.

use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use terapie_common::{AppError, AppResult, AuthSettings, IdGenerator, generate_temp_password};
use terapie_db::{
    entities::{
        booking::BookingStatus,
        contact_submission::SubmissionStatus,
        provider_application::ApplicationStatus,
        user::{self, UserRole},
    },
    repositories::{
        BookingRepository, ContactSubmissionRepository, ProviderApplicationRepository,
        UserRepository,
    },
};
use tracing::info;
use validator::Validate;

use super::account::hash_password;
use super::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Admin user listing filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Input for an admin-created account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminCreateUserInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    pub role: UserRole,
    /// Generated when absent.
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
}

/// Result of an admin-created account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUser {
    pub user: user::Model,
    /// Present only when generated here, for the admin to hand over.
    pub temp_password: Option<String>,
    /// The email already had an account whose password was reset.
    pub existed: bool,
}

/// Counters shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub pending_applications: u64,
    pub clients: u64,
    pub therapists: u64,
    pub businesses: u64,
    pub admins: u64,
    pub pending_bookings: u64,
    pub confirmed_bookings: u64,
    pub completed_bookings: u64,
    pub cancelled_bookings: u64,
    pub new_contacts: u64,
}

/// Admin service.
#[derive(Clone)]
pub struct AdminService {
    user_repo: UserRepository,
    application_repo: ProviderApplicationRepository,
    booking_repo: BookingRepository,
    contact_repo: ContactSubmissionRepository,
    settings: AuthSettings,
    id_gen: IdGenerator,
}

impl AdminService {
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        application_repo: ProviderApplicationRepository,
        booking_repo: BookingRepository,
        contact_repo: ContactSubmissionRepository,
        settings: AuthSettings,
    ) -> Self {
        Self {
            user_repo,
            application_repo,
            booking_repo,
            contact_repo,
            settings,
            id_gen: IdGenerator::new(),
        }
    }

    pub async fn list_users(&self, filter: &UserFilter) -> AppResult<Vec<user::Model>> {
        self.user_repo
            .list(
                filter.role,
                filter.search.as_deref(),
                filter.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
                filter.offset.unwrap_or(0),
            )
            .await
    }

    pub async fn get_user(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Change a user's role. Admins cannot change their own.
    pub async fn change_role(
        &self,
        admin: &user::Model,
        user_id: &str,
        role: UserRole,
    ) -> AppResult<user::Model> {
        if admin.id == user_id {
            return Err(AppError::BadRequest("You cannot change your own role".to_string()));
        }
        let user = self.user_repo.get_by_id(user_id).await?;
        let previous = user.role;

        let mut active: user::ActiveModel = user.into();
        active.role = Set(role);
        active.updated_at = Set(Some(Utc::now().into()));
        let user = self.user_repo.update(active).await?;

        info!(admin = %admin.id, user = %user.id, from = previous.as_str(), to = role.as_str(), "Role changed");
        Ok(user)
    }

    /// Create a confirmed account. An existing email has its password reset
    /// and its role set instead.
    pub async fn create_user(&self, input: AdminCreateUserInput) -> AppResult<CreatedUser> {
        input.validate()?;

        let generated = input.password.is_none();
        let password = input
            .password
            .unwrap_or_else(|| generate_temp_password(self.settings.temp_password_length));
        let password_hash = hash_password(&password)?;
        let temp_password = generated.then_some(password);
        let email = input.email.trim().to_lowercase();

        if let Some(existing) = self.user_repo.find_by_email(&email).await? {
            let mut active: user::ActiveModel = existing.into();
            active.password_hash = Set(password_hash);
            active.token = Set(Some(self.id_gen.generate_token()));
            active.requires_password_change = Set(true);
            active.email_confirmed = Set(true);
            active.role = Set(input.role);
            active.updated_at = Set(Some(Utc::now().into()));
            let user = self.user_repo.update(active).await?;
            info!(user = %user.id, "Existing account reset by admin");
            return Ok(CreatedUser {
                user,
                temp_password,
                existed: true,
            });
        }

        let user = self
            .user_repo
            .create(user::ActiveModel {
                id: Set(self.id_gen.generate()),
                email: Set(email),
                name: Set(input.name.trim().to_string()),
                role: Set(input.role),
                password_hash: Set(password_hash),
                token: Set(Some(self.id_gen.generate_token())),
                requires_password_change: Set(true),
                email_confirmed: Set(true),
                notification_preferences: Set(serde_json::json!({})),
                created_at: Set(Utc::now().into()),
                ..Default::default()
            })
            .await?;

        info!(user = %user.id, role = user.role.as_str(), "Account created by admin");
        Ok(CreatedUser {
            user,
            temp_password,
            existed: false,
        })
    }

    /// Delete an account. Admins cannot delete themselves.
    pub async fn delete_user(&self, admin: &user::Model, user_id: &str) -> AppResult<()> {
        if admin.id == user_id {
            return Err(AppError::BadRequest("You cannot delete your own account".to_string()));
        }
        let user = self.user_repo.get_by_id(user_id).await?;
        self.user_repo.delete(&user.id).await?;
        info!(admin = %admin.id, user = %user.id, "User deleted");
        Ok(())
    }

    pub async fn stats(&self) -> AppResult<DashboardStats> {
        Ok(DashboardStats {
            pending_applications: self
                .application_repo
                .count_by_status(ApplicationStatus::Pending)
                .await?,
            clients: self.user_repo.count_by_role(UserRole::Client).await?,
            therapists: self.user_repo.count_by_role(UserRole::Therapist).await?,
            businesses: self.user_repo.count_by_role(UserRole::Business).await?,
            admins: self.user_repo.count_by_role(UserRole::Admin).await?,
            pending_bookings: self.booking_repo.count_by_status(BookingStatus::Pending).await?,
            confirmed_bookings: self
                .booking_repo
                .count_by_status(BookingStatus::Confirmed)
                .await?,
            completed_bookings: self
                .booking_repo
                .count_by_status(BookingStatus::Completed)
                .await?,
            cancelled_bookings: self
                .booking_repo
                .count_by_status(BookingStatus::Cancelled)
                .await?,
            new_contacts: self.contact_repo.count_by_status(SubmissionStatus::New).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_fixtures::{executed_sql, set_clause, user_model};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn service(user_db: MockDatabase) -> AdminService {
        service_on(Arc::new(user_db.into_connection()))
    }

    fn service_on(user_conn: Arc<DatabaseConnection>) -> AdminService {
        let empty = || Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        AdminService::new(
            UserRepository::new(user_conn),
            ProviderApplicationRepository::new(empty()),
            BookingRepository::new(empty()),
            ContactSubmissionRepository::new(empty()),
            AuthSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_admin_cannot_delete_self() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));
        let admin = user_model("admin", UserRole::Admin);

        assert!(matches!(
            service.delete_user(&admin, "admin").await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_cannot_change_own_role() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));
        let admin = user_model("admin", UserRole::Admin);

        assert!(matches!(
            service.change_role(&admin, "admin", UserRole::Client).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_create_user_existing_email_resets_password() {
        let existing = user_model("u1", UserRole::Client);
        let mut updated = existing.clone();
        updated.role = UserRole::Therapist;
        updated.requires_password_change = true;

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_query_results([[updated]]),
        );

        let created = service
            .create_user(AdminCreateUserInput {
                email: "u1@example.com".to_string(),
                name: "User u1".to_string(),
                role: UserRole::Therapist,
                password: None,
            })
            .await
            .unwrap();

        assert!(created.existed);
        assert_eq!(created.user.role, UserRole::Therapist);
        assert_eq!(created.temp_password.map(|p| p.len()), Some(12));
    }

    #[tokio::test]
    async fn test_create_user_existing_email_rotates_session_token() {
        let existing = user_model("u1", UserRole::Client);
        let conn = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing.clone()]])
                .append_query_results([[existing]])
                .into_connection(),
        );
        let service = service_on(conn.clone());

        service
            .create_user(AdminCreateUserInput {
                email: "u1@example.com".to_string(),
                name: "User u1".to_string(),
                role: UserRole::Client,
                password: Some("password123".to_string()),
            })
            .await
            .unwrap();
        drop(service);

        let sql = executed_sql(conn);
        let update = set_clause(sql.iter().find(|s| s.starts_with("UPDATE")).unwrap());
        assert!(update.contains("\"token\""), "{update}");
        assert!(update.contains("\"password_hash\""), "{update}");
    }

    #[tokio::test]
    async fn test_create_user_with_given_password_returns_no_temp() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[user_model("u2", UserRole::Business)]]),
        );

        let created = service
            .create_user(AdminCreateUserInput {
                email: "new@example.com".to_string(),
                name: "Spa".to_string(),
                role: UserRole::Business,
                password: Some("password123".to_string()),
            })
            .await
            .unwrap();

        assert!(!created.existed);
        assert_eq!(created.temp_password, None);
    }
}
