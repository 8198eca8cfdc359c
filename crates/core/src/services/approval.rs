//! Provider applications and the approval workflow.
//!
//! Approval runs as an ordered sequence of writes without a surrounding
//! transaction. Every step is safe to repeat: an existing account is
//! reused and an existing profile is updated instead of duplicated, so an
//! approval interrupted half-way can simply be retried once the
//! application is reset to pending.

use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use terapie_common::{AppError, AppResult, AuthSettings, IdGenerator, generate_temp_password};
use terapie_db::{
    entities::{
        business_profile,
        provider_application::{self, ApplicationKind, ApplicationStatus},
        therapist_profile,
        user::{self, UserRole},
    },
    repositories::{
        BusinessProfileRepository, ProviderApplicationRepository, TherapistProfileRepository,
        UserRepository,
    },
};
use tracing::{info, warn};
use validator::Validate;

use super::account::hash_password;
use super::email::{EmailDeliveryResult, EmailService};
use super::email_template::EmailTemplate;
use super::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Public application form.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationInput {
    pub kind: ApplicationKind,
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 256))]
    pub location: Option<String>,
    /// Kind-specific fields (title, specialties, company name...).
    #[serde(default)]
    pub details: Value,
}

/// Admin listing filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationFilter {
    pub kind: Option<ApplicationKind>,
    pub status: Option<ApplicationStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Request for more information from an applicant.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfoInput {
    #[validate(length(min = 1, max = 5000))]
    pub message: String,
    #[serde(default)]
    pub documents: Vec<String>,
    #[validate(length(max = 256))]
    pub subject: Option<String>,
}

/// Result of an approval.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalOutcome {
    pub application: provider_application::Model,
    pub user_id: String,
    pub profile_id: String,
    /// Whether a temporary password was issued.
    pub temp_password_issued: bool,
    pub created_account: bool,
}

fn detail_str(details: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| details.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn detail_list(details: &Value, keys: &[&str]) -> Value {
    let items = keys
        .iter()
        .find_map(|key| details.get(*key))
        .map(|v| match v {
            Value::Array(items) => items.clone(),
            Value::String(s) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
            _ => Vec::new(),
        })
        .unwrap_or_default();
    Value::Array(items)
}

const fn role_for(kind: ApplicationKind) -> UserRole {
    match kind {
        ApplicationKind::Therapist => UserRole::Therapist,
        ApplicationKind::Business => UserRole::Business,
    }
}

const fn kind_label(kind: ApplicationKind) -> &'static str {
    match kind {
        ApplicationKind::Therapist => "terapeut",
        ApplicationKind::Business => "business",
    }
}

/// Application and approval service.
#[derive(Clone)]
pub struct ApprovalService {
    application_repo: ProviderApplicationRepository,
    user_repo: UserRepository,
    therapist_repo: TherapistProfileRepository,
    business_repo: BusinessProfileRepository,
    email: EmailService,
    settings: AuthSettings,
    id_gen: IdGenerator,
}

impl ApprovalService {
    #[must_use]
    pub fn new(
        application_repo: ProviderApplicationRepository,
        user_repo: UserRepository,
        therapist_repo: TherapistProfileRepository,
        business_repo: BusinessProfileRepository,
        email: EmailService,
        settings: AuthSettings,
    ) -> Self {
        Self {
            application_repo,
            user_repo,
            therapist_repo,
            business_repo,
            email,
            settings,
            id_gen: IdGenerator::new(),
        }
    }

    /// Store a new application.
    pub async fn submit_application(
        &self,
        applicant: Option<&user::Model>,
        input: SubmitApplicationInput,
    ) -> AppResult<provider_application::Model> {
        input.validate()?;
        let details = match input.details {
            Value::Null => serde_json::json!({}),
            Value::Object(map) => Value::Object(map),
            _ => {
                return Err(AppError::Validation(
                    "details must be an object".to_string(),
                ));
            }
        };

        let application = self
            .application_repo
            .create(provider_application::ActiveModel {
                id: Set(self.id_gen.generate()),
                kind: Set(input.kind),
                user_id: Set(applicant.map(|u| u.id.clone())),
                name: Set(input.name.trim().to_string()),
                email: Set(input.email.trim().to_lowercase()),
                phone: Set(input.phone),
                location: Set(input.location),
                details: Set(details),
                status: Set(ApplicationStatus::Pending),
                reviewed_by: Set(None),
                review_note: Set(None),
                created_at: Set(Utc::now().into()),
                reviewed_at: Set(None),
            })
            .await?;

        info!(application = %application.id, kind = ?application.kind, "Application submitted");
        Ok(application)
    }

    pub async fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> AppResult<Vec<provider_application::Model>> {
        self.application_repo
            .list(
                filter.kind,
                filter.status,
                filter.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
                filter.offset.unwrap_or(0),
            )
            .await
    }

    pub async fn get_application(&self, id: &str) -> AppResult<provider_application::Model> {
        self.application_repo.get_by_id(id).await
    }

    async fn get_pending(&self, id: &str) -> AppResult<provider_application::Model> {
        let application = self.application_repo.get_by_id(id).await?;
        if application.status != ApplicationStatus::Pending {
            return Err(AppError::BadRequest(
                "Application has already been reviewed".to_string(),
            ));
        }
        Ok(application)
    }

    /// Approve an application: provision the account, the verified
    /// profile, mark the application and send the welcome email.
    pub async fn approve(&self, admin: &user::Model, id: &str) -> AppResult<ApprovalOutcome> {
        let application = self.get_pending(id).await?;
        let role = role_for(application.kind);

        let (user, temp_password, created_account) =
            self.resolve_account(&application, role).await?;
        info!(application = %application.id, user = %user.id, created_account, step = "account", "Approval step done");

        let profile_id = match application.kind {
            ApplicationKind::Therapist => self.upsert_therapist(&application, &user).await?,
            ApplicationKind::Business => self.upsert_business(&application, &user).await?,
        };
        info!(application = %application.id, profile = %profile_id, step = "profile", "Approval step done");

        let mut active: provider_application::ActiveModel = application.into();
        active.status = Set(ApplicationStatus::Approved);
        active.user_id = Set(Some(user.id.clone()));
        active.reviewed_by = Set(Some(admin.id.clone()));
        active.reviewed_at = Set(Some(Utc::now().into()));
        let application = self.application_repo.update(active).await?;
        info!(application = %application.id, step = "status", "Approval step done");

        let template = EmailTemplate::Approval {
            name: application.name.clone(),
            kind_label: kind_label(application.kind).to_string(),
            email: user.email.clone(),
            login_url: self.email.link("auth/login"),
            temp_password: temp_password.clone(),
        };
        self.email.send_best_effort(&user.email, &template).await;

        Ok(ApprovalOutcome {
            application,
            user_id: user.id,
            profile_id,
            temp_password_issued: temp_password.is_some(),
            created_account,
        })
    }

    /// Find or create the applicant's account and give it the provider role.
    async fn resolve_account(
        &self,
        application: &provider_application::Model,
        role: UserRole,
    ) -> AppResult<(user::Model, Option<String>, bool)> {
        let linked = match &application.user_id {
            Some(user_id) => self.user_repo.find_by_id(user_id).await?,
            None => None,
        };

        if let Some(user) = linked {
            let mut active: user::ActiveModel = user.into();
            active.role = Set(role);
            active.updated_at = Set(Some(Utc::now().into()));
            return Ok((self.user_repo.update(active).await?, None, false));
        }

        let temp_password = generate_temp_password(self.settings.temp_password_length);

        if let Some(user) = self.user_repo.find_by_email(&application.email).await? {
            let password_hash = match hash_password(&temp_password) {
                Ok(hash) => Some(hash),
                Err(e) => {
                    warn!(user = %user.id, error = %e, "Could not set temporary password");
                    None
                }
            };
            let issued = password_hash.is_some();
            let mut active: user::ActiveModel = user.into();
            active.role = Set(role);
            active.email_confirmed = Set(true);
            if let Some(hash) = password_hash {
                active.password_hash = Set(hash);
                active.token = Set(Some(self.id_gen.generate_token()));
                active.requires_password_change = Set(true);
            }
            active.updated_at = Set(Some(Utc::now().into()));
            let user = self.user_repo.update(active).await?;
            return Ok((user, issued.then_some(temp_password), false));
        }

        let user = self
            .user_repo
            .create(user::ActiveModel {
                id: Set(self.id_gen.generate()),
                email: Set(application.email.clone()),
                name: Set(application.name.clone()),
                phone: Set(application.phone.clone()),
                role: Set(role),
                password_hash: Set(hash_password(&temp_password)?),
                token: Set(Some(self.id_gen.generate_token())),
                requires_password_change: Set(true),
                email_confirmed: Set(true),
                notification_preferences: Set(serde_json::json!({})),
                created_at: Set(Utc::now().into()),
                ..Default::default()
            })
            .await?;
        Ok((user, Some(temp_password), true))
    }

    async fn upsert_therapist(
        &self,
        application: &provider_application::Model,
        user: &user::Model,
    ) -> AppResult<String> {
        let d = &application.details;
        let existing = self.therapist_repo.find_by_user_id(&user.id).await?;

        let mut active: therapist_profile::ActiveModel = match existing {
            Some(profile) => {
                let mut active: therapist_profile::ActiveModel = profile.into();
                active.updated_at = Set(Some(Utc::now().into()));
                active
            }
            None => therapist_profile::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user.id.clone()),
                available_slots: Set(serde_json::json!([])),
                rating: Set(0.0),
                review_count: Set(0),
                created_at: Set(Utc::now().into()),
                ..Default::default()
            },
        };

        active.name = Set(application.name.clone());
        active.title = Set(detail_str(d, &["title"]));
        active.bio = Set(detail_str(d, &["bio", "description"]));
        active.specialties = Set(detail_list(d, &["specialties"]));
        active.specializations = Set(detail_list(d, &["specializations"]));
        active.medical_code = Set(detail_str(d, &["medicalCode", "medical_code"]));
        active.location = Set(application.location.clone());
        active.price_range = Set(detail_str(d, &["priceRange", "price_range"]));
        active.languages = Set(detail_list(d, &["languages"]));
        active.education = Set(detail_list(d, &["education"]));
        active.image_url = Set(detail_str(d, &["imageUrl", "image_url"]));
        active.verified = Set(true);

        let profile = if active.id.is_unchanged() {
            self.therapist_repo.update(active).await?
        } else {
            self.therapist_repo.create(active).await?
        };
        Ok(profile.id)
    }

    async fn upsert_business(
        &self,
        application: &provider_application::Model,
        user: &user::Model,
    ) -> AppResult<String> {
        let d = &application.details;
        let existing = self.business_repo.find_by_user_id(&user.id).await?;

        let mut active: business_profile::ActiveModel = match existing {
            Some(profile) => {
                let mut active: business_profile::ActiveModel = profile.into();
                active.updated_at = Set(Some(Utc::now().into()));
                active
            }
            None => business_profile::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user.id.clone()),
                rating: Set(0.0),
                review_count: Set(0),
                created_at: Set(Utc::now().into()),
                ..Default::default()
            },
        };

        active.company_name = Set(
            detail_str(d, &["companyName", "company_name"]).unwrap_or_else(|| application.name.clone()),
        );
        active.description = Set(detail_str(d, &["description", "bio"]));
        active.location = Set(application.location.clone());
        active.address = Set(detail_str(d, &["address"]));
        active.phone = Set(application.phone.clone());
        active.website = Set(detail_str(d, &["website"]));
        active.registration_code = Set(detail_str(d, &["registrationCode", "registration_code", "cui"]));
        active.image_url = Set(detail_str(d, &["imageUrl", "image_url"]));
        active.verified = Set(true);

        let profile = if active.id.is_unchanged() {
            self.business_repo.update(active).await?
        } else {
            self.business_repo.create(active).await?
        };
        Ok(profile.id)
    }

    /// Reject a pending application.
    pub async fn reject(
        &self,
        admin: &user::Model,
        id: &str,
        reason: Option<String>,
    ) -> AppResult<provider_application::Model> {
        let application = self.get_pending(id).await?;
        let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());

        let mut active: provider_application::ActiveModel = application.into();
        active.status = Set(ApplicationStatus::Rejected);
        active.review_note = Set(reason.clone());
        active.reviewed_by = Set(Some(admin.id.clone()));
        active.reviewed_at = Set(Some(Utc::now().into()));
        let application = self.application_repo.update(active).await?;
        info!(application = %application.id, "Application rejected");

        let template = EmailTemplate::Rejection {
            name: application.name.clone(),
            reason,
        };
        self.email.send_best_effort(&application.email, &template).await;
        Ok(application)
    }

    /// Ask the applicant for documents or more information.
    pub async fn request_info(
        &self,
        id: &str,
        input: RequestInfoInput,
    ) -> AppResult<EmailDeliveryResult> {
        input.validate()?;
        let application = self.application_repo.get_by_id(id).await?;

        let documents: Vec<String> = input
            .documents
            .into_iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();

        let template = if documents.is_empty() {
            EmailTemplate::Reply {
                name: application.name.clone(),
                subject: input
                    .subject
                    .unwrap_or_else(|| "Informații suplimentare despre cererea ta".to_string()),
                message: input.message,
            }
        } else {
            EmailTemplate::DocumentRequest {
                name: application.name.clone(),
                message: input.message,
                documents,
            }
        };

        let result = self
            .email
            .send_template(&application.email, &template, Some(self.email.admin_address()))
            .await?;
        info!(application = %application.id, kind = template.kind(), success = result.success, "Information requested");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::email::RecordingTransport;
    use crate::services::test_fixtures::{executed_sql, set_clause, therapist_model, user_model};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use serde_json::json;
    use std::sync::Arc;

    fn application(kind: ApplicationKind, status: ApplicationStatus) -> provider_application::Model {
        provider_application::Model {
            id: "a1".to_string(),
            kind,
            user_id: None,
            name: "Dr. Ioana Pop".to_string(),
            email: "ioana@example.com".to_string(),
            phone: Some("0711111111".to_string()),
            location: Some("Iași".to_string()),
            details: json!({
                "title": "Psiholog clinician",
                "specialties": ["anxietate", "depresie"],
                "languages": "română, engleză",
                "medicalCode": "CPR-123"
            }),
            status,
            reviewed_by: None,
            review_note: None,
            created_at: Utc::now().into(),
            reviewed_at: None,
        }
    }

    struct Dbs {
        application: MockDatabase,
        user: MockDatabase,
        therapist: MockDatabase,
    }

    fn service(dbs: Dbs, transport: Arc<RecordingTransport>) -> ApprovalService {
        ApprovalService::new(
            ProviderApplicationRepository::new(Arc::new(dbs.application.into_connection())),
            UserRepository::new(Arc::new(dbs.user.into_connection())),
            TherapistProfileRepository::new(Arc::new(dbs.therapist.into_connection())),
            BusinessProfileRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            )),
            EmailService::new(transport, "https://terapie.ro", "Terapie", "admin@terapie.ro"),
            AuthSettings::default(),
        )
    }

    #[test]
    fn test_detail_helpers() {
        let d = json!({ "languages": "română, engleză", "specialties": ["a"], "title": "  " });
        assert_eq!(detail_list(&d, &["languages"]), json!(["română", "engleză"]));
        assert_eq!(detail_list(&d, &["specialties"]), json!(["a"]));
        assert_eq!(detail_list(&d, &["missing"]), json!([]));
        assert_eq!(detail_str(&d, &["title"]), None);
        assert_eq!(
            detail_str(&json!({ "cui": "RO1" }), &["registrationCode", "cui"]),
            Some("RO1".to_string())
        );
    }

    #[tokio::test]
    async fn test_approve_already_reviewed() {
        let dbs = Dbs {
            application: MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
                application(ApplicationKind::Therapist, ApplicationStatus::Approved),
            ]]),
            user: MockDatabase::new(DatabaseBackend::Postgres),
            therapist: MockDatabase::new(DatabaseBackend::Postgres),
        };
        let service = service(dbs, Arc::new(RecordingTransport::new()));
        let admin = user_model("admin", UserRole::Admin);

        assert!(matches!(
            service.approve(&admin, "a1").await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_approve_creates_account_and_profile() {
        let pending = application(ApplicationKind::Therapist, ApplicationStatus::Pending);
        let mut approved = pending.clone();
        approved.status = ApplicationStatus::Approved;
        approved.reviewed_by = Some("admin".to_string());

        let mut created_user = user_model("u-new", UserRole::Therapist);
        created_user.email = "ioana@example.com".to_string();

        let dbs = Dbs {
            application: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .append_query_results([[approved]]),
            user: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[created_user]]),
            therapist: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<therapist_profile::Model>::new()])
                .append_query_results([[therapist_model("t-new", "u-new")]]),
        };
        let transport = Arc::new(RecordingTransport::new());
        let service = service(dbs, transport.clone());
        let admin = user_model("admin", UserRole::Admin);

        let outcome = service.approve(&admin, "a1").await.unwrap();

        assert_eq!(outcome.application.status, ApplicationStatus::Approved);
        assert_eq!(outcome.user_id, "u-new");
        assert_eq!(outcome.profile_id, "t-new");
        assert!(outcome.created_account);
        assert!(outcome.temp_password_issued);

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ioana@example.com");
        assert!(sent[0].text_body.contains("https://terapie.ro/auth/login"));
        assert!(sent[0].text_body.contains("Parolă temporară:"));
    }

    #[tokio::test]
    async fn test_approve_reuses_existing_account_and_profile() {
        let pending = application(ApplicationKind::Therapist, ApplicationStatus::Pending);
        let mut approved = pending.clone();
        approved.status = ApplicationStatus::Approved;

        let mut existing = user_model("u-old", UserRole::Client);
        existing.email = "ioana@example.com".to_string();
        let mut promoted = existing.clone();
        promoted.role = UserRole::Therapist;
        promoted.requires_password_change = true;

        let user_conn: Arc<DatabaseConnection> = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_query_results([[promoted]])
                .into_connection(),
        );
        let therapist_conn: Arc<DatabaseConnection> = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[therapist_model("t-old", "u-old")]])
                .append_query_results([[therapist_model("t-old", "u-old")]])
                .into_connection(),
        );
        let transport = Arc::new(RecordingTransport::new());
        let service = ApprovalService::new(
            ProviderApplicationRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[pending]])
                    .append_query_results([[approved]])
                    .into_connection(),
            )),
            UserRepository::new(user_conn.clone()),
            TherapistProfileRepository::new(therapist_conn.clone()),
            BusinessProfileRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            )),
            EmailService::new(transport.clone(), "https://terapie.ro", "Terapie", "admin@terapie.ro"),
            AuthSettings::default(),
        );
        let admin = user_model("admin", UserRole::Admin);

        let outcome = service.approve(&admin, "a1").await.unwrap();
        drop(service);

        assert!(!outcome.created_account);
        assert!(outcome.temp_password_issued);
        assert_eq!(outcome.user_id, "u-old");
        assert_eq!(outcome.profile_id, "t-old");

        let user_sql = executed_sql(user_conn);
        assert!(user_sql.iter().all(|s| !s.starts_with("INSERT")));
        let update = set_clause(user_sql.iter().find(|s| s.starts_with("UPDATE")).unwrap());
        for column in ["\"password_hash\"", "\"requires_password_change\"", "\"token\"", "\"role\""] {
            assert!(update.contains(column), "{column} missing from {update}");
        }

        let profile_sql = executed_sql(therapist_conn);
        assert!(profile_sql.iter().all(|s| !s.starts_with("INSERT")));
        let update = set_clause(profile_sql.iter().find(|s| s.starts_with("UPDATE")).unwrap());
        assert!(update.contains("\"verified\""), "{update}");

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ioana@example.com");
        assert!(sent[0].text_body.contains("Parolă temporară:"));
    }

    #[tokio::test]
    async fn test_reject_records_note_and_notifies() {
        let pending = application(ApplicationKind::Business, ApplicationStatus::Pending);
        let mut rejected = pending.clone();
        rejected.status = ApplicationStatus::Rejected;
        rejected.review_note = Some("Documente incomplete".to_string());
        rejected.reviewed_by = Some("admin".to_string());

        let application_conn: Arc<DatabaseConnection> = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .append_query_results([[rejected]])
                .into_connection(),
        );
        let transport = Arc::new(RecordingTransport::new());
        let service = ApprovalService::new(
            ProviderApplicationRepository::new(application_conn.clone()),
            UserRepository::new(Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())),
            TherapistProfileRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            )),
            BusinessProfileRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            )),
            EmailService::new(transport.clone(), "https://terapie.ro", "Terapie", "admin@terapie.ro"),
            AuthSettings::default(),
        );
        let admin = user_model("admin", UserRole::Admin);

        let application = service
            .reject(&admin, "a1", Some("  Documente incomplete  ".to_string()))
            .await
            .unwrap();
        drop(service);

        assert_eq!(application.status, ApplicationStatus::Rejected);
        assert_eq!(application.review_note.as_deref(), Some("Documente incomplete"));

        let sql = executed_sql(application_conn);
        let update = set_clause(sql.iter().find(|s| s.starts_with("UPDATE")).unwrap());
        for column in ["\"status\"", "\"review_note\"", "\"reviewed_by\"", "\"reviewed_at\""] {
            assert!(update.contains(column), "{column} missing from {update}");
        }

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ioana@example.com");
        assert!(sent[0].subject.starts_with("Actualizare privind cererea ta"));
        assert!(sent[0].text_body.contains("Motiv: Documente incomplete\n"));
    }

    #[tokio::test]
    async fn test_submit_rejects_non_object_details() {
        let dbs = Dbs {
            application: MockDatabase::new(DatabaseBackend::Postgres),
            user: MockDatabase::new(DatabaseBackend::Postgres),
            therapist: MockDatabase::new(DatabaseBackend::Postgres),
        };
        let service = service(dbs, Arc::new(RecordingTransport::new()));

        let result = service
            .submit_application(
                None,
                SubmitApplicationInput {
                    kind: ApplicationKind::Business,
                    name: "Spa Relax".to_string(),
                    email: "spa@example.com".to_string(),
                    phone: None,
                    location: None,
                    details: json!(["nope"]),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_request_info_with_documents() {
        let dbs = Dbs {
            application: MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
                application(ApplicationKind::Therapist, ApplicationStatus::Pending),
            ]]),
            user: MockDatabase::new(DatabaseBackend::Postgres),
            therapist: MockDatabase::new(DatabaseBackend::Postgres),
        };
        let transport = Arc::new(RecordingTransport::new());
        let service = service(dbs, transport.clone());

        let result = service
            .request_info(
                "a1",
                RequestInfoInput {
                    message: "Mai avem nevoie de acte.".to_string(),
                    documents: vec!["Diplomă".to_string(), " ".to_string()],
                    subject: None,
                },
            )
            .await
            .unwrap();

        assert!(result.success);
        let sent = transport.sent();
        assert_eq!(sent[0].reply_to.as_deref(), Some("admin@terapie.ro"));
        assert!(sent[0].text_body.contains("- Diplomă"));
    }
}
