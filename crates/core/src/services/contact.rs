//! Contact form submissions.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use terapie_common::{AppError, AppResult, IdGenerator};
use terapie_db::{
    entities::contact_submission::{self, SubmissionStatus},
    repositories::ContactSubmissionRepository,
};
use tracing::{info, warn};
use validator::Validate;

use super::email::EmailService;
use super::email_template::EmailTemplate;
use super::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Public contact form.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 256))]
    pub subject: String,
    #[validate(length(min = 1, max = 10000))]
    pub message: String,
}

/// Admin reply to a submission.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactReplyInput {
    #[validate(length(min = 1, max = 256))]
    pub subject: String,
    #[validate(length(min = 1, max = 10000))]
    pub message: String,
}

/// Contact service.
#[derive(Clone)]
pub struct ContactService {
    contact_repo: ContactSubmissionRepository,
    email: EmailService,
    id_gen: IdGenerator,
}

impl ContactService {
    #[must_use]
    pub const fn new(contact_repo: ContactSubmissionRepository, email: EmailService) -> Self {
        Self {
            contact_repo,
            email,
            id_gen: IdGenerator::new(),
        }
    }

    /// Store a submission and forward it to the admin inbox.
    pub async fn submit_contact(&self, input: ContactInput) -> AppResult<contact_submission::Model> {
        input.validate()?;

        let submission = self
            .contact_repo
            .create(contact_submission::ActiveModel {
                id: Set(self.id_gen.generate()),
                name: Set(input.name.trim().to_string()),
                email: Set(input.email.trim().to_string()),
                subject: Set(input.subject.trim().to_string()),
                message: Set(input.message.trim().to_string()),
                status: Set(SubmissionStatus::New),
                reply: Set(None),
                replied_at: Set(None),
                created_at: Set(Utc::now().into()),
            })
            .await?;

        let template = EmailTemplate::ContactNotification {
            name: submission.name.clone(),
            email: submission.email.clone(),
            subject: submission.subject.clone(),
            message: submission.message.clone(),
        };
        if let Err(e) = self
            .email
            .send_template(self.email.admin_address(), &template, Some(&submission.email))
            .await
        {
            warn!(contact = %submission.id, error = %e, "Could not forward contact submission");
        }

        info!(contact = %submission.id, "Contact submission received");
        Ok(submission)
    }

    pub async fn list_contacts(
        &self,
        status: Option<SubmissionStatus>,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> AppResult<Vec<contact_submission::Model>> {
        self.contact_repo
            .list(
                status,
                limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
                offset.unwrap_or(0),
            )
            .await
    }

    pub async fn update_contact_status(
        &self,
        id: &str,
        status: SubmissionStatus,
    ) -> AppResult<contact_submission::Model> {
        let submission = self.contact_repo.get_by_id(id).await?;
        let mut active: contact_submission::ActiveModel = submission.into();
        active.status = Set(status);
        self.contact_repo.update(active).await
    }

    /// Email the sender and resolve the submission.
    pub async fn reply_contact(
        &self,
        id: &str,
        input: ContactReplyInput,
    ) -> AppResult<contact_submission::Model> {
        input.validate()?;
        let submission = self.contact_repo.get_by_id(id).await?;

        let template = EmailTemplate::Reply {
            name: submission.name.clone(),
            subject: input.subject,
            message: input.message.clone(),
        };
        let result = self
            .email
            .send_template(&submission.email, &template, Some(self.email.admin_address()))
            .await?;
        if !result.success {
            return Err(AppError::Email(
                result.error.unwrap_or_else(|| "Reply was not delivered".to_string()),
            ));
        }

        let mut active: contact_submission::ActiveModel = submission.into();
        active.status = Set(SubmissionStatus::Resolved);
        active.reply = Set(Some(input.message));
        active.replied_at = Set(Some(Utc::now().into()));
        let submission = self.contact_repo.update(active).await?;

        info!(contact = %submission.id, "Contact submission answered");
        Ok(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::email::RecordingTransport;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn submission(status: SubmissionStatus) -> contact_submission::Model {
        contact_submission::Model {
            id: "cs1".to_string(),
            name: "Maria".to_string(),
            email: "maria@example.com".to_string(),
            subject: "Întrebare".to_string(),
            message: "Cum mă programez?".to_string(),
            status,
            reply: None,
            replied_at: None,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase, transport: Arc<RecordingTransport>) -> ContactService {
        ContactService::new(
            ContactSubmissionRepository::new(Arc::new(db.into_connection())),
            EmailService::new(transport, "https://terapie.ro", "Terapie", "contact@terapie.ro"),
        )
    }

    #[tokio::test]
    async fn test_submit_forwards_to_admin_with_reply_to() {
        let transport = Arc::new(RecordingTransport::new());
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[submission(SubmissionStatus::New)]]),
            transport.clone(),
        );

        service
            .submit_contact(ContactInput {
                name: "Maria".to_string(),
                email: "maria@example.com".to_string(),
                subject: "Întrebare".to_string(),
                message: "Cum mă programez?".to_string(),
            })
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "contact@terapie.ro");
        assert_eq!(sent[0].reply_to.as_deref(), Some("maria@example.com"));
    }

    #[tokio::test]
    async fn test_reply_resolves_submission() {
        let mut resolved = submission(SubmissionStatus::Resolved);
        resolved.reply = Some("Din pagina terapeutului.".to_string());

        let transport = Arc::new(RecordingTransport::new());
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[submission(SubmissionStatus::New)]])
                .append_query_results([[resolved]]),
            transport.clone(),
        );

        let updated = service
            .reply_contact(
                "cs1",
                ContactReplyInput {
                    subject: "Re: Întrebare".to_string(),
                    message: "Din pagina terapeutului.".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, SubmissionStatus::Resolved);
        assert_eq!(transport.sent()[0].subject, "Re: Întrebare");
    }

    #[tokio::test]
    async fn test_reply_refused_keeps_submission_open() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[submission(SubmissionStatus::New)]]),
            Arc::new(RecordingTransport::refusing()),
        );

        let result = service
            .reply_contact(
                "cs1",
                ContactReplyInput {
                    subject: "Re".to_string(),
                    message: "Salut".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Email(_))));
    }
}
