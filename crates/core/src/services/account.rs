//! Account service: signup, sign-in, sessions and password management.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use terapie_common::{AppError, AppResult, AuthSettings, IdGenerator, hash_token};
use terapie_db::{
    entities::user::{self, UserRole},
    repositories::UserRepository,
};
use tracing::{info, warn};
use validator::Validate;

use super::email::EmailService;
use super::email_template::EmailTemplate;

/// Warning code returned when the confirmation email could not be delivered.
pub const EMAIL_RESTRICTED: &str = "EMAIL_RESTRICTED";

/// Account service.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    email: EmailService,
    settings: AuthSettings,
    id_gen: IdGenerator,
}

/// Input for self-registration.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[serde(default)]
    pub role: Option<UserRole>,

    /// Path to continue to after confirmation.
    #[validate(length(max = 512))]
    pub redirect: Option<String>,
}

/// Result of a signup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupOutcome {
    pub user: user::Model,
    pub email_sent: bool,
    /// Present when the confirmation email did not reach the user.
    pub confirmation_url: Option<String>,
    pub warning: Option<&'static str>,
}

/// Result of a successful sign-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: user::Model,
    pub token: String,
    pub requires_password_change: bool,
}

/// Input for account settings.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsInput {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,

    #[validate(length(max = 32))]
    pub phone: Option<String>,

    /// Merged key by key into the stored preferences.
    pub notification_preferences: Option<serde_json::Map<String, serde_json::Value>>,

    #[validate(url)]
    pub avatar_url: Option<String>,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(user_repo: UserRepository, email: EmailService, settings: AuthSettings) -> Self {
        Self {
            user_repo,
            email,
            settings,
            id_gen: IdGenerator::new(),
        }
    }

    fn check_password_length(&self, password: &str) -> AppResult<()> {
        if password.chars().count() < self.settings.min_password_length {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                self.settings.min_password_length
            )));
        }
        Ok(())
    }

    /// Register a client account and send the confirmation email.
    pub async fn signup(&self, input: SignupInput) -> AppResult<SignupOutcome> {
        input.validate()?;
        self.check_password_length(&input.password)?;

        let role = input.role.unwrap_or_default();
        if role != UserRole::Client {
            return Err(AppError::Forbidden(
                "Therapist and business accounts are created through an application".to_string(),
            ));
        }

        let email = input.email.trim().to_lowercase();
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let confirmation_token = self.id_gen.generate_link_token();
        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(email.clone()),
            name: Set(input.name.trim().to_string()),
            role: Set(UserRole::Client),
            password_hash: Set(hash_password(&input.password)?),
            token: Set(Some(self.id_gen.generate_token())),
            requires_password_change: Set(false),
            email_confirmed: Set(false),
            confirmation_token_hash: Set(Some(hash_token(&confirmation_token))),
            notification_preferences: Set(serde_json::json!({})),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let user = self.user_repo.create(model).await?;

        let url = self.confirmation_url(&confirmation_token, input.redirect.as_deref());
        let template = EmailTemplate::Confirmation {
            name: user.name.clone(),
            url: url.clone(),
        };

        let email_sent = match self.email.send_template(&email, &template, None).await {
            Ok(result) => result.success && self.email.delivers(),
            Err(e) => {
                warn!(user = %user.id, error = %e, "Confirmation email failed");
                false
            }
        };

        info!(user = %user.id, email_sent, "Client account registered");

        Ok(SignupOutcome {
            user,
            email_sent,
            confirmation_url: (!email_sent).then_some(url),
            warning: (!email_sent).then_some(EMAIL_RESTRICTED),
        })
    }

    fn confirmation_url(&self, token: &str, redirect: Option<&str>) -> String {
        let mut url = self.email.link(&format!("auth/confirm?token={token}"));
        if let Some(next) = redirect.filter(|r| r.starts_with('/')) {
            url.push_str("&next=");
            url.push_str(&urlencoding::encode(next));
        }
        url
    }

    /// Confirm an email address from the link token.
    pub async fn confirm_email(&self, token: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_confirmation_hash(&hash_token(token))
            .await?
            .ok_or_else(|| {
                AppError::BadRequest("Invalid or already used confirmation link".to_string())
            })?;

        let mut active: user::ActiveModel = user.into();
        active.email_confirmed = Set(true);
        active.confirmation_token_hash = Set(None);
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await
    }

    /// Sign in with email and password.
    pub async fn signin(&self, email: &str, password: &str) -> AppResult<Session> {
        let user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        if !user.email_confirmed {
            return Err(AppError::Forbidden("Email address not confirmed".to_string()));
        }

        let (user, token) = match user.token.clone() {
            Some(token) => (user, token),
            None => self.rotate_token(user).await?,
        };

        Ok(Session {
            requires_password_change: user.requires_password_change,
            user,
            token,
        })
    }

    /// Resolve a bearer token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Invalidate the current session token.
    pub async fn signout(&self, user: user::Model) -> AppResult<()> {
        self.rotate_token(user).await?;
        Ok(())
    }

    async fn rotate_token(&self, user: user::Model) -> AppResult<(user::Model, String)> {
        let token = self.id_gen.generate_token();
        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(token.clone()));
        let user = self.user_repo.update(active).await?;
        Ok((user, token))
    }

    /// Change the password of a signed-in user. Returns a fresh session.
    pub async fn change_password(
        &self,
        user: user::Model,
        current: &str,
        new_password: &str,
    ) -> AppResult<Session> {
        self.check_password_length(new_password)?;

        if !verify_password(current, &user.password_hash)? {
            return Err(AppError::BadRequest("Current password is incorrect".to_string()));
        }

        let token = self.id_gen.generate_token();
        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(hash_password(new_password)?);
        active.requires_password_change = Set(false);
        active.token = Set(Some(token.clone()));
        active.updated_at = Set(Some(Utc::now().into()));
        let user = self.user_repo.update(active).await?;

        info!(user = %user.id, "Password changed");

        Ok(Session {
            requires_password_change: false,
            user,
            token,
        })
    }

    /// Email a reset link. Unknown addresses are silently ignored.
    pub async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        let Some(user) = self.user_repo.find_by_email(email.trim()).await? else {
            info!("Password reset requested for unknown address");
            return Ok(());
        };

        let token = self.id_gen.generate_link_token();
        let expires_at = Utc::now() + Duration::minutes(self.settings.reset_token_ttl_minutes);

        let to = user.email.clone();
        let name = user.name.clone();
        let mut active: user::ActiveModel = user.into();
        active.reset_token_hash = Set(Some(hash_token(&token)));
        active.reset_token_expires_at = Set(Some(expires_at.into()));
        self.user_repo.update(active).await?;

        let template = EmailTemplate::PasswordReset {
            name,
            url: self.email.link(&format!("auth/reset-password?token={token}")),
        };
        self.email.send_best_effort(&to, &template).await;
        Ok(())
    }

    /// Set a new password from a reset link.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<Session> {
        self.check_password_length(new_password)?;

        let user = self
            .user_repo
            .find_by_reset_hash(&hash_token(token))
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid or expired reset link".to_string()))?;

        let expired = user
            .reset_token_expires_at
            .is_none_or(|at| at < Utc::now().fixed_offset());
        if expired {
            return Err(AppError::BadRequest("Invalid or expired reset link".to_string()));
        }

        let session_token = self.id_gen.generate_token();
        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(hash_password(new_password)?);
        active.requires_password_change = Set(false);
        active.email_confirmed = Set(true);
        active.reset_token_hash = Set(None);
        active.reset_token_expires_at = Set(None);
        active.token = Set(Some(session_token.clone()));
        active.updated_at = Set(Some(Utc::now().into()));
        let user = self.user_repo.update(active).await?;

        info!(user = %user.id, "Password reset");

        Ok(Session {
            requires_password_change: false,
            user,
            token: session_token,
        })
    }

    /// Update profile fields of the account itself.
    pub async fn update_settings(
        &self,
        user: user::Model,
        input: UpdateSettingsInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let mut preferences = user.notification_preferences.clone();
        let mut active: user::ActiveModel = user.into();

        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(phone) = input.phone {
            let phone = phone.trim().to_string();
            active.phone = Set((!phone.is_empty()).then_some(phone));
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(Some(avatar_url));
        }
        if let Some(changes) = input.notification_preferences {
            if !preferences.is_object() {
                preferences = serde_json::json!({});
            }
            if let Some(map) = preferences.as_object_mut() {
                map.extend(changes);
            }
            active.notification_preferences = Set(preferences);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Delete the account and everything that cascades from it.
    pub async fn delete_account(&self, user: &user::Model) -> AppResult<()> {
        self.user_repo.delete(&user.id).await?;
        info!(user = %user.id, "Account deleted");
        Ok(())
    }
}

/// Hash a password using Argon2.
pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash.
pub(crate) fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
