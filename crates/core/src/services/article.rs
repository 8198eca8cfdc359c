//! Blog articles.

use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::Deserialize;
use terapie_common::{AppError, AppResult, IdGenerator};
use terapie_db::{
    entities::article::{self, FEATURED_TAG},
    repositories::{ArticleQuery, ArticleRepository},
};
use tracing::info;
use validator::Validate;

use super::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

const MAX_SLUG_LENGTH: usize = 96;

/// Blog listing filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleFilter {
    pub tag: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(min = 1, max = 96))]
    pub slug: Option<String>,
    #[validate(length(min = 1))]
    pub content: String,
    #[validate(length(max = 1000))]
    pub excerpt: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub author_name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Defaults to now. A future date schedules the article.
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleInput {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 96))]
    pub slug: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    #[validate(length(max = 1000))]
    pub excerpt: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub author_name: Option<String>,
    pub tags: Option<Vec<String>>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Lowercase ASCII slug. Romanian diacritics are folded, everything else
/// that is not alphanumeric becomes a single hyphen.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        let c = match c {
            'ă' | 'â' | 'á' | 'à' | 'ä' => 'a',
            'î' | 'í' => 'i',
            'ș' | 'ş' => 's',
            'ț' | 'ţ' => 't',
            'é' | 'è' | 'ë' => 'e',
            'ó' | 'ö' => 'o',
            'ú' | 'ü' => 'u',
            other => other,
        };
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
        if slug.len() >= MAX_SLUG_LENGTH {
            break;
        }
    }

    slug
}

/// Trimmed, deduplicated, non-empty tags in input order.
fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Article service.
#[derive(Clone)]
pub struct ArticleService {
    article_repo: ArticleRepository,
    id_gen: IdGenerator,
}

impl ArticleService {
    #[must_use]
    pub const fn new(article_repo: ArticleRepository) -> Self {
        Self {
            article_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Published articles, newest first.
    pub async fn list_articles(&self, filter: &ArticleFilter) -> AppResult<Vec<article::Model>> {
        self.list(filter, false).await
    }

    /// All articles including scheduled ones.
    pub async fn list_all_articles(
        &self,
        filter: &ArticleFilter,
    ) -> AppResult<Vec<article::Model>> {
        self.list(filter, true).await
    }

    async fn list(
        &self,
        filter: &ArticleFilter,
        include_scheduled: bool,
    ) -> AppResult<Vec<article::Model>> {
        self.article_repo
            .list(&ArticleQuery {
                tag: filter.tag.clone(),
                search: filter.search.clone(),
                include_scheduled,
                limit: filter.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
                offset: filter.offset.unwrap_or(0),
            })
            .await
    }

    /// A published article. Scheduled articles are not found.
    pub async fn get_article_by_slug(&self, slug: &str) -> AppResult<article::Model> {
        self.article_repo
            .find_by_slug(slug)
            .await?
            .filter(|a| a.published_at <= Utc::now())
            .ok_or_else(|| AppError::NotFound(format!("Article {slug}")))
    }

    pub async fn get_article(&self, id: &str) -> AppResult<article::Model> {
        self.article_repo.get_by_id(id).await
    }

    pub async fn create_article(&self, input: CreateArticleInput) -> AppResult<article::Model> {
        input.validate()?;

        let base = slugify(input.slug.as_deref().unwrap_or(&input.title));
        if base.is_empty() {
            return Err(AppError::Validation("Slug cannot be empty".to_string()));
        }
        let slug = self.unique_slug(&base).await?;
        let now = Utc::now();

        let article = self
            .article_repo
            .create(article::ActiveModel {
                id: Set(self.id_gen.generate()),
                title: Set(input.title.trim().to_string()),
                slug: Set(slug),
                content: Set(input.content),
                excerpt: Set(input.excerpt),
                image_url: Set(input.image_url),
                author_name: Set(input.author_name),
                tags: Set(serde_json::json!(clean_tags(input.tags))),
                published_at: Set(input.published_at.unwrap_or(now).into()),
                created_at: Set(now.into()),
                updated_at: Set(None),
            })
            .await?;

        if article.is_featured() {
            self.clear_featured_except(&article.id).await?;
        }

        info!(article = %article.id, slug = %article.slug, "Article created");
        Ok(article)
    }

    pub async fn update_article(
        &self,
        id: &str,
        input: UpdateArticleInput,
    ) -> AppResult<article::Model> {
        input.validate()?;
        let current = self.article_repo.get_by_id(id).await?;

        let slug = match input.slug.as_deref().map(slugify) {
            Some(slug) if slug.is_empty() => {
                return Err(AppError::Validation("Slug cannot be empty".to_string()));
            }
            Some(slug) if slug != current.slug => {
                if self.article_repo.slug_exists(&slug).await? {
                    return Err(AppError::Conflict("Slug already in use".to_string()));
                }
                Some(slug)
            }
            _ => None,
        };

        let mut active: article::ActiveModel = current.into();
        if let Some(title) = input.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(slug) = slug {
            active.slug = Set(slug);
        }
        if let Some(content) = input.content {
            active.content = Set(content);
        }
        if let Some(excerpt) = input.excerpt {
            active.excerpt = Set(Some(excerpt));
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(author_name) = input.author_name {
            active.author_name = Set(Some(author_name));
        }
        if let Some(tags) = input.tags {
            active.tags = Set(serde_json::json!(clean_tags(tags)));
        }
        if let Some(published_at) = input.published_at {
            active.published_at = Set(published_at.into());
        }
        active.updated_at = Set(Some(Utc::now().into()));

        let article = self.article_repo.update(active).await?;
        if article.is_featured() {
            self.clear_featured_except(&article.id).await?;
        }

        info!(article = %article.id, "Article updated");
        Ok(article)
    }

    pub async fn delete_article(&self, id: &str) -> AppResult<()> {
        let article = self.article_repo.get_by_id(id).await?;
        self.article_repo.delete(&article.id).await?;
        info!(article = %article.id, "Article deleted");
        Ok(())
    }

    /// `base`, then `base-2`, `base-3`, ... until free.
    async fn unique_slug(&self, base: &str) -> AppResult<String> {
        if !self.article_repo.slug_exists(base).await? {
            return Ok(base.to_string());
        }
        for n in 2..1000u32 {
            let candidate = format!("{base}-{n}");
            if !self.article_repo.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Ok(format!("{base}-{}", self.id_gen.generate().to_lowercase()))
    }

    /// Only one article may carry the featured tag.
    async fn clear_featured_except(&self, id: &str) -> AppResult<()> {
        for other in self.article_repo.find_featured_except(id).await? {
            let tags: Vec<String> = other
                .tag_list()
                .into_iter()
                .filter(|t| t != FEATURED_TAG)
                .collect();
            let other_id = other.id.clone();
            let mut active: article::ActiveModel = other.into();
            active.tags = Set(serde_json::json!(tags));
            self.article_repo.update(active).await?;
            info!(article = %other_id, "Featured tag moved away");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;
    use std::sync::Arc;

    fn article_model(id: &str, slug: &str, tags: serde_json::Value) -> article::Model {
        article::Model {
            id: id.to_string(),
            title: format!("Article {id}"),
            slug: slug.to_string(),
            content: "<p>text</p>".to_string(),
            excerpt: None,
            image_url: None,
            author_name: None,
            tags,
            published_at: Utc::now().into(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Cum să gestionezi anxietatea"), "cum-sa-gestionezi-anxietatea");
        assert_eq!(slugify("  Terapie de cuplu: ce știm?  "), "terapie-de-cuplu-ce-stim");
        assert_eq!(slugify("Îngrijire & țesut"), "ingrijire-tesut");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_is_bounded() {
        let long = "a".repeat(300);
        assert_eq!(slugify(&long).len(), MAX_SLUG_LENGTH);
    }

    #[test]
    fn test_clean_tags() {
        let tags = clean_tags(vec![
            " Stres ".to_string(),
            String::new(),
            "Stres".to_string(),
            "Somn".to_string(),
        ]);
        assert_eq!(tags, vec!["Stres", "Somn"]);
    }

    #[tokio::test]
    async fn test_featured_tag_is_exclusive() {
        let current = article_model("a1", "a1", json!(["Stres"]));
        let featured = article_model("a1", "a1", json!(["Stres", FEATURED_TAG]));
        let other = article_model("a2", "a2", json!([FEATURED_TAG, "Somn"]));
        let other_cleared = article_model("a2", "a2", json!(["Somn"]));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[current]])
            .append_query_results([[featured]])
            .append_query_results([[other]])
            .append_query_results([[other_cleared]])
            .into_connection();
        let service = ArticleService::new(ArticleRepository::new(Arc::new(db)));

        let updated = service
            .update_article(
                "a1",
                UpdateArticleInput {
                    tags: Some(vec!["Stres".to_string(), FEATURED_TAG.to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.is_featured());
    }

    #[tokio::test]
    async fn test_scheduled_article_is_hidden() {
        let mut scheduled = article_model("a1", "viitor", json!([]));
        scheduled.published_at = (Utc::now() + chrono::Duration::days(3)).into();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[scheduled]])
            .into_connection();
        let service = ArticleService::new(ArticleRepository::new(Arc::new(db)));

        assert!(matches!(
            service.get_article_by_slug("viitor").await,
            Err(AppError::NotFound(_))
        ));
    }
}
