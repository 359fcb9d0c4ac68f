//! Article catalog management

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult, Entity};
use shared::models::Article;

#[derive(Debug, sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    article_no: String,
    description: Option<String>,
    uom: Option<String>,
    manufacturer: Option<String>,
    manufacturer_art_number: Option<String>,
    reorder_threshold: Option<Decimal>,
    is_paint: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<ArticleRow> for Article {
    fn from(r: ArticleRow) -> Self {
        Article {
            id: r.id,
            article_no: r.article_no,
            description: r.description,
            uom: r.uom,
            manufacturer: r.manufacturer,
            manufacturer_art_number: r.manufacturer_art_number,
            reorder_threshold: r.reorder_threshold,
            is_paint: r.is_paint,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const ARTICLE_COLUMNS: &str = "id, article_no, description, uom, manufacturer, \
     manufacturer_art_number, reorder_threshold, is_paint, is_active, created_at, updated_at";

/// Input for creating an article
#[derive(Debug, Deserialize)]
pub struct CreateArticleInput {
    pub article_no: String,
    pub description: Option<String>,
    pub uom: Option<String>,
    pub manufacturer: Option<String>,
    pub manufacturer_art_number: Option<String>,
    pub reorder_threshold: Option<Decimal>,
    #[serde(default = "default_is_paint")]
    pub is_paint: bool,
}

fn default_is_paint() -> bool {
    true
}

/// Filters for the article listing
#[derive(Debug, Default, Deserialize)]
pub struct ArticleFilter {
    pub include_inactive: Option<bool>,
    /// Substring match on article_no or description
    pub q: Option<String>,
}

/// Article service
#[derive(Clone)]
pub struct ArticleService {
    db: PgPool,
}

impl ArticleService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List articles; active only unless asked otherwise
    pub async fn list(&self, filter: ArticleFilter) -> AppResult<Vec<Article>> {
        let include_inactive = filter.include_inactive.unwrap_or(false);
        let pattern = filter.q.map(|q| format!("%{}%", q));

        let rows = sqlx::query_as::<_, ArticleRow>(&format!(
            r#"
            SELECT {} FROM articles
            WHERE ($1 OR is_active)
              AND ($2::TEXT IS NULL OR article_no ILIKE $2 OR description ILIKE $2)
            ORDER BY article_no
            "#,
            ARTICLE_COLUMNS
        ))
        .bind(include_inactive)
        .bind(pattern)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    /// Fetch one article by its article number
    pub async fn get_by_article_no(&self, article_no: &str) -> AppResult<Article> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            "SELECT {} FROM articles WHERE article_no = $1",
            ARTICLE_COLUMNS
        ))
        .bind(article_no)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::ArticleNoNotFound(article_no.to_string()))?;

        Ok(row.into())
    }

    /// Create a new article
    pub async fn create(&self, input: CreateArticleInput) -> AppResult<Article> {
        let article_no = input.article_no.trim();
        if article_no.is_empty() {
            return Err(AppError::Validation {
                message: "article_no is required".to_string(),
                details: serde_json::json!({ "field": "article_no" }),
            });
        }

        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            r#"
            INSERT INTO articles
                (article_no, description, uom, manufacturer, manufacturer_art_number,
                 reorder_threshold, is_paint)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            ARTICLE_COLUMNS
        ))
        .bind(article_no)
        .bind(&input.description)
        .bind(&input.uom)
        .bind(&input.manufacturer)
        .bind(&input.manufacturer_art_number)
        .bind(input.reorder_threshold)
        .bind(input.is_paint)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Archive an article (kept for history; excluded from active listings)
    pub async fn archive(&self, article_id: i64) -> AppResult<Article> {
        self.set_active(article_id, false).await
    }

    /// Restore an archived article
    pub async fn restore(&self, article_id: i64) -> AppResult<Article> {
        self.set_active(article_id, true).await
    }

    async fn set_active(&self, article_id: i64, is_active: bool) -> AppResult<Article> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            r#"
            UPDATE articles SET is_active = $1, updated_at = now()
            WHERE id = $2
            RETURNING {}
            "#,
            ARTICLE_COLUMNS
        ))
        .bind(is_active)
        .bind(article_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound {
            entity: Entity::Article,
            id: article_id,
        })?;

        Ok(row.into())
    }
}
