//! HTTP handlers for the article catalog and batch registry

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::article::{ArticleFilter, ArticleService, CreateArticleInput};
use crate::services::batch::{BatchService, CreateBatchInput};
use crate::AppState;
use shared::models::{Article, Batch};

/// List articles
pub async fn list_articles(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<ArticleFilter>,
) -> AppResult<Json<Vec<Article>>> {
    let service = ArticleService::new(state.db);
    let articles = service.list(filter).await?;
    Ok(Json(articles))
}

/// Fetch one article by article number
pub async fn get_article(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(article_no): Path<String>,
) -> AppResult<Json<Article>> {
    let service = ArticleService::new(state.db);
    let article = service.get_by_article_no(&article_no).await?;
    Ok(Json(article))
}

/// Create an article
pub async fn create_article(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateArticleInput>,
) -> AppResult<Json<Article>> {
    require_admin(&current_user.0)?;
    let service = ArticleService::new(state.db);
    let article = service.create(input).await?;
    Ok(Json(article))
}

/// Archive an article
pub async fn archive_article(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(article_id): Path<i64>,
) -> AppResult<Json<Article>> {
    require_admin(&current_user.0)?;
    let service = ArticleService::new(state.db);
    let article = service.archive(article_id).await?;
    Ok(Json(article))
}

/// Restore an archived article
pub async fn restore_article(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(article_id): Path<i64>,
) -> AppResult<Json<Article>> {
    require_admin(&current_user.0)?;
    let service = ArticleService::new(state.db);
    let article = service.restore(article_id).await?;
    Ok(Json(article))
}

/// List batches for one article
pub async fn list_article_batches(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(article_no): Path<String>,
) -> AppResult<Json<Vec<Batch>>> {
    let service = BatchService::new(state.db);
    let batches = service.list_for_article(&article_no).await?;
    Ok(Json(batches))
}

/// Register a manufacturer batch
pub async fn create_batch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateBatchInput>,
) -> AppResult<Json<Batch>> {
    require_admin(&current_user.0)?;
    let service = BatchService::new(state.db);
    let batch = service.create(input).await?;
    Ok(Json(batch))
}
