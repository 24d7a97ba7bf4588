use crate::app::server::AppState;
use crate::core::catalog::ProductPage;
use crate::core::{Record, Submission};
use crate::utils::error::{AppError, Result};
use axum::{
    extract::{rejection::FormRejection, Path, Query, State},
    http::StatusCode,
    response::Html,
    Form, Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AutocompleteParams {
    pub phrase: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub cursor: Option<String>,
}

/// `GET /products?cursor=...`
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ProductPage>> {
    let cursor = params.cursor.filter(|cursor| !cursor.is_empty());
    let page = state.catalog.list(cursor.as_deref()).await?;
    tracing::info!(
        products = page.products.len(),
        has_next = page.next_cursor.is_some(),
        "Product page served"
    );

    Ok(Json(page))
}

/// `GET /products/autocomplete?phrase=...`
///
/// A missing `phrase` is a 400 here, not the generic 500 of an unchecked lookup.
pub async fn autocomplete_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AutocompleteParams>,
) -> Result<Json<Vec<Record>>> {
    let phrase = params.phrase.ok_or_else(|| AppError::MissingParameter {
        name: "phrase".to_string(),
    })?;

    let records = state.catalog.autocomplete(&phrase).await?;
    tracing::info!(phrase = %phrase, matches = records.len(), "Autocomplete served");

    Ok(Json(records))
}

/// `GET /products/{id}`
pub async fn product_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Record>> {
    state
        .catalog
        .find(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound {
            what: format!("product {}", id),
        })
}

/// `POST /submitted`
pub async fn submitted_handler(
    State(state): State<Arc<AppState>>,
    form: std::result::Result<Form<Submission>, FormRejection>,
) -> Result<Html<String>> {
    let Form(submission) = form.map_err(|rejection| AppError::InvalidForm {
        message: rejection.body_text(),
    })?;

    tracing::info!("Form submitted");
    Ok(Html(state.templates.render_submitted(&submission)?))
}

/// `GET /health`
pub async fn health_handler() -> StatusCode {
    StatusCode::OK
}
