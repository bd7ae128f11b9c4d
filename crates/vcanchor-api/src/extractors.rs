//! # Custom Extractors
//!
//! Helpers that turn axum JSON/query rejections and semantic validation
//! failures into [`AppError::Validation`] (422), so every bad request gets
//! the structured error body.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;

use crate::error::AppError;

/// Semantic validation beyond what serde enforces.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// Unwrap a JSON body and validate it.
pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(value) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Unwrap query parameters and validate them.
pub fn extract_validated_query<T: Validate>(
    query: Result<Query<T>, QueryRejection>,
) -> Result<T, AppError> {
    let Query(value) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}
