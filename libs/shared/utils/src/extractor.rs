use axum::{
    extract::{Path, Query},
    Json,
};
use axum_extra::extract::WithRejection;

use shared_models::error::AppError;

// Extractors whose rejections render through `AppError`, so malformed
// bodies, query strings and path ids answer with the standard envelope.
// Destructure as `WithRejection(Json(body), _)`.

pub type ApiJson<T> = WithRejection<Json<T>, AppError>;

pub type ApiQuery<T> = WithRejection<Query<T>, AppError>;

pub type ApiPath<T> = WithRejection<Path<T>, AppError>;
