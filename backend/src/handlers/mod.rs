//! API handlers for the MicroLend backend

use axum::{
    extract::{Path, Query},
    Json,
};
use axum_extra::extract::WithRejection;

use crate::error::ApiError;

pub mod admin;
pub mod application;
pub mod auth;
pub mod loan;
pub mod notification;
pub mod public;
pub mod system;
pub mod user;

// Re-export the extractors for handler use
pub use crate::middleware::auth::{AdminUser, AuthenticatedUser};

/// Extractors whose rejections render through the `ApiError` envelope
pub type ApiJson<T> = WithRejection<Json<T>, ApiError>;
pub type ApiQuery<T> = WithRejection<Query<T>, ApiError>;
pub type ApiPath<T> = WithRejection<Path<T>, ApiError>;
