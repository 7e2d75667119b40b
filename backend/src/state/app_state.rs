//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::analytics::AnalyticsService;
use crate::application::ApplicationService;
use crate::auth::{AuthService, GoogleVerifier};
use crate::config::Config;
use crate::contact::ContactService;
use crate::loan::LoanService;
use crate::notification::NotificationService;
use crate::settings::SettingsService;
use crate::user::UserService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: Arc<AuthService>,
    pub settings_service: Arc<SettingsService>,
    pub application_service: Arc<ApplicationService>,
    pub loan_service: Arc<LoanService>,
    pub user_service: Arc<UserService>,
    pub notification_service: Arc<NotificationService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub contact_service: Arc<ContactService>,
}

impl AppState {
    /// Wire every service over one pool
    pub fn new(db_pool: PgPool, config: &Config) -> Self {
        let notifications = NotificationService::new(db_pool.clone());
        let loans = LoanService::new(db_pool.clone(), notifications.clone());

        let auth_service = AuthService::new(
            db_pool.clone(),
            config.jwt_secret.clone(),
            config.jwt_access_token_ttl_seconds,
            config.jwt_refresh_token_ttl_days,
            GoogleVerifier::new(config.google_client_id.clone()),
        );

        let application_service = ApplicationService::new(
            db_pool.clone(),
            loans.clone(),
            notifications.clone(),
            config.upload_dir.clone(),
            config.max_upload_bytes,
        );

        let user_service = UserService::new(db_pool.clone(), loans.clone(), notifications.clone());

        Self {
            auth_service: Arc::new(auth_service),
            settings_service: Arc::new(SettingsService::new(db_pool.clone())),
            application_service: Arc::new(application_service),
            loan_service: Arc::new(loans),
            user_service: Arc::new(user_service),
            notification_service: Arc::new(notifications),
            analytics_service: Arc::new(AnalyticsService::new(db_pool.clone())),
            contact_service: Arc::new(ContactService::new(db_pool.clone())),
            db_pool,
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<SettingsService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.settings_service.clone()
    }
}

impl FromRef<AppState> for Arc<NotificationService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.notification_service.clone()
    }
}
