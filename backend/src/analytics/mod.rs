//! Platform-wide figures for the admin dashboard

pub mod service;

pub use service::{AnalyticsService, LoanCounts, PendingWithdrawals, PlatformAnalytics};
