//! Borrower profile, dashboard, KYC and the admin user tools

pub mod model;
pub mod service;

pub use model::{
    ActivityItem, ActivityQuery, ApplicationCounts, Dashboard, ListUsersQuery, ReviewKycRequest,
    SetCreditScoreRequest, SubmitKycRequest, UpdateProfileRequest,
};
pub use service::UserService;
