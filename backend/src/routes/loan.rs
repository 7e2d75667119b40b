//! Borrower loan routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::loan;
use crate::state::AppState;

pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/api/loans/active", get(loan::active_loan))
        .route("/api/loans/mine", get(loan::my_loans))
        .route("/api/loans/withdraw", post(loan::request_withdrawal))
        .route("/api/loans/:id/repayments", get(loan::loan_repayments))
        .route("/api/loans/:id/repay", post(loan::repay_loan))
}
