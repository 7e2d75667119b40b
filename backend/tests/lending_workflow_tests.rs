//! Database-backed lending workflow
//!
//! Requires a disposable PostgreSQL database:
//!
//! ```text
//! TEST_DATABASE_URL=postgres://localhost/microlend_test cargo test -- --ignored
//! ```

use microlend_server::{
    application::CreateApplicationRequest,
    config::Config,
    db,
    error::ApiError,
    lending::{ApplicationStatus, LoanStatus, TransactionStatus},
    loan::WithdrawRequest,
    models::UserRole,
    settings::UpdateSettingsRequest,
    state::AppState,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::PgPool;
use uuid::Uuid;

async fn setup() -> (AppState, PgPool) {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let config = Config::for_database(url);
    let pool = db::create_pool(&config).await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    (AppState::new(pool.clone(), &config), pool)
}

async fn insert_user(pool: &PgPool, role: UserRole, credit_score: Option<i32>) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, email, role, full_name, credit_score) VALUES ($1, $2, $3, 'Test User', $4)",
    )
    .bind(id)
    .bind(format!("{id}@test.local"))
    .bind(role)
    .bind(credit_score)
    .execute(pool)
    .await
    .unwrap();
    id
}

async fn configure(state: &AppState, admin: Uuid, auto_approval: bool) {
    state
        .settings_service
        .update(
            UpdateSettingsRequest {
                interest_rate: Some(dec!(6)),
                processing_fee_percent: Some(dec!(2.5)),
                min_loan: Some(dec!(1000)),
                max_loan: Some(dec!(500000)),
                max_months: Some(12),
                auto_approval_enabled: Some(auto_approval),
            },
            admin,
        )
        .await
        .unwrap();
}

fn request(amount: Decimal, term_months: i32) -> CreateApplicationRequest {
    CreateApplicationRequest {
        amount,
        term_months,
        purpose: Some("Stock for the shop".to_string()),
    }
}

// Settings are a single shared row, so every scenario runs in one test.
#[tokio::test]
#[ignore]
async fn test_lending_lifecycle() {
    let (state, pool) = setup().await;
    let admin = insert_user(&pool, UserRole::Admin, None).await;

    manual_review_path(&state, &pool, admin).await;
    auto_approval_path(&state, &pool, admin).await;
    limits_are_enforced(&state, &pool, admin).await;
}

async fn manual_review_path(state: &AppState, pool: &PgPool, admin: Uuid) {
    configure(state, admin, false).await;
    let borrower = insert_user(pool, UserRole::User, Some(700)).await;

    let outcome = state
        .application_service
        .submit(borrower, request(dec!(100000), 6))
        .await
        .unwrap();
    assert!(!outcome.auto_approved);
    assert_eq!(outcome.application.status, ApplicationStatus::Submitted);
    let app_id = outcome.application.id;

    let reviewing = state.application_service.mark_review(app_id, admin).await.unwrap();
    assert_eq!(reviewing.status, ApplicationStatus::Review);

    let approved = state.application_service.approve(app_id, admin).await.unwrap();
    assert_eq!(approved.status, ApplicationStatus::Approved);
    assert_eq!(approved.processing_progress, 50);
    assert!(matches!(
        state.application_service.reject(app_id, admin, None).await,
        Err(ApiError::Conflict(_))
    ));

    let loan = state
        .loan_service
        .confirm_processing_fee(app_id, admin)
        .await
        .unwrap();
    assert_eq!(loan.status, LoanStatus::PendingDisbursement);
    assert_eq!(loan.total_repayment, dec!(136000));
    assert_eq!(loan.processing_fee, dec!(2500));
    assert!(matches!(
        state.loan_service.confirm_processing_fee(app_id, admin).await,
        Err(ApiError::Conflict(_))
    ));

    // Nothing to repay before the money goes out
    assert!(matches!(
        state.loan_service.repay(borrower, loan.id, dec!(100)).await,
        Err(ApiError::BadRequest(_))
    ));

    let loan = state.loan_service.disburse_loan(loan.id, admin).await.unwrap();
    assert_eq!(loan.status, LoanStatus::Active);
    assert!(matches!(
        state.loan_service.disburse_loan(loan.id, admin).await,
        Err(ApiError::Conflict(_))
    ));

    // Withdrawals draw on the principal
    let first = state
        .loan_service
        .request_withdrawal(
            borrower,
            WithdrawRequest {
                amount: dec!(60000),
                note: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(first.status, TransactionStatus::Pending);
    assert!(matches!(
        state
            .loan_service
            .request_withdrawal(
                borrower,
                WithdrawRequest {
                    amount: dec!(50000),
                    note: None,
                },
            )
            .await,
        Err(ApiError::BadRequest(_))
    ));
    let first = state
        .loan_service
        .decide_withdrawal(first.id, true, admin, None)
        .await
        .unwrap();
    assert_eq!(first.status, TransactionStatus::Completed);
    assert!(matches!(
        state.loan_service.decide_withdrawal(first.id, false, admin, None).await,
        Err(ApiError::Conflict(_))
    ));

    // Someone else cannot pay this loan
    let stranger = insert_user(pool, UserRole::User, None).await;
    assert!(matches!(
        state.loan_service.repay(stranger, loan.id, dec!(100)).await,
        Err(ApiError::NotFound(_))
    ));

    let receipt = state.loan_service.repay(borrower, loan.id, dec!(34000)).await.unwrap();
    assert_eq!(receipt.repayment.remaining_balance, dec!(102000));
    assert!(receipt.repayment.reference.starts_with("RPY-"));

    let overview = state.loan_service.active_loan(borrower).await.unwrap().unwrap();
    assert_eq!(overview.total_paid, dec!(34000));
    assert_eq!(overview.progress_percent, dec!(25));
    assert_eq!(overview.available_to_withdraw, dec!(40000));

    assert!(matches!(
        state.loan_service.repay(borrower, loan.id, dec!(102000.01)).await,
        Err(ApiError::BadRequest(_))
    ));

    // Fractions of a cent never reach the ledger, so the loan cannot be left owing 0.001
    for amount in [dec!(101999.999), dec!(0.001)] {
        assert!(matches!(
            state.loan_service.repay(borrower, loan.id, amount).await,
            Err(ApiError::BadRequest(_))
        ));
    }
    assert!(matches!(
        state
            .loan_service
            .request_withdrawal(
                borrower,
                WithdrawRequest {
                    amount: dec!(0.005),
                    note: None,
                },
            )
            .await,
        Err(ApiError::BadRequest(_))
    ));

    let receipt = state.loan_service.repay(borrower, loan.id, dec!(102000)).await.unwrap();
    assert_eq!(receipt.repayment.remaining_balance, Decimal::ZERO);
    assert_eq!(receipt.loan.status, LoanStatus::Completed);
    assert!(receipt.loan.completed_at.is_some());

    let history = state.loan_service.repayments(borrower, loan.id).await.unwrap();
    assert_eq!(history.len(), 2);

    let dashboard = state.user_service.dashboard(borrower).await.unwrap();
    assert!(dashboard.active_loan.is_none());
    assert_eq!(dashboard.applications.approved, 1);
    assert_eq!(dashboard.total_repaid, dec!(136000));
    assert!(dashboard.unread_notifications > 0);
}

async fn auto_approval_path(state: &AppState, pool: &PgPool, admin: Uuid) {
    configure(state, admin, true).await;
    let borrower = insert_user(pool, UserRole::User, Some(720)).await;

    // Build up the required history of approved applications
    for _ in 0..3 {
        let outcome = state
            .application_service
            .submit(borrower, request(dec!(5000), 3))
            .await
            .unwrap();
        assert!(!outcome.auto_approved);
        state
            .application_service
            .approve(outcome.application.id, admin)
            .await
            .unwrap();
    }

    let outcome = state
        .application_service
        .submit(borrower, request(dec!(30000), 6))
        .await
        .unwrap();
    assert!(outcome.auto_approved);
    assert!(outcome.review_reasons.is_empty());
    assert_eq!(outcome.application.status, ApplicationStatus::Approved);
    assert!(outcome.application.processing_fee_paid);
    assert_eq!(outcome.application.processing_progress, 100);

    let loan = outcome.loan.expect("auto-approval opens a loan");
    assert_eq!(loan.status, LoanStatus::PendingDisbursement);
    assert_eq!(loan.processing_fee, dec!(750));

    let detail = state
        .application_service
        .get_for_user(borrower, outcome.application.id)
        .await
        .unwrap();
    assert_eq!(detail.loan.map(|l| l.id), Some(loan.id));
}

async fn limits_are_enforced(state: &AppState, pool: &PgPool, admin: Uuid) {
    configure(state, admin, false).await;
    let borrower = insert_user(pool, UserRole::User, None).await;

    for (amount, term) in [
        (dec!(999), 6),
        (dec!(500001), 6),
        (dec!(5000), 13),
        (dec!(5000.001), 6),
    ] {
        assert!(matches!(
            state
                .application_service
                .submit(borrower, request(amount, term))
                .await,
            Err(ApiError::BadRequest(_))
        ));
    }

    let counts = state.user_service.dashboard(borrower).await.unwrap().applications;
    assert_eq!(counts.total, 0);
}
