//! Loan applications: submission, documents and the admin review workflow

pub mod model;
pub mod service;

pub use model::{
    Application, ApplicationDetail, ApplicationDocument, CreateApplicationRequest,
    ListApplicationsQuery, RejectApplicationRequest, SubmissionOutcome, UpdateProgressRequest,
    UploadDocumentRequest,
};
pub use service::ApplicationService;
