//! Public contact form and the admin inbox

pub mod model;
pub mod service;

pub use model::{ContactMessage, ContactRequest};
pub use service::ContactService;
