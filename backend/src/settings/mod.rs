//! Platform settings (singleton row)

mod model;
mod service;

pub use model::{PublicSettings, Settings, UpdateSettingsRequest};
pub use service::SettingsService;
