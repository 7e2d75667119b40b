//! In-app notifications
//!
//! Rows are appended as side effects of lending events and polled by
//! clients; nothing is pushed.

mod model;
mod service;

pub use model::{ListNotificationsQuery, Notification, NotificationKind, UnreadCount};
pub use service::NotificationService;
