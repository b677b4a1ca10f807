//! Outbound integrations: everything the server pushes to systems it does not own.

pub mod notify;

pub use notify::create_notification_handlers;
