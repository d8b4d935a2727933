//! BuildNotify - templated build notifications for team messaging rooms
//!
//! This library resolves a named room, expands a message template against the
//! finished build, and publishes the result. Publishing is best-effort: a
//! failed notification is reported in the build's activity log and never
//! fails the build itself.

pub mod activity;
pub mod cli;
pub mod config;
pub mod core;
pub mod dispatcher;
pub mod publisher;
pub mod registry;
pub mod template;
pub mod tokens;
pub mod validation;

// Re-export core types for convenience
pub use crate::core::*;
pub use dispatcher::NotificationDispatcher;
pub use registry::RoomRegistry;
pub use template::TemplateExpander;
