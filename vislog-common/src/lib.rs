//! # vislog Common Library
//!
//! Shared code for the vislog visitor logger:
//! - Visitor record model
//! - Broadcast event types (VisitorEvent) and the EventBus
//! - Configuration loading and root folder resolution
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod time;

pub use error::{Error, Result};
pub use events::{EventBus, VisitorEvent};
pub use models::{DeviceInfo, GeoLocation, NewVisitorRecord, VisitorRecord};
