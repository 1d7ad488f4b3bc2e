//! Collaborators injected into core services.
//!
//! # Responsibility
//! - Parse request date strings.
//! - Provide "today" without reading system time inside services.
//! - Render localized user-facing strings.

pub mod clock;
pub mod date;
pub mod translate;
