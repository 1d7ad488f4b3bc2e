//! Core use-case services.
//!
//! # Responsibility
//! - Turn raw request payloads into validated, typed requests.
//! - Orchestrate repository calls into use-case level APIs.

pub mod deceased_service;
pub mod validation;
