//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Validate raw caller input before it reaches storage.

pub mod revision_service;
pub mod shared_vault;
