//! Domain model for revisions and shared vault custody.
//!
//! # Responsibility
//! - Define validated identifiers and the records core business logic uses.
//!
//! # Invariants
//! - Every record is keyed by a validated `Identifier`.
//! - Optional associations are `Option`, never sentinel values.

pub mod identifier;
pub mod revision;
pub mod shared_vault;
