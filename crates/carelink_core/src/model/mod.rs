//! Domain model for care scheduling.
//!
//! # Responsibility
//! - Define care windows, activities, people and the acting identity.
//! - Hold the pure interval algebra used by every conflict check.
//!
//! # Invariants
//! - Every persisted entity is identified by a stable UUID.
//! - Model parsing never touches storage; existence checks live in services.

pub mod activity;
pub mod actor;
pub mod care_window;
pub mod directory;
pub(crate) mod input;
pub mod interval;

pub use input::sanitize_text;
