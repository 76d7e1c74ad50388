//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Apply role gates and visibility filtering before returning data.
//! - Keep transport layers decoupled from storage details.

pub mod access_scope;
pub mod activity_service;
pub mod care_window_service;
pub mod directory_service;
