//! Core domain logic for CareLink scheduling.
//! This crate owns the care window and activity invariants; transports and
//! authentication sit outside it.

pub mod boundary;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use boundary::ErrorResponse;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, serialized_write, DbError, DbResult};
pub use error::{
    AuthorizationError, ConflictError, CoreError, CoreResult, EntityKind, ValidationError,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::activity::{Activity, ActivityId, ActivityInput};
pub use model::actor::{AuthContext, Role, UserId};
pub use model::care_window::{CareWindow, CareWindowId, CareWindowInput, TimeOfDay};
pub use model::directory::{CaregiverInput, MedicalRecord, Patient, PatientId, PatientInput, User};
pub use model::interval::{AbsoluteInterval, Interval, TimeOfDayInterval};
pub use repo::activity_repo::{ActivityRepository, SqliteActivityRepository};
pub use repo::care_window_repo::{CareWindowRepository, SqliteCareWindowRepository};
pub use repo::directory_repo::{DirectoryRepository, SqliteDirectoryRepository};
pub use repo::{RepoError, RepoResult};
pub use service::activity_service::ActivityScheduler;
pub use service::care_window_service::CareWindowRegistry;
pub use service::directory_service::DirectoryService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
