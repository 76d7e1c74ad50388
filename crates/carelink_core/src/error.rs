//! Domain error taxonomy shared by every scheduling use-case.
//!
//! # Responsibility
//! - Classify failures as missing params, validation, conflict,
//!   authorization, or not-found so the boundary layer can map them.
//! - Keep infrastructure failures (`Repo`) distinct from domain rejections.
//!
//! # Invariants
//! - Every variant is terminal for the current operation; nothing retries.
//! - Use-cases return the first failure unchanged.

use crate::db::DbError;
use crate::repo::RepoError;
use chrono::NaiveDateTime;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type CoreResult<T> = Result<T, CoreError>;

/// Entity family referenced by not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Patient,
    User,
    /// A user that exists with role `CAREGIVER`.
    Caregiver,
    CareWindow,
    Activity,
    MedicalRecord,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::User => "user",
            Self::Caregiver => "caregiver",
            Self::CareWindow => "care window",
            Self::Activity => "activity",
            Self::MedicalRecord => "medical record",
        }
    }
}

/// Malformed or out-of-range input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identifier field is not a valid UUID.
    InvalidId { field: &'static str, value: String },
    /// Time-of-day is not `HH:MM` within `00:00..=23:59`.
    InvalidTimeOfDay(String),
    /// Weekday outside `0..=6`.
    InvalidWeekday(i64),
    /// Datetime is not `YYYY-MM-DD HH:MM`.
    InvalidDatetime(String),
    /// Date is not `YYYY-MM-DD`.
    InvalidDate(String),
    /// Care window start is not strictly before its end.
    EmptyTimeRange { start: String, end: String },
    /// Absolute interval is reversed, spans days, or starts in the past.
    InvalidInterval {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// Caregiver has windows on this weekday but none contains the activity.
    OutsideCareWindow { weekday: u8 },
    /// Person name needs at least a first and last name.
    InvalidName,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId { field, value } => write!(f, "invalid {field}: `{value}`"),
            Self::InvalidTimeOfDay(value) => {
                write!(f, "invalid time of day `{value}`; expected HH:MM")
            }
            Self::InvalidWeekday(value) => write!(f, "weekday {value} is outside 0..=6"),
            Self::InvalidDatetime(value) => {
                write!(f, "invalid datetime `{value}`; expected YYYY-MM-DD HH:MM")
            }
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`; expected YYYY-MM-DD"),
            Self::EmptyTimeRange { start, end } => {
                write!(f, "start time {start} must be before end time {end}")
            }
            Self::InvalidInterval { start, end } => write!(
                f,
                "interval {start}..{end} must be ordered, within one day and not in the past"
            ),
            Self::OutsideCareWindow { weekday } => write!(
                f,
                "activity time is outside every care window on weekday {weekday}"
            ),
            Self::InvalidName => write!(f, "name must contain a first and last name"),
        }
    }
}

impl Error for ValidationError {}

/// Overlap with an already persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictError {
    CareWindow(Uuid),
    Activity(Uuid),
}

impl Display for ConflictError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CareWindow(id) => {
                write!(f, "another care window is occupying the same period: {id}")
            }
            Self::Activity(id) => write!(f, "another activity is occupying the same period: {id}"),
        }
    }
}

impl Error for ConflictError {}

/// Actor lacks rights over the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationError {
    AdminRequired,
    NotSelfOrAdmin { target: Uuid },
    /// Caregiver has no window for this patient on the activity weekday.
    NoCareWindow { patient_id: Uuid, weekday: u8 },
    /// Caregiver does not hold a window covering the stored activity.
    NotResponsible { activity_id: Uuid },
    /// Caregiver asked for data of a patient or pair they are not linked to.
    NotLinked { patient_id: Uuid },
}

impl Display for AuthorizationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AdminRequired => write!(f, "operation requires administrator role"),
            Self::NotSelfOrAdmin { target } => {
                write!(f, "actor may only access own record, not {target}")
            }
            Self::NoCareWindow {
                patient_id,
                weekday,
            } => write!(
                f,
                "no care window for patient {patient_id} on weekday {weekday}"
            ),
            Self::NotResponsible { activity_id } => {
                write!(f, "actor is not responsible for activity {activity_id}")
            }
            Self::NotLinked { patient_id } => {
                write!(f, "actor has no care window with patient {patient_id}")
            }
        }
    }
}

impl Error for AuthorizationError {}

/// Top-level error returned by every core use-case.
#[derive(Debug)]
pub enum CoreError {
    /// Required input fields are absent. Field names use wire spelling.
    MissingParams(Vec<&'static str>),
    Validation(ValidationError),
    Conflict(ConflictError),
    Authorization(AuthorizationError),
    NotFound { entity: EntityKind, id: Uuid },
    /// Persistence failure unrelated to domain rules.
    Repo(RepoError),
}

impl CoreError {
    pub fn not_found(entity: EntityKind, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    /// Stable short code used in logs and boundary payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingParams(_) => "missing_params",
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::Authorization(_) => "authorization",
            Self::NotFound { .. } => "not_found",
            Self::Repo(_) => "repo",
        }
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingParams(fields) => write!(f, "missing params: {}", fields.join(", ")),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict(err) => write!(f, "{err}"),
            Self::Authorization(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{} not found: {id}", entity.as_str()),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Conflict(err) => Some(err),
            Self::Authorization(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::MissingParams(_) | Self::NotFound { .. } => None,
        }
    }
}

impl From<ValidationError> for CoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ConflictError> for CoreError {
    fn from(value: ConflictError) -> Self {
        Self::Conflict(value)
    }
}

impl From<AuthorizationError> for CoreError {
    fn from(value: AuthorizationError) -> Self {
        Self::Authorization(value)
    }
}

impl From<RepoError> for CoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Repo(other),
        }
    }
}

impl From<DbError> for CoreError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthorizationError, CoreError, EntityKind, ValidationError};
    use crate::repo::RepoError;
    use uuid::Uuid;

    #[test]
    fn repo_not_found_becomes_domain_not_found() {
        let id = Uuid::new_v4();
        let err = CoreError::from(RepoError::NotFound {
            entity: EntityKind::Activity,
            id,
        });
        assert!(matches!(
            err,
            CoreError::NotFound { entity: EntityKind::Activity, id: found } if found == id
        ));
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn missing_params_lists_every_field() {
        let err = CoreError::MissingParams(vec!["title", "startDatetime"]);
        assert_eq!(err.to_string(), "missing params: title, startDatetime");
    }

    #[test]
    fn nested_errors_are_exposed_as_source() {
        use std::error::Error;

        let err = CoreError::from(ValidationError::InvalidWeekday(9));
        assert!(err.source().is_some());
        let err = CoreError::from(AuthorizationError::AdminRequired);
        assert_eq!(err.code(), "authorization");
    }
}
