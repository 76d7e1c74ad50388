//! People and clinical records referenced by the scheduler.
//!
//! # Responsibility
//! - Define patients, users (administrators/caregivers) and medical records.
//! - Parse admin-submitted caregiver and patient payloads.
//!
//! # Invariants
//! - Credentials are never part of these records; hashing lives outside core.
//! - Caregiver usernames follow `first.last<N>` with lowercase name parts.

use crate::error::{CoreError, ValidationError};
use crate::model::actor::{Role, UserId};
use crate::model::input::{missing_fields, non_blank, sanitize_text};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PatientId = Uuid;
pub type MedicalRecordId = Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    pub birthdate: Option<NaiveDate>,
}

impl Patient {
    pub fn new(name: impl Into<String>, birthdate: Option<NaiveDate>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            birthdate,
        }
    }
}

/// Authenticated user record without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub birthdate: Option<NaiveDate>,
    pub contact: Option<String>,
}

impl User {
    pub fn new(username: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            name: name.into(),
            role,
            birthdate: None,
            contact: None,
        }
    }

    pub fn is_caregiver(&self) -> bool {
        self.role == Role::Caregiver
    }
}

/// Clinical note about a patient, authored by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub id: MedicalRecordId,
    pub patient_id: PatientId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: NaiveDateTime,
}

impl MedicalRecord {
    pub fn new(
        patient_id: PatientId,
        author_id: UserId,
        content: impl Into<String>,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            author_id,
            content: content.into(),
            created_at,
        }
    }
}

/// Raw payload for caregiver creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaregiverInput {
    pub name: Option<String>,
    pub birthdate: Option<String>,
    pub contact: Option<String>,
}

/// Parsed caregiver payload, before username numbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaregiverDraft {
    pub name: String,
    pub birthdate: NaiveDate,
    pub contact: String,
    /// `first.last`, still missing its numeric suffix.
    pub username_base: String,
}

impl CaregiverInput {
    pub fn into_draft(self) -> Result<CaregiverDraft, CoreError> {
        let name = non_blank(self.name);
        let birthdate = non_blank(self.birthdate);
        let contact = non_blank(self.contact);
        let missing = missing_fields(&[
            ("name", name.is_none()),
            ("birthdate", birthdate.is_none()),
            ("contact", contact.is_none()),
        ]);
        let (Some(name), Some(birthdate), Some(contact)) = (name, birthdate, contact) else {
            return Err(CoreError::MissingParams(missing));
        };

        let name = sanitize_text(&name);
        let username_base = username_base(&name)?;
        let birthdate = parse_date(&birthdate)?;

        Ok(CaregiverDraft {
            name,
            birthdate,
            contact: contact.trim().to_string(),
            username_base,
        })
    }
}

impl CaregiverDraft {
    /// Builds the caregiver user, numbering the username after
    /// `existing_with_base` accounts that already share the prefix.
    pub fn into_user(self, existing_with_base: u32) -> User {
        let mut user = User::new(
            format!("{}{}", self.username_base, existing_with_base + 1),
            self.name,
            Role::Caregiver,
        );
        user.birthdate = Some(self.birthdate);
        user.contact = Some(self.contact);
        user
    }
}

/// Raw payload for patient creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInput {
    pub name: Option<String>,
    pub birthdate: Option<String>,
}

impl PatientInput {
    pub fn into_patient(self) -> Result<Patient, CoreError> {
        let Some(name) = non_blank(self.name) else {
            return Err(CoreError::MissingParams(vec!["name"]));
        };
        let birthdate = match non_blank(self.birthdate) {
            Some(value) => Some(parse_date(&value)?),
            None => None,
        };
        Ok(Patient::new(sanitize_text(&name), birthdate))
    }
}

fn username_base(sanitized_name: &str) -> Result<String, ValidationError> {
    let parts: Vec<&str> = sanitized_name.split(' ').collect();
    match (parts.first(), parts.last()) {
        (Some(first), Some(last)) if parts.len() > 1 => Ok(format!(
            "{}.{}",
            first.to_lowercase(),
            last.to_lowercase()
        )),
        _ => Err(ValidationError::InvalidName),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{CaregiverInput, PatientInput};
    use crate::error::{CoreError, ValidationError};
    use crate::model::actor::Role;

    fn caregiver_input(name: &str) -> CaregiverInput {
        CaregiverInput {
            name: Some(name.to_string()),
            birthdate: Some("1990-04-12".to_string()),
            contact: Some("+55 11 5555-0100".to_string()),
        }
    }

    #[test]
    fn caregiver_username_uses_first_and_last_name() {
        let draft = caregiver_input("  Maria   da Silva ").into_draft().unwrap();
        assert_eq!(draft.name, "Maria da Silva");
        assert_eq!(draft.username_base, "maria.silva");

        let user = draft.into_user(2);
        assert_eq!(user.username, "maria.silva3");
        assert_eq!(user.role, Role::Caregiver);
    }

    #[test]
    fn caregiver_requires_two_name_parts() {
        let err = caregiver_input("Maria").into_draft().unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::InvalidName)));
    }

    #[test]
    fn caregiver_reports_all_missing_fields() {
        let err = CaregiverInput::default().into_draft().unwrap_err();
        assert!(
            matches!(err, CoreError::MissingParams(ref fields) if fields == &["name", "birthdate", "contact"])
        );
    }

    #[test]
    fn patient_birthdate_is_optional_but_validated() {
        let patient = PatientInput {
            name: Some("Joao Pereira".to_string()),
            birthdate: None,
        }
        .into_patient()
        .unwrap();
        assert_eq!(patient.birthdate, None);

        let err = PatientInput {
            name: Some("Joao Pereira".to_string()),
            birthdate: Some("12/04/1950".to_string()),
        }
        .into_patient()
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::InvalidDate(_))));
    }
}
