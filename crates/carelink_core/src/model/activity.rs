//! Dated activity model.
//!
//! # Responsibility
//! - Define concrete patient tasks keyed by absolute start/end instants.
//! - Parse `YYYY-MM-DD HH:MM` payloads and sanitize free text.
//!
//! # Invariants
//! - Activities carry no time zone; instants are naive local time.
//! - Title is never blank after sanitization.

use crate::error::{CoreError, ValidationError};
use crate::model::care_window::weekday_of;
use crate::model::directory::PatientId;
use crate::model::input::{missing_fields, non_blank, sanitize_text};
use crate::model::interval::{AbsoluteInterval, Interval};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ActivityId = Uuid;

/// Wire format for activity start/end values.
pub const ACTIVITY_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    pub patient_id: PatientId,
    pub title: String,
    pub description: Option<String>,
    pub start_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
}

impl Activity {
    pub fn new(patient_id: PatientId, draft: ActivityDraft) -> Self {
        Self::with_id(Uuid::new_v4(), patient_id, draft)
    }

    pub fn with_id(id: ActivityId, patient_id: PatientId, draft: ActivityDraft) -> Self {
        Self {
            id,
            patient_id,
            title: draft.title,
            description: draft.description,
            start_datetime: draft.interval.start,
            end_datetime: draft.interval.end,
        }
    }

    pub fn interval(&self) -> AbsoluteInterval {
        Interval::new(self.start_datetime, self.end_datetime)
    }

    /// Weekday of the activity start, `0 = Sunday`.
    pub fn weekday(&self) -> u8 {
        weekday_of(self.start_datetime)
    }
}

/// Raw activity payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_datetime: Option<String>,
    pub end_datetime: Option<String>,
}

/// Parsed activity fields; interval validity is checked by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityDraft {
    pub title: String,
    pub description: Option<String>,
    pub interval: AbsoluteInterval,
}

impl ActivityInput {
    pub fn into_draft(self) -> Result<ActivityDraft, CoreError> {
        let title = non_blank(self.title);
        let start = non_blank(self.start_datetime);
        let end = non_blank(self.end_datetime);
        let missing = missing_fields(&[
            ("title", title.is_none()),
            ("startDatetime", start.is_none()),
            ("endDatetime", end.is_none()),
        ]);
        let (Some(title), Some(start), Some(end)) = (title, start, end) else {
            return Err(CoreError::MissingParams(missing));
        };

        let interval = Interval::new(parse_datetime(&start)?, parse_datetime(&end)?);
        let description = self
            .description
            .map(|text| sanitize_text(&text))
            .filter(|text| !text.is_empty());

        Ok(ActivityDraft {
            title: sanitize_text(&title),
            description,
            interval,
        })
    }
}

pub fn parse_datetime(value: &str) -> Result<NaiveDateTime, ValidationError> {
    NaiveDateTime::parse_from_str(value.trim(), ACTIVITY_DATETIME_FORMAT)
        .map_err(|_| ValidationError::InvalidDatetime(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{parse_datetime, ActivityInput};
    use crate::error::{CoreError, ValidationError};
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn draft_sanitizes_text_fields() {
        let draft = ActivityInput {
            title: Some("  Morning   medication ".to_string()),
            description: Some("  with  water  ".to_string()),
            start_datetime: Some("2030-03-11 09:15".to_string()),
            end_datetime: Some("2030-03-11 09:45".to_string()),
        }
        .into_draft()
        .unwrap();

        assert_eq!(draft.title, "Morning medication");
        assert_eq!(draft.description.as_deref(), Some("with water"));
        assert_eq!(draft.interval.start.hour(), 9);
        assert_eq!(draft.interval.end.minute(), 45);
    }

    #[test]
    fn blank_description_is_dropped() {
        let draft = ActivityInput {
            title: Some("Walk".to_string()),
            description: Some("   ".to_string()),
            start_datetime: Some("2030-03-11 09:15".to_string()),
            end_datetime: Some("2030-03-11 09:45".to_string()),
        }
        .into_draft()
        .unwrap();
        assert_eq!(draft.description, None);
    }

    #[test]
    fn draft_requires_title_and_both_datetimes() {
        let err = ActivityInput {
            title: Some("   ".to_string()),
            ..ActivityInput::default()
        }
        .into_draft()
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::MissingParams(ref fields)
                if fields == &["title", "startDatetime", "endDatetime"]
        ));
    }

    #[test]
    fn parse_datetime_accepts_minute_precision_only() {
        let parsed = parse_datetime("2030-03-11 09:15").unwrap();
        assert_eq!(
            parsed,
            NaiveDate::from_ymd_opt(2030, 3, 11).unwrap().and_hms_opt(9, 15, 0).unwrap()
        );
        assert!(matches!(
            parse_datetime("2030-03-11T09:15"),
            Err(ValidationError::InvalidDatetime(_))
        ));
        assert!(parse_datetime("11/03/2030 09:15").is_err());
    }
}
