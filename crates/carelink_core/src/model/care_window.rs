//! Recurring weekly care window model.
//!
//! # Responsibility
//! - Define the caregiver/patient availability slot keyed by weekday.
//! - Parse and validate `HH:MM` time-of-day values and window payloads.
//!
//! # Invariants
//! - `weekday` is in `0..=6` with `0 = Sunday`.
//! - `start_time < end_time`; a window never crosses midnight.
//! - Time-of-day accepts hours `00..=23` only, so `24:00` is rejected.

use crate::error::{CoreError, ValidationError};
use crate::model::actor::UserId;
use crate::model::directory::PatientId;
use crate::model::input::{missing_fields, non_blank, parse_id};
use crate::model::interval::{Interval, TimeOfDayInterval};
use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub type CareWindowId = Uuid;

static TIME_OF_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<hour>[01][0-9]|2[0-3]):(?P<minute>[0-5][0-9])$")
        .expect("valid time-of-day regex")
});

/// Weekday index of an absolute instant, `0 = Sunday`.
pub fn weekday_of(instant: NaiveDateTime) -> u8 {
    // num_days_from_sunday is always < 7
    instant.weekday().num_days_from_sunday() as u8
}

/// Minute-precision time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn as_naive(self) -> NaiveTime {
        self.0
    }
}

/// Validates a `HH:MM` string (hour `00..=23`, minute `00..=59`).
pub fn validate_time_of_day(value: &str) -> Result<TimeOfDay, ValidationError> {
    let invalid = || ValidationError::InvalidTimeOfDay(value.to_string());
    let captures = TIME_OF_DAY_RE.captures(value).ok_or_else(invalid)?;
    let hour = captures["hour"].parse::<u32>().map_err(|_| invalid())?;
    let minute = captures["minute"].parse::<u32>().map_err(|_| invalid())?;
    TimeOfDay::from_hm(hour, minute).ok_or_else(invalid)
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        validate_time_of_day(value)
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.0.hour(), self.0.minute())
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        validate_time_of_day(&text).map_err(serde::de::Error::custom)
    }
}

/// Weekly availability slot linking one caregiver to one patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareWindow {
    pub id: CareWindowId,
    pub caregiver_id: UserId,
    pub patient_id: PatientId,
    pub weekday: u8,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

impl CareWindow {
    /// Creates a window with a generated id from a parsed draft.
    pub fn new(draft: CareWindowDraft) -> Self {
        Self::with_id(Uuid::new_v4(), draft)
    }

    /// Applies a draft onto an existing identity (update path).
    pub fn with_id(id: CareWindowId, draft: CareWindowDraft) -> Self {
        Self {
            id,
            caregiver_id: draft.caregiver_id,
            patient_id: draft.patient_id,
            weekday: draft.weekday,
            start_time: draft.start_time,
            end_time: draft.end_time,
        }
    }

    /// Checks weekday range and `start_time < end_time`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.weekday > 6 {
            return Err(ValidationError::InvalidWeekday(i64::from(self.weekday)));
        }
        if self.start_time >= self.end_time {
            return Err(ValidationError::EmptyTimeRange {
                start: self.start_time.to_string(),
                end: self.end_time.to_string(),
            });
        }
        Ok(())
    }

    pub fn time_range(&self) -> TimeOfDayInterval {
        Interval::new(self.start_time.as_naive(), self.end_time.as_naive())
    }

    /// Returns whether the window shares its caregiver or its patient.
    pub fn shares_party_with(&self, other: &CareWindow) -> bool {
        self.caregiver_id == other.caregiver_id || self.patient_id == other.patient_id
    }
}

/// Raw care window payload as submitted by an administrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareWindowInput {
    pub patient_id: Option<String>,
    pub caregiver_id: Option<String>,
    pub weekday: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Shape-validated care window fields, not yet checked against storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CareWindowDraft {
    pub caregiver_id: UserId,
    pub patient_id: PatientId,
    pub weekday: u8,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

impl CareWindowInput {
    /// Checks presence, formats, weekday range and time ordering.
    pub fn into_draft(self) -> Result<CareWindowDraft, CoreError> {
        let patient_id = non_blank(self.patient_id);
        let caregiver_id = non_blank(self.caregiver_id);
        let start_time = non_blank(self.start_time);
        let end_time = non_blank(self.end_time);
        let missing = missing_fields(&[
            ("patientId", patient_id.is_none()),
            ("caregiverId", caregiver_id.is_none()),
            ("startTime", start_time.is_none()),
            ("endTime", end_time.is_none()),
            ("weekday", self.weekday.is_none()),
        ]);
        let (Some(patient_id), Some(caregiver_id), Some(start_time), Some(end_time), Some(weekday)) =
            (patient_id, caregiver_id, start_time, end_time, self.weekday)
        else {
            return Err(CoreError::MissingParams(missing));
        };

        let start_time = validate_time_of_day(&start_time)?;
        let end_time = validate_time_of_day(&end_time)?;
        let weekday = u8::try_from(weekday)
            .ok()
            .filter(|day| *day <= 6)
            .ok_or(ValidationError::InvalidWeekday(weekday))?;

        let draft = CareWindowDraft {
            caregiver_id: parse_id("caregiverId", &caregiver_id)?,
            patient_id: parse_id("patientId", &patient_id)?,
            weekday,
            start_time,
            end_time,
        };
        CareWindow::with_id(Uuid::nil(), draft).validate()?;
        Ok(draft)
    }
}
