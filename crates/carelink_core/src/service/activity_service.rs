//! Activity scheduling use-cases.
//!
//! # Responsibility
//! - Validate dated activities (ordered, same day, not in the past).
//! - Reject activities overlapping another activity of the same patient.
//! - Confine caregiver-submitted activities to that caregiver's care windows.
//! - Filter activity reads by caregiver visibility.
//!
//! # Invariants
//! - Mutations run `validate` -> patient conflict -> caregiver authorization,
//!   and write only after all three pass.
//! - Patient conflict search spans every activity of the patient, regardless
//!   of weekday; updates exclude the activity being updated.
//! - Administrators skip caregiver authorization entirely.

use crate::clock::Clock;
use crate::error::{
    AuthorizationError, ConflictError, CoreError, CoreResult, EntityKind, ValidationError,
};
use crate::model::activity::{Activity, ActivityId, ActivityInput};
use crate::model::actor::{AuthContext, UserId};
use crate::model::care_window::{weekday_of, CareWindow};
use crate::model::directory::PatientId;
use crate::model::interval::{
    align_time_of_day, contains, is_valid_absolute, overlaps, AbsoluteInterval,
};
use crate::repo::activity_repo::{ActivityQuery, ActivityRepository};
use crate::repo::care_window_repo::{CareWindowQuery, CareWindowRepository};
use crate::repo::directory_repo::DirectoryRepository;
use crate::service::access_scope::{filter_visible, require_self_or_admin};
use chrono::NaiveDateTime;
use log::{info, warn};
use std::collections::BTreeSet;

/// Checks that the interval is ordered, within one day and not before `now`.
pub fn validate(interval: &AbsoluteInterval, now: NaiveDateTime) -> Result<(), ValidationError> {
    if is_valid_absolute(interval, now) {
        Ok(())
    } else {
        Err(ValidationError::InvalidInterval {
            start: interval.start,
            end: interval.end,
        })
    }
}

/// Rejects `candidate` when it overlaps any listed activity except `exclude_id`.
pub fn check_patient_conflict(
    candidate: &AbsoluteInterval,
    existing: &[Activity],
    exclude_id: Option<ActivityId>,
) -> Result<(), ConflictError> {
    match existing
        .iter()
        .find(|activity| Some(activity.id) != exclude_id && overlaps(candidate, &activity.interval()))
    {
        Some(activity) => Err(ConflictError::Activity(activity.id)),
        None => Ok(()),
    }
}

/// Confines caregiver actors to their own care windows.
///
/// Selects the caregiver's windows for `patient_id` on the weekday of
/// `candidate.start`. None at all is an authorization failure; windows that
/// exist but do not contain the candidate are a validation failure.
pub fn check_caregiver_authorization(
    ctx: &AuthContext,
    patient_id: PatientId,
    candidate: &AbsoluteInterval,
    patient_windows: &[CareWindow],
) -> CoreResult<()> {
    let Some(caregiver_id) = ctx.caregiver_id() else {
        return Ok(());
    };

    let weekday = weekday_of(candidate.start);
    let mut matching = patient_windows
        .iter()
        .filter(|window| {
            window.patient_id == patient_id
                && window.caregiver_id == caregiver_id
                && window.weekday == weekday
        })
        .peekable();

    if matching.peek().is_none() {
        return Err(AuthorizationError::NoCareWindow {
            patient_id,
            weekday,
        }
        .into());
    }

    if matching.any(|window| contains(&align_time_of_day(candidate, &window.time_range()), candidate)) {
        Ok(())
    } else {
        Err(ValidationError::OutsideCareWindow { weekday }.into())
    }
}

/// Returns the caregiver's window that fully covers a stored activity.
pub fn covering_window<'a>(
    caregiver_id: UserId,
    activity: &Activity,
    windows: &'a [CareWindow],
) -> Option<&'a CareWindow> {
    let interval = activity.interval();
    windows.iter().find(|window| {
        window.caregiver_id == caregiver_id
            && window.patient_id == activity.patient_id
            && window.weekday == activity.weekday()
            && contains(&align_time_of_day(&interval, &window.time_range()), &interval)
    })
}

/// Caregivers whose windows overlap the activity on its weekday.
pub fn linked_caregivers(activity: &Activity, windows: &[CareWindow]) -> Vec<UserId> {
    let interval = activity.interval();
    windows
        .iter()
        .filter(|window| {
            window.patient_id == activity.patient_id
                && window.weekday == activity.weekday()
                && overlaps(&interval, &align_time_of_day(&interval, &window.time_range()))
        })
        .map(|window| window.caregiver_id)
        .collect()
}

/// Use-case service for dated activities.
pub struct ActivityScheduler<A, C, D, K>
where
    A: ActivityRepository,
    C: CareWindowRepository,
    D: DirectoryRepository,
    K: Clock,
{
    activities: A,
    windows: C,
    directory: D,
    clock: K,
}

impl<A, C, D, K> ActivityScheduler<A, C, D, K>
where
    A: ActivityRepository,
    C: CareWindowRepository,
    D: DirectoryRepository,
    K: Clock,
{
    pub fn new(activities: A, windows: C, directory: D, clock: K) -> Self {
        Self {
            activities,
            windows,
            directory,
            clock,
        }
    }

    /// Schedules a new activity for `patient_id`.
    pub fn create(
        &self,
        patient_id: PatientId,
        input: ActivityInput,
        ctx: &AuthContext,
    ) -> CoreResult<Activity> {
        let result = self.try_create(patient_id, input, ctx);
        log_outcome("activity_create", ctx, &result);
        result
    }

    /// Reschedules or edits an activity, keeping its id and patient.
    ///
    /// Caregivers must hold a window covering the stored activity as well as
    /// one containing the new time range.
    pub fn update(
        &self,
        activity_id: ActivityId,
        input: ActivityInput,
        ctx: &AuthContext,
    ) -> CoreResult<Activity> {
        let result = self.try_update(activity_id, input, ctx);
        log_outcome("activity_update", ctx, &result);
        result
    }

    /// Removes an activity. Past activities may be removed too.
    pub fn delete(&self, activity_id: ActivityId, ctx: &AuthContext) -> CoreResult<()> {
        let result = self.try_delete(activity_id, ctx);
        log_outcome("activity_delete", ctx, &result);
        result.map(|_| ())
    }

    /// Loads one activity visible to the actor.
    pub fn get(&self, activity_id: ActivityId, ctx: &AuthContext) -> CoreResult<Activity> {
        let activity = self.load(activity_id)?;
        if let Some(caregiver_id) = ctx.caregiver_id() {
            let windows = self.patient_windows(activity.patient_id)?;
            if !linked_caregivers(&activity, &windows).contains(&caregiver_id) {
                return Err(AuthorizationError::NotResponsible { activity_id }.into());
            }
        }
        Ok(activity)
    }

    /// Lists a patient's activities; caregivers only see those overlapping
    /// one of their windows on the activity weekday.
    pub fn list_for_patient(
        &self,
        patient_id: PatientId,
        ctx: &AuthContext,
    ) -> CoreResult<Vec<Activity>> {
        self.ensure_patient(patient_id)?;
        let activities = self
            .activities
            .list_activities(&ActivityQuery::patient(patient_id))?;
        let windows = if ctx.is_admin() {
            Vec::new()
        } else {
            self.patient_windows(patient_id)?
        };

        Ok(filter_visible(ctx, activities, |activity| {
            linked_caregivers(activity, &windows)
        }))
    }

    /// Lists activities falling inside one caregiver's windows, across all of
    /// that caregiver's patients, ordered by start.
    pub fn list_for_caregiver(
        &self,
        caregiver_id: UserId,
        ctx: &AuthContext,
    ) -> CoreResult<Vec<Activity>> {
        require_self_or_admin(ctx, caregiver_id)?;
        match self.directory.get_user(caregiver_id)? {
            Some(user) if user.is_caregiver() => {}
            _ => return Err(CoreError::not_found(EntityKind::Caregiver, caregiver_id)),
        }

        let windows = self
            .windows
            .list_care_windows(&CareWindowQuery::caregiver(caregiver_id))?;
        let patient_ids: BTreeSet<PatientId> =
            windows.iter().map(|window| window.patient_id).collect();

        let mut visible = Vec::new();
        for patient_id in patient_ids {
            let activities = self
                .activities
                .list_activities(&ActivityQuery::patient(patient_id))?;
            visible.extend(
                activities
                    .into_iter()
                    .filter(|activity| !linked_caregivers(activity, &windows).is_empty()),
            );
        }
        visible.sort_by(|a, b| {
            a.start_datetime
                .cmp(&b.start_datetime)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(visible)
    }

    fn try_create(
        &self,
        patient_id: PatientId,
        input: ActivityInput,
        ctx: &AuthContext,
    ) -> CoreResult<Activity> {
        let draft = input.into_draft()?;
        validate(&draft.interval, self.clock.now())?;
        self.ensure_patient(patient_id)?;

        let existing = self
            .activities
            .list_activities(&ActivityQuery::patient(patient_id))?;
        check_patient_conflict(&draft.interval, &existing, None)?;
        if ctx.caregiver_id().is_some() {
            let windows = self.patient_windows(patient_id)?;
            check_caregiver_authorization(ctx, patient_id, &draft.interval, &windows)?;
        }

        let activity = Activity::new(patient_id, draft);
        self.activities.create_activity(&activity)?;
        Ok(activity)
    }

    fn try_update(
        &self,
        activity_id: ActivityId,
        input: ActivityInput,
        ctx: &AuthContext,
    ) -> CoreResult<Activity> {
        let draft = input.into_draft()?;
        validate(&draft.interval, self.clock.now())?;
        let stored = self.load(activity_id)?;

        let existing = self
            .activities
            .list_activities(&ActivityQuery::patient(stored.patient_id))?;
        check_patient_conflict(&draft.interval, &existing, Some(activity_id))?;
        if let Some(caregiver_id) = ctx.caregiver_id() {
            let windows = self.patient_windows(stored.patient_id)?;
            ensure_responsible(caregiver_id, &stored, &windows)?;
            check_caregiver_authorization(ctx, stored.patient_id, &draft.interval, &windows)?;
        }

        let activity = Activity::with_id(activity_id, stored.patient_id, draft);
        self.activities.update_activity(&activity)?;
        Ok(activity)
    }

    /// Returns the removed activity so the outcome log can name it.
    fn try_delete(&self, activity_id: ActivityId, ctx: &AuthContext) -> CoreResult<Activity> {
        let stored = self.load(activity_id)?;
        if let Some(caregiver_id) = ctx.caregiver_id() {
            let windows = self.patient_windows(stored.patient_id)?;
            ensure_responsible(caregiver_id, &stored, &windows)?;
        }
        self.activities.delete_activity(activity_id)?;
        Ok(stored)
    }

    fn load(&self, activity_id: ActivityId) -> CoreResult<Activity> {
        self.activities
            .get_activity(activity_id)?
            .ok_or_else(|| CoreError::not_found(EntityKind::Activity, activity_id))
    }

    fn ensure_patient(&self, patient_id: PatientId) -> CoreResult<()> {
        match self.directory.get_patient(patient_id)? {
            Some(_) => Ok(()),
            None => Err(CoreError::not_found(EntityKind::Patient, patient_id)),
        }
    }

    fn patient_windows(&self, patient_id: PatientId) -> CoreResult<Vec<CareWindow>> {
        Ok(self
            .windows
            .list_care_windows(&CareWindowQuery::patient(patient_id))?)
    }
}

fn ensure_responsible(
    caregiver_id: UserId,
    stored: &Activity,
    windows: &[CareWindow],
) -> Result<(), AuthorizationError> {
    match covering_window(caregiver_id, stored, windows) {
        Some(_) => Ok(()),
        None => Err(AuthorizationError::NotResponsible {
            activity_id: stored.id,
        }),
    }
}

fn log_outcome(event: &str, ctx: &AuthContext, result: &CoreResult<Activity>) {
    match result {
        Ok(activity) => info!(
            "event={event} module=activity status=ok activity_id={} actor_id={} role={}",
            activity.id,
            ctx.actor_id,
            ctx.role.as_str()
        ),
        Err(err) => warn!(
            "event={event} module=activity status=rejected error_code={} actor_id={} role={}",
            err.code(),
            ctx.actor_id,
            ctx.role.as_str()
        ),
    }
}
