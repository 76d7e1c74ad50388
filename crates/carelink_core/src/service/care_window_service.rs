//! Care window registry use-cases.
//!
//! # Responsibility
//! - Gate window mutations behind the administrator role.
//! - Validate payload shape and referenced patient/caregiver.
//! - Reject windows overlapping another window of the same caregiver or the
//!   same patient on the same weekday.
//!
//! # Invariants
//! - Conflict search is scoped to windows sharing the candidate weekday.
//! - Updates exclude the record being updated from the conflict set.
//! - Every check completes before the repository is asked to write.
//! - Deleting a window never touches scheduled activities.

use crate::error::{AuthorizationError, ConflictError, CoreError, CoreResult, EntityKind};
use crate::model::actor::{AuthContext, UserId};
use crate::model::care_window::{CareWindow, CareWindowDraft, CareWindowId, CareWindowInput};
use crate::model::directory::PatientId;
use crate::model::interval::overlaps;
use crate::repo::care_window_repo::{CareWindowQuery, CareWindowRepository};
use crate::repo::directory_repo::DirectoryRepository;
use crate::service::access_scope::{require_admin, require_self_or_admin};
use log::{info, warn};

/// Returns the first stored window that collides with `candidate`.
///
/// A collision needs the same weekday, a shared caregiver or patient, and
/// overlapping time-of-day ranges. `exclude` skips the record being updated.
pub fn find_window_conflict<'a>(
    candidate: &CareWindow,
    existing: &'a [CareWindow],
    exclude: Option<CareWindowId>,
) -> Option<&'a CareWindow> {
    existing.iter().find(|window| {
        Some(window.id) != exclude
            && window.weekday == candidate.weekday
            && window.shares_party_with(candidate)
            && overlaps(&candidate.time_range(), &window.time_range())
    })
}

/// Use-case service for recurring care windows.
pub struct CareWindowRegistry<C: CareWindowRepository, D: DirectoryRepository> {
    windows: C,
    directory: D,
}

impl<C: CareWindowRepository, D: DirectoryRepository> CareWindowRegistry<C, D> {
    pub fn new(windows: C, directory: D) -> Self {
        Self { windows, directory }
    }

    /// Creates a window after role, shape, reference and conflict checks.
    pub fn create(&self, input: CareWindowInput, ctx: &AuthContext) -> CoreResult<CareWindow> {
        require_admin(ctx)?;
        let draft = input.into_draft()?;
        let window = CareWindow::new(draft);

        self.ensure_references(&draft)?;
        self.ensure_no_conflict(&window, None)?;

        self.windows.create_care_window(&window)?;
        info!(
            "event=care_window_create module=care status=ok window_id={} weekday={} actor_id={}",
            window.id, window.weekday, ctx.actor_id
        );
        Ok(window)
    }

    /// Replaces an existing window, ignoring it during conflict search.
    pub fn update(
        &self,
        id: CareWindowId,
        input: CareWindowInput,
        ctx: &AuthContext,
    ) -> CoreResult<CareWindow> {
        require_admin(ctx)?;
        self.load(id)?;
        let draft = input.into_draft()?;
        let window = CareWindow::with_id(id, draft);

        self.ensure_references(&draft)?;
        self.ensure_no_conflict(&window, Some(id))?;

        self.windows.update_care_window(&window)?;
        info!(
            "event=care_window_update module=care status=ok window_id={} weekday={} actor_id={}",
            window.id, window.weekday, ctx.actor_id
        );
        Ok(window)
    }

    /// Removes a window. Activities scheduled inside it stay as they are.
    pub fn delete(&self, id: CareWindowId, ctx: &AuthContext) -> CoreResult<()> {
        require_admin(ctx)?;
        self.load(id)?;
        self.windows.delete_care_window(id)?;
        info!(
            "event=care_window_delete module=care status=ok window_id={id} actor_id={}",
            ctx.actor_id
        );
        Ok(())
    }

    /// Loads one window; caregivers may only read their own windows.
    pub fn get(&self, id: CareWindowId, ctx: &AuthContext) -> CoreResult<CareWindow> {
        let window = self.load(id)?;
        if let Some(caregiver_id) = ctx.caregiver_id() {
            if window.caregiver_id != caregiver_id {
                return Err(AuthorizationError::NotSelfOrAdmin {
                    target: window.caregiver_id,
                }
                .into());
            }
        }
        Ok(window)
    }

    /// Lists the windows linking one patient to one caregiver.
    pub fn list_for_pair(
        &self,
        patient_id: PatientId,
        caregiver_id: UserId,
        ctx: &AuthContext,
    ) -> CoreResult<Vec<CareWindow>> {
        require_self_or_admin(ctx, caregiver_id)?;
        self.ensure_patient(patient_id)?;
        self.ensure_caregiver(caregiver_id)?;

        let query = CareWindowQuery {
            patient_id: Some(patient_id),
            caregiver_id: Some(caregiver_id),
            ..CareWindowQuery::default()
        };
        Ok(self.windows.list_care_windows(&query)?)
    }

    fn load(&self, id: CareWindowId) -> CoreResult<CareWindow> {
        self.windows
            .get_care_window(id)?
            .ok_or_else(|| CoreError::not_found(EntityKind::CareWindow, id))
    }

    fn ensure_references(&self, draft: &CareWindowDraft) -> CoreResult<()> {
        self.ensure_patient(draft.patient_id)?;
        self.ensure_caregiver(draft.caregiver_id)
    }

    fn ensure_patient(&self, patient_id: PatientId) -> CoreResult<()> {
        match self.directory.get_patient(patient_id)? {
            Some(_) => Ok(()),
            None => Err(CoreError::not_found(EntityKind::Patient, patient_id)),
        }
    }

    fn ensure_caregiver(&self, caregiver_id: UserId) -> CoreResult<()> {
        match self.directory.get_user(caregiver_id)? {
            Some(user) if user.is_caregiver() => Ok(()),
            _ => Err(CoreError::not_found(EntityKind::Caregiver, caregiver_id)),
        }
    }

    fn ensure_no_conflict(
        &self,
        window: &CareWindow,
        exclude: Option<CareWindowId>,
    ) -> CoreResult<()> {
        let same_weekday = self
            .windows
            .list_care_windows(&CareWindowQuery::weekday(window.weekday))?;

        match find_window_conflict(window, &same_weekday, exclude) {
            Some(existing) => {
                warn!(
                    "event=care_window_conflict module=care status=rejected window_id={} existing_id={} weekday={}",
                    window.id, existing.id, window.weekday
                );
                Err(ConflictError::CareWindow(existing.id).into())
            }
            None => Ok(()),
        }
    }
}
