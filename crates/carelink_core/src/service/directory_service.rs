//! Patient, caregiver and medical record use-cases.
//!
//! # Invariants
//! - Directory mutations other than medical records require an administrator.
//! - Caregivers see a patient only when they hold at least one window with it.
//! - Administrator accounts are never exposed through caregiver lookups.

use crate::clock::Clock;
use crate::error::{AuthorizationError, CoreError, CoreResult, EntityKind};
use crate::model::actor::{AuthContext, Role, UserId};
use crate::model::directory::{CaregiverInput, MedicalRecord, Patient, PatientId, PatientInput, User};
use crate::model::input::sanitize_text;
use crate::repo::care_window_repo::{CareWindowQuery, CareWindowRepository};
use crate::repo::directory_repo::DirectoryRepository;
use crate::service::access_scope::{filter_visible, require_admin, require_self_or_admin};
use log::info;

/// Use-case service for the people and records the scheduler references.
pub struct DirectoryService<D: DirectoryRepository, C: CareWindowRepository, K: Clock> {
    directory: D,
    windows: C,
    clock: K,
}

impl<D: DirectoryRepository, C: CareWindowRepository, K: Clock> DirectoryService<D, C, K> {
    pub fn new(directory: D, windows: C, clock: K) -> Self {
        Self {
            directory,
            windows,
            clock,
        }
    }

    /// Profile of the acting user.
    pub fn current_user(&self, ctx: &AuthContext) -> CoreResult<User> {
        self.directory
            .get_user(ctx.actor_id)?
            .ok_or_else(|| CoreError::not_found(EntityKind::User, ctx.actor_id))
    }

    pub fn create_patient(&self, input: PatientInput, ctx: &AuthContext) -> CoreResult<Patient> {
        require_admin(ctx)?;
        let patient = input.into_patient()?;
        self.directory.create_patient(&patient)?;
        info!(
            "event=patient_create module=directory status=ok patient_id={} actor_id={}",
            patient.id, ctx.actor_id
        );
        Ok(patient)
    }

    /// Lists patients ordered by name, filtered to linked ones for caregivers.
    pub fn list_patients(&self, ctx: &AuthContext) -> CoreResult<Vec<Patient>> {
        let patients = self.directory.list_patients()?;
        let windows = match ctx.caregiver_id() {
            Some(caregiver_id) => self
                .windows
                .list_care_windows(&CareWindowQuery::caregiver(caregiver_id))?,
            None => Vec::new(),
        };

        Ok(filter_visible(ctx, patients, |patient| {
            windows
                .iter()
                .filter(|window| window.patient_id == patient.id)
                .map(|window| window.caregiver_id)
                .collect::<Vec<UserId>>()
        }))
    }

    /// Creates a caregiver account numbered after existing `first.last` names.
    pub fn create_caregiver(&self, input: CaregiverInput, ctx: &AuthContext) -> CoreResult<User> {
        require_admin(ctx)?;
        let draft = input.into_draft()?;
        let existing = self
            .directory
            .count_usernames_with_prefix(&draft.username_base)?;
        let user = draft.into_user(existing);

        self.directory.create_user(&user)?;
        info!(
            "event=caregiver_create module=directory status=ok caregiver_id={} actor_id={}",
            user.id, ctx.actor_id
        );
        Ok(user)
    }

    pub fn list_caregivers(&self, ctx: &AuthContext) -> CoreResult<Vec<User>> {
        require_admin(ctx)?;
        Ok(self.directory.list_users(Some(Role::Caregiver))?)
    }

    pub fn get_caregiver(&self, caregiver_id: UserId, ctx: &AuthContext) -> CoreResult<User> {
        require_self_or_admin(ctx, caregiver_id)?;
        match self.directory.get_user(caregiver_id)? {
            Some(user) if user.is_caregiver() => Ok(user),
            _ => Err(CoreError::not_found(EntityKind::Caregiver, caregiver_id)),
        }
    }

    /// Lists a patient's records; caregivers only get the ones they wrote.
    pub fn list_medical_records(
        &self,
        patient_id: PatientId,
        ctx: &AuthContext,
    ) -> CoreResult<Vec<MedicalRecord>> {
        self.ensure_patient(patient_id)?;
        let records = self.directory.list_medical_records(patient_id)?;
        Ok(filter_visible(ctx, records, |record| [record.author_id]))
    }

    /// Appends a record authored by the actor.
    pub fn add_medical_record(
        &self,
        patient_id: PatientId,
        content: &str,
        ctx: &AuthContext,
    ) -> CoreResult<MedicalRecord> {
        let content = sanitize_text(content);
        if content.is_empty() {
            return Err(CoreError::MissingParams(vec!["content"]));
        }
        self.ensure_patient(patient_id)?;
        if let Some(caregiver_id) = ctx.caregiver_id() {
            let query = CareWindowQuery {
                patient_id: Some(patient_id),
                caregiver_id: Some(caregiver_id),
                ..CareWindowQuery::default()
            };
            if self.windows.list_care_windows(&query)?.is_empty() {
                return Err(AuthorizationError::NotLinked { patient_id }.into());
            }
        }

        let record = MedicalRecord::new(patient_id, ctx.actor_id, content, self.clock.now());
        self.directory.create_medical_record(&record)?;
        info!(
            "event=medical_record_create module=directory status=ok record_id={} patient_id={} actor_id={}",
            record.id, patient_id, ctx.actor_id
        );
        Ok(record)
    }

    fn ensure_patient(&self, patient_id: PatientId) -> CoreResult<()> {
        match self.directory.get_patient(patient_id)? {
            Some(_) => Ok(()),
            None => Err(CoreError::not_found(EntityKind::Patient, patient_id)),
        }
    }
}
