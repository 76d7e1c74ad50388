//! Role-based visibility and authorization gates.
//!
//! # Invariants
//! - Administrators pass every gate and see unfiltered sets.
//! - Caregivers only see entities whose relation set contains their id.

use crate::error::AuthorizationError;
use crate::model::actor::{AuthContext, UserId};

/// Fails unless the actor is an administrator.
pub fn require_admin(ctx: &AuthContext) -> Result<(), AuthorizationError> {
    if ctx.is_admin() {
        Ok(())
    } else {
        Err(AuthorizationError::AdminRequired)
    }
}

/// Passes iff the actor targets itself or is an administrator.
pub fn require_self_or_admin(ctx: &AuthContext, target_id: UserId) -> Result<(), AuthorizationError> {
    if ctx.is_admin() || ctx.actor_id == target_id {
        Ok(())
    } else {
        Err(AuthorizationError::NotSelfOrAdmin { target: target_id })
    }
}

/// Keeps the entities visible to `ctx`.
///
/// `relation` yields the caregiver ids linked to one entity. It is not
/// called at all for administrators.
pub fn filter_visible<T, F, I>(ctx: &AuthContext, entities: Vec<T>, relation: F) -> Vec<T>
where
    F: Fn(&T) -> I,
    I: IntoIterator<Item = UserId>,
{
    match ctx.caregiver_id() {
        None => entities,
        Some(caregiver_id) => entities
            .into_iter()
            .filter(|entity| relation(entity).into_iter().any(|id| id == caregiver_id))
            .collect(),
    }
}
