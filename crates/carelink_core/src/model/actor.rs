//! Acting identity passed explicitly into every core call.
//!
//! # Invariants
//! - Role belongs to the actor, never to scheduled entities.
//! - The core never reads the actor from shared state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for users (administrators and caregivers).
pub type UserId = Uuid;

/// Role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Caregiver,
}

impl Role {
    /// Storage and wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Caregiver => "CAREGIVER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ADMIN" => Some(Self::Admin),
            "CAREGIVER" => Some(Self::Caregiver),
            _ => None,
        }
    }
}

/// Authenticated actor for the current request.
///
/// Produced by the authentication collaborator; the core only consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    pub actor_id: UserId,
    pub role: Role,
}

impl AuthContext {
    pub fn new(actor_id: UserId, role: Role) -> Self {
        Self { actor_id, role }
    }

    pub fn admin(actor_id: UserId) -> Self {
        Self::new(actor_id, Role::Admin)
    }

    pub fn caregiver(actor_id: UserId) -> Self {
        Self::new(actor_id, Role::Caregiver)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Returns the actor id when acting as caregiver.
    pub fn caregiver_id(&self) -> Option<UserId> {
        match self.role {
            Role::Caregiver => Some(self.actor_id),
            Role::Admin => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthContext, Role};
    use uuid::Uuid;

    #[test]
    fn role_roundtrips_storage_spelling() {
        for role in [Role::Admin, Role::Caregiver] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("admin"), None);
    }

    #[test]
    fn caregiver_id_is_only_exposed_for_caregivers() {
        let id = Uuid::new_v4();
        assert_eq!(AuthContext::caregiver(id).caregiver_id(), Some(id));
        assert_eq!(AuthContext::admin(id).caregiver_id(), None);
    }
}
