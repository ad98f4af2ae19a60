use serde::{Deserialize, Serialize};

use tallyboard_core::{Role, UserId};

/// Identity a session is issued for.
///
/// Immutable once issued for a given token generation: rotation carries the
/// principal forward unchanged, and a new principal always means a new
/// session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionPrincipal {
    pub user_id: UserId,
    pub role: Role,
}

impl SessionPrincipal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}
