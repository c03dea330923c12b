//! Session Claim
//!
//! Identity attached to a request once its bearer token has been verified.
//! Read-only for the rest of the request.

use serde::{Deserialize, Serialize};

/// Role flags carried in the session token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFlags {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub support: bool,
    #[serde(default)]
    pub supervisor: bool,
    #[serde(default)]
    pub kyc: bool,
    #[serde(default)]
    pub communicator: bool,
}

impl RoleFlags {
    /// Whether any staff role is set
    pub const fn is_staff(&self) -> bool {
        self.admin || self.support || self.supervisor || self.kyc || self.communicator
    }
}

/// Authenticated identity of the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaim {
    /// Exchange user id
    pub id: i64,
    pub email: String,
    /// Id of the user on the shared exchange network
    pub network_id: i64,
    #[serde(default)]
    pub roles: RoleFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_default_to_plain_user() {
        let claim: SessionClaim =
            serde_json::from_str(r#"{"id":7,"email":"a@b.io","network_id":70}"#).unwrap();
        assert_eq!(claim.roles, RoleFlags::default());
        assert!(!claim.roles.is_staff());
    }

    #[test]
    fn test_is_staff() {
        let roles = RoleFlags {
            kyc: true,
            ..RoleFlags::default()
        };
        assert!(roles.is_staff());
    }
}
