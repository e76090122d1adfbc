use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a resolved actor, supplied by the upstream identity service.
/// Treated as an opaque enum here; the core only does membership checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Coach,
    Admin,
    Staff,
    SemiAdmin,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "coach" => Some(Role::Coach),
            "admin" => Some(Role::Admin),
            "staff" => Some(Role::Staff),
            "semi_admin" => Some(Role::SemiAdmin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Coach => "coach",
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::SemiAdmin => "semi_admin",
        }
    }
}

/// A resolved actor attached to every request by the identity middleware.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Actor {
    /// The actor's user id.
    pub id: Uuid,
    /// The actor's resolved role.
    pub role: Role,
}

impl Actor {
    /// Whether the actor can override any session regardless of ownership.
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Whether the actor can read across all clients and coaches.
    pub fn can_view_all(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Staff | Role::SemiAdmin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_round_trips() {
        for role in [Role::User, Role::Coach, Role::Admin, Role::Staff, Role::SemiAdmin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn only_admin_overrides_ownership() {
        let admin = Actor { id: Uuid::new_v4(), role: Role::Admin };
        let staff = Actor { id: Uuid::new_v4(), role: Role::Staff };
        assert!(admin.is_admin());
        assert!(!staff.is_admin());
        assert!(staff.can_view_all());
    }
}
