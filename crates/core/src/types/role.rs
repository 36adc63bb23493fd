//! Role derivation from the session's boolean flags.

use serde::{Deserialize, Serialize};

/// The four role flags returned by the login endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct RoleFlags {
    pub is_admin: bool,
    pub is_teacher: bool,
    pub is_student: bool,
    pub is_parent: bool,
}

/// Single-tag classification of the signed-in user, used for UI gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// School administrator; sees everything.
    Admin,
    Teacher,
    Parent,
    Student,
    /// No flag set (signed out or a corrupted store).
    #[default]
    Unknown,
}

impl Role {
    /// Every role that can be granted access to something.
    pub const KNOWN: [Self; 4] = [Self::Admin, Self::Teacher, Self::Parent, Self::Student];

    /// Resolve the role from stored flags.
    ///
    /// Flags are checked in priority order admin > teacher > parent > student,
    /// so a store with several flags set still yields a single role.
    #[must_use]
    pub const fn from_flags(flags: RoleFlags) -> Self {
        if flags.is_admin {
            Self::Admin
        } else if flags.is_teacher {
            Self::Teacher
        } else if flags.is_parent {
            Self::Parent
        } else if flags.is_student {
            Self::Student
        } else {
            Self::Unknown
        }
    }

    /// Returns `true` for any role other than [`Role::Unknown`].
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Lowercase tag used in logs and CLI output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Parent => "parent",
            Self::Student => "student",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "teacher" => Ok(Self::Teacher),
            "parent" => Ok(Self::Parent),
            "student" => Ok(Self::Student),
            "unknown" | "?" => Ok(Self::Unknown),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn flags(is_admin: bool, is_teacher: bool, is_parent: bool, is_student: bool) -> RoleFlags {
        RoleFlags {
            is_admin,
            is_teacher,
            is_student,
            is_parent,
        }
    }

    #[test]
    fn test_single_flag_maps_to_role() {
        assert_eq!(Role::from_flags(flags(true, false, false, false)), Role::Admin);
        assert_eq!(Role::from_flags(flags(false, true, false, false)), Role::Teacher);
        assert_eq!(Role::from_flags(flags(false, false, true, false)), Role::Parent);
        assert_eq!(Role::from_flags(flags(false, false, false, true)), Role::Student);
    }

    #[test]
    fn test_priority_order_when_several_flags_set() {
        assert_eq!(Role::from_flags(flags(true, true, true, true)), Role::Admin);
        assert_eq!(Role::from_flags(flags(false, true, true, true)), Role::Teacher);
        assert_eq!(Role::from_flags(flags(false, false, true, true)), Role::Parent);
    }

    #[test]
    fn test_no_flags_is_unknown() {
        assert_eq!(Role::from_flags(RoleFlags::default()), Role::Unknown);
        assert!(!Role::Unknown.is_known());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let f = flags(false, true, false, true);
        assert_eq!(Role::from_flags(f), Role::from_flags(f));
    }

    #[test]
    fn test_role_round_trips_through_str() {
        for role in Role::KNOWN {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }
        assert_eq!("?".parse::<Role>(), Ok(Role::Unknown));
        assert!("janitor".parse::<Role>().is_err());
    }
}
