use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical role of a user.
///
/// Stored rows may still carry legacy strings (`user`, `superadmin`) or only
/// the old `is_admin` flag, so every read goes through [`Role::normalize`].
/// Nothing else in the crate should branch on raw role strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    StudentAdmin,
    Admin,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Student, Role::StudentAdmin, Role::Admin, Role::SuperAdmin];

    /// Map a raw, possibly legacy role string plus the legacy admin flag to a
    /// canonical role. Total: unknown or missing strings fall back to the flag.
    pub fn normalize(raw: Option<&str>, is_admin: bool) -> Role {
        let mapped = match raw {
            Some("user") | Some("student") => Some(Role::Student),
            Some("superadmin") | Some("super_admin") => Some(Role::SuperAdmin),
            Some("student_admin") => Some(Role::StudentAdmin),
            Some("admin") => Some(Role::Admin),
            _ => None,
        };

        mapped.unwrap_or(if is_admin { Role::Admin } else { Role::Student })
    }

    /// Strict parse of the four canonical names. Used for role-change input,
    /// where legacy aliases are not accepted.
    pub fn parse_canonical(s: &str) -> Option<Role> {
        match s {
            "student" => Some(Role::Student),
            "student_admin" => Some(Role::StudentAdmin),
            "admin" => Some(Role::Admin),
            "super_admin" => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::StudentAdmin => "student_admin",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::StudentAdmin => "Student Admin",
            Role::Admin => "Admin",
            Role::SuperAdmin => "Super Admin",
        }
    }

    pub fn has_admin_access(self) -> bool {
        matches!(self, Role::StudentAdmin | Role::Admin | Role::SuperAdmin)
    }

    pub fn can_manage_users(self) -> bool {
        self == Role::SuperAdmin
    }

    /// General permission scope. `student_admin` and `admin` are peers here.
    pub fn access_level(self) -> u8 {
        match self {
            Role::Student => 1,
            Role::StudentAdmin | Role::Admin => 2,
            Role::SuperAdmin => 3,
        }
    }

    /// Precedence for announcement arbitration. Unlike [`Role::access_level`],
    /// `admin` outranks `student_admin` here; the two must not be merged.
    pub fn announcement_priority(self) -> u8 {
        match self {
            Role::Student => 1,
            Role::StudentAdmin => 2,
            Role::Admin => 3,
            Role::SuperAdmin => 4,
        }
    }

    /// Whether this role satisfies a route that requires `required` or higher.
    pub fn meets(self, required: Role) -> bool {
        self.access_level() >= required.access_level()
    }

    /// Strictly higher announcement priority than `other`.
    pub fn outranks(self, other: Role) -> bool {
        self.announcement_priority() > other.announcement_priority()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
