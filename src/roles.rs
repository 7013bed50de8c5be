//! Role and permission model.
//!
//! Roles form a closed set; the permission record for a role is fixed at
//! compile time and looked up infallibly. Permissions are reported to clients
//! but not enforced on catalog routes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    ContentManager,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::ContentManager => "content_manager",
            Role::Viewer => "viewer",
        }
    }

    /// Permission record for this role.
    pub fn permissions(&self) -> RolePermissions {
        match self {
            Role::SuperAdmin => RolePermissions {
                can_manage_books: true,
                can_manage_subjects: true,
                can_manage_users: true,
                can_view_analytics: true,
                can_access_settings: true,
                can_delete_content: true,
            },
            Role::ContentManager => RolePermissions {
                can_manage_books: true,
                can_manage_subjects: true,
                can_manage_users: false,
                can_view_analytics: true,
                can_access_settings: false,
                can_delete_content: false,
            },
            Role::Viewer => RolePermissions {
                can_manage_books: false,
                can_manage_subjects: false,
                can_manage_users: false,
                can_view_analytics: true,
                can_access_settings: false,
                can_delete_content: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissions {
    pub can_manage_books: bool,
    pub can_manage_subjects: bool,
    pub can_manage_users: bool,
    pub can_view_analytics: bool,
    pub can_access_settings: bool,
    pub can_delete_content: bool,
}

/// A selectable demo identity. The set is fixed; there is no user database
/// behind these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DemoUser {
    pub id: &'static str,
    pub email: &'static str,
    pub name: &'static str,
    pub role: Role,
}

pub const DEMO_USERS: [DemoUser; 3] = [
    DemoUser {
        id: "1",
        email: "admin@wnss.edu",
        name: "Super Administrator",
        role: Role::SuperAdmin,
    },
    DemoUser {
        id: "2",
        email: "content@wnss.edu",
        name: "Content Manager",
        role: Role::ContentManager,
    },
    DemoUser {
        id: "3",
        email: "viewer@wnss.edu",
        name: "Viewer",
        role: Role::Viewer,
    },
];

impl DemoUser {
    /// Look up a demo identity by id.
    pub fn by_id(id: &str) -> Option<DemoUser> {
        DEMO_USERS.iter().find(|u| u.id == id).copied()
    }

    /// The identity every fresh session starts as.
    pub fn default_identity() -> DemoUser {
        DEMO_USERS[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn super_admin_has_all_permissions() {
        let p = Role::SuperAdmin.permissions();
        assert!(p.can_manage_books);
        assert!(p.can_manage_subjects);
        assert!(p.can_manage_users);
        assert!(p.can_view_analytics);
        assert!(p.can_access_settings);
        assert!(p.can_delete_content);
    }

    #[test]
    fn content_manager_cannot_touch_users_or_settings() {
        let p = Role::ContentManager.permissions();
        assert!(p.can_manage_books);
        assert!(p.can_manage_subjects);
        assert!(!p.can_manage_users);
        assert!(p.can_view_analytics);
        assert!(!p.can_access_settings);
        assert!(!p.can_delete_content);
    }

    #[test]
    fn viewer_only_views_analytics() {
        let p = Role::Viewer.permissions();
        assert!(!p.can_manage_books);
        assert!(!p.can_manage_subjects);
        assert!(!p.can_manage_users);
        assert!(p.can_view_analytics);
        assert!(!p.can_access_settings);
        assert!(!p.can_delete_content);
    }

    #[test]
    fn role_set_is_closed() {
        assert!(serde_json::from_str::<Role>("\"super_admin\"").is_ok());
        assert!(serde_json::from_str::<Role>("\"viewer\"").is_ok());
        assert!(serde_json::from_str::<Role>("\"editor\"").is_err());
        assert!(serde_json::from_str::<Role>("\"SUPER_ADMIN\"").is_err());
    }

    #[test]
    fn demo_lookup_covers_exactly_the_three_identities() {
        assert_eq!(DemoUser::by_id("1").unwrap().role, Role::SuperAdmin);
        assert_eq!(DemoUser::by_id("2").unwrap().role, Role::ContentManager);
        assert_eq!(DemoUser::by_id("3").unwrap().role, Role::Viewer);
        assert!(DemoUser::by_id("4").is_none());
        assert!(DemoUser::by_id("").is_none());
    }

    #[test]
    fn default_identity_is_super_admin() {
        assert_eq!(DemoUser::default_identity().id, "1");
        assert_eq!(DemoUser::default_identity().role, Role::SuperAdmin);
    }
}
