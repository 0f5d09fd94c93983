//! Single authorization decision used by every screen and endpoint.
//!
//! These checks are a convenience for the operator and a second line of
//! defense for the server. The security boundary is the data platform's
//! row-level security, which must encode the same rules.

use serde::{Deserialize, Serialize};

use crate::model::permission::Permission;
use crate::model::profile::Role;
use crate::model::record::RecordStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Insert,
    Edit,
    Delete,
    Approve,
    Reject,
    Export,
    Import,
    ManageModules,
    ManagePermissions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Decides whether `role` may perform `action` on a module given the actor's
/// permission row for it (if any).
///
/// Administrators bypass the permission table. Approval is gated by role
/// alone; the `can_approve` column is informational.
pub fn authorize(role: Role, action: Action, permission: Option<&Permission>) -> Decision {
    if role == Role::Admin {
        return Decision::Allow;
    }
    let granted = |check: fn(&Permission) -> bool| permission.is_some_and(check);
    match action {
        Action::ManageModules | Action::ManagePermissions => {
            Decision::Deny("Apenas administradores podem alterar a configuração")
        }
        Action::Approve | Action::Reject if !role.is_reviewer() => {
            Decision::Deny("Apenas administradores e supervisores podem revisar registros")
        }
        Action::Approve | Action::Reject => Decision::Allow,
        Action::View if granted(|p| p.can_view) => Decision::Allow,
        Action::Export if granted(|p| p.can_view && p.can_export) => Decision::Allow,
        _ if role == Role::ReadOnly => Decision::Deny("Perfil de consulta não pode alterar registros"),
        Action::Insert | Action::Import if granted(|p| p.can_view && p.can_insert) => Decision::Allow,
        Action::Edit if granted(|p| p.can_view && p.can_edit) => Decision::Allow,
        Action::Delete if role == Role::Supervisor && granted(|p| p.can_edit) => Decision::Allow,
        _ => Decision::Deny("Sem permissão para esta ação neste módulo"),
    }
}

/// Status a newly created (or edited) record starts in. Reviewers publish
/// directly; everyone else goes through approval.
pub fn initial_status(role: Role) -> RecordStatus {
    if role.is_reviewer() {
        RecordStatus::Official
    } else {
        RecordStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn permission(view: bool, insert: bool, edit: bool, export: bool) -> Permission {
        Permission {
            can_view: view,
            can_insert: insert,
            can_edit: edit,
            can_export: export,
            ..Permission::none(Uuid::new_v4(), Uuid::new_v4())
        }
    }

    #[test]
    fn admin_bypasses_permissions() {
        for action in [Action::View, Action::Delete, Action::ManageModules, Action::Approve] {
            assert!(authorize(Role::Admin, action, None).is_allowed());
        }
    }

    #[test]
    fn approval_is_role_gated() {
        let full = Permission {
            can_approve: true,
            ..permission(true, true, true, true)
        };
        assert!(authorize(Role::Supervisor, Action::Approve, None).is_allowed());
        assert!(!authorize(Role::Employee, Action::Approve, Some(&full)).is_allowed());
        assert!(!authorize(Role::ReadOnly, Action::Reject, Some(&full)).is_allowed());
    }

    #[test]
    fn employee_needs_matching_flags() {
        let view_only = permission(true, false, false, false);
        let writer = permission(true, true, true, false);
        assert!(authorize(Role::Employee, Action::View, Some(&view_only)).is_allowed());
        assert!(!authorize(Role::Employee, Action::Insert, Some(&view_only)).is_allowed());
        assert!(authorize(Role::Employee, Action::Insert, Some(&writer)).is_allowed());
        assert!(authorize(Role::Employee, Action::Import, Some(&writer)).is_allowed());
        assert!(!authorize(Role::Employee, Action::Delete, Some(&writer)).is_allowed());
        assert!(!authorize(Role::Employee, Action::Export, Some(&writer)).is_allowed());
        assert!(!authorize(Role::Employee, Action::View, None).is_allowed());
    }

    #[test]
    fn read_only_can_view_and_export_only() {
        let everything = permission(true, true, true, true);
        assert!(authorize(Role::ReadOnly, Action::View, Some(&everything)).is_allowed());
        assert!(authorize(Role::ReadOnly, Action::Export, Some(&everything)).is_allowed());
        assert!(!authorize(Role::ReadOnly, Action::Insert, Some(&everything)).is_allowed());
        assert!(!authorize(Role::ReadOnly, Action::Edit, Some(&everything)).is_allowed());
    }

    #[test]
    fn initial_status_by_role() {
        assert_eq!(initial_status(Role::Admin), RecordStatus::Official);
        assert_eq!(initial_status(Role::Supervisor), RecordStatus::Official);
        assert_eq!(initial_status(Role::Employee), RecordStatus::Pending);
        assert_eq!(initial_status(Role::ReadOnly), RecordStatus::Pending);
    }
}
