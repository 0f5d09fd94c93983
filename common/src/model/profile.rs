use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Operator role. Governs the initial status of new records and which
/// actions are offered; see [`crate::authz`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Supervisor,
    #[serde(rename = "funcionario")]
    Employee,
    /// Read-only ("consulta"). Also the fallback role of a degraded session.
    #[serde(rename = "consulta")]
    ReadOnly,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Supervisor => "supervisor",
            Role::Employee => "funcionario",
            Role::ReadOnly => "consulta",
        }
    }

    pub fn is_reviewer(&self) -> bool {
        matches!(self, Role::Admin | Role::Supervisor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row of the `perfis` table, keyed by the auth user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(rename = "nome", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
    #[serde(rename = "ativo", default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_uses_platform_spelling() {
        assert_eq!(serde_json::to_string(&Role::Employee).unwrap(), "\"funcionario\"");
        assert_eq!(serde_json::to_string(&Role::ReadOnly).unwrap(), "\"consulta\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn profile_defaults_to_active() {
        let profile: Profile = serde_json::from_value(serde_json::json!({
            "id": "6f3c1c0e-5a57-4f3a-9a55-0d35e0f1d7a1",
            "role": "supervisor"
        }))
        .unwrap();
        assert!(profile.active);
        assert!(profile.role.is_reviewer());
    }
}
