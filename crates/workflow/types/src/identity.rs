//! Directory records: users, roles and team membership

use crate::{TeamId, UserId};
use serde::{Deserialize, Serialize};

/// Directory role
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Supervisor,
    Staff,
}

impl Role {
    /// Roles allowed to act on any workflow regardless of ownership
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::Admin | Role::Supervisor)
    }
}

/// A person known to the directory
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub teams: Vec<TeamId>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
            email: String::new(),
            roles: vec![Role::Staff],
            teams: Vec::new(),
            active: true,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    pub fn in_team(mut self, team: impl Into<String>) -> Self {
        self.teams.push(TeamId::new(team));
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_elevated(&self) -> bool {
        self.roles.iter().any(Role::is_elevated)
    }
}
