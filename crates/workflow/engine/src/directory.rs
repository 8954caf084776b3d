//! Identity and team directory consumed by the orchestrator

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use workflow_types::{Role, TeamId, User, UserId, WorkflowResult};

/// Lookup of users, team membership and roles
#[async_trait]
pub trait Directory: Send + Sync {
    /// Get a user by ID
    async fn get_user(&self, id: &UserId) -> WorkflowResult<Option<User>>;

    /// Teams the user belongs to
    async fn team_memberships(&self, id: &UserId) -> WorkflowResult<Vec<TeamId>>;

    /// Members of a team
    async fn team_members(&self, team: &TeamId) -> WorkflowResult<Vec<UserId>>;

    /// Whether the user holds a role
    async fn has_role(&self, id: &UserId, role: Role) -> WorkflowResult<bool>;
}

/// In-memory directory, seeded from configuration
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id.clone(), u)).collect()),
        }
    }

    /// Create or replace a user
    pub async fn upsert_user(&self, user: User) {
        let mut users = self.users.write().await;
        users.insert(user.id.clone(), user);
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn get_user(&self, id: &UserId) -> WorkflowResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(id).cloned())
    }

    async fn team_memberships(&self, id: &UserId) -> WorkflowResult<Vec<TeamId>> {
        let users = self.users.read().await;
        Ok(users.get(id).map(|u| u.teams.clone()).unwrap_or_default())
    }

    async fn team_members(&self, team: &TeamId) -> WorkflowResult<Vec<UserId>> {
        let users = self.users.read().await;
        let mut members: Vec<UserId> = users
            .values()
            .filter(|u| u.active && u.teams.contains(team))
            .map(|u| u.id.clone())
            .collect();
        members.sort();
        Ok(members)
    }

    async fn has_role(&self, id: &UserId, role: Role) -> WorkflowResult<bool> {
        let users = self.users.read().await;
        Ok(users.get(id).is_some_and(|u| u.active && u.has_role(role)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> InMemoryDirectory {
        InMemoryDirectory::with_users([
            User::new("ana", "Ana").in_team("billing").with_role(Role::Admin),
            User::new("bruno", "Bruno").in_team("billing").in_team("support"),
            User::new("carla", "Carla").in_team("support"),
        ])
    }

    #[tokio::test]
    async fn test_lookup_and_membership() {
        let dir = directory();
        assert!(dir.get_user(&UserId::new("ana")).await.unwrap().is_some());
        assert!(dir.get_user(&UserId::new("nobody")).await.unwrap().is_none());

        let teams = dir.team_memberships(&UserId::new("bruno")).await.unwrap();
        assert_eq!(teams.len(), 2);

        let members = dir.team_members(&TeamId::new("support")).await.unwrap();
        assert_eq!(members, vec![UserId::new("bruno"), UserId::new("carla")]);
    }

    #[tokio::test]
    async fn test_roles() {
        let dir = directory();
        assert!(dir.has_role(&UserId::new("ana"), Role::Admin).await.unwrap());
        assert!(!dir.has_role(&UserId::new("bruno"), Role::Admin).await.unwrap());
        assert!(!dir.has_role(&UserId::new("nobody"), Role::Staff).await.unwrap());
    }

    #[tokio::test]
    async fn test_inactive_user_loses_roles_and_teams() {
        let dir = directory();
        let mut ana = dir.get_user(&UserId::new("ana")).await.unwrap().unwrap();
        ana.active = false;
        dir.upsert_user(ana).await;

        assert!(!dir.has_role(&UserId::new("ana"), Role::Admin).await.unwrap());
        let members = dir.team_members(&TeamId::new("billing")).await.unwrap();
        assert_eq!(members, vec![UserId::new("bruno")]);
        assert_eq!(dir.user_count().await, 3);
    }
}
