//! Who may see a workflow in listings
//!
//! Visibility is a read filter only. Mutation rights are checked by the
//! orchestrator against creator, holder and role.

use std::collections::HashSet;
use workflow_types::{TeamId, UserId, Visibility, Workflow, WorkflowId};

/// Everything the predicate needs to know about the reader
#[derive(Clone, Debug)]
pub struct Viewer {
    pub user_id: UserId,
    pub teams: Vec<TeamId>,
    /// Workflows on which the user holds or once held an assignment
    pub held_workflows: HashSet<WorkflowId>,
}

impl Viewer {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            teams: Vec::new(),
            held_workflows: HashSet::new(),
        }
    }

    pub fn with_teams(mut self, teams: Vec<TeamId>) -> Self {
        self.teams = teams;
        self
    }

    pub fn with_held(mut self, held: HashSet<WorkflowId>) -> Self {
        self.held_workflows = held;
        self
    }
}

/// Whether `viewer` may see `workflow`
pub fn is_visible(workflow: &Workflow, viewer: &Viewer) -> bool {
    if workflow.created_by == viewer.user_id {
        return true;
    }
    match workflow.visibility {
        Visibility::Public => true,
        Visibility::Team => workflow
            .team_id
            .as_ref()
            .is_some_and(|team| viewer.teams.contains(team)),
        Visibility::Restricted => viewer.held_workflows.contains(&workflow.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use workflow_types::TemplateId;

    fn workflow(visibility: Visibility) -> Workflow {
        Workflow::new(TemplateId::new("t"), "Case", UserId::new("ana"), 2)
            .with_visibility(visibility)
            .with_team(TeamId::new("billing"))
    }

    #[test]
    fn test_public_visible_to_anyone() {
        let wf = workflow(Visibility::Public);
        assert!(is_visible(&wf, &Viewer::new(UserId::new("zeca"))));
    }

    #[test]
    fn test_team_requires_membership() {
        let wf = workflow(Visibility::Team);
        let member = Viewer::new(UserId::new("bruno")).with_teams(vec![TeamId::new("billing")]);
        let outsider = Viewer::new(UserId::new("carla")).with_teams(vec![TeamId::new("support")]);
        assert!(is_visible(&wf, &member));
        assert!(!is_visible(&wf, &outsider));
    }

    #[test]
    fn test_team_without_team_id_hidden() {
        let mut wf = workflow(Visibility::Team);
        wf.team_id = None;
        let member = Viewer::new(UserId::new("bruno")).with_teams(vec![TeamId::new("billing")]);
        assert!(!is_visible(&wf, &member));
    }

    #[test]
    fn test_restricted_requires_past_or_present_assignment() {
        let wf = workflow(Visibility::Restricted);
        let former_holder = Viewer::new(UserId::new("bruno"))
            .with_held(HashSet::from([wf.id.clone()]));
        let stranger = Viewer::new(UserId::new("carla")).with_teams(vec![TeamId::new("billing")]);
        assert!(is_visible(&wf, &former_holder));
        assert!(!is_visible(&wf, &stranger));
    }

    #[test]
    fn test_new_viewer_has_no_teams_or_holdings() {
        let viewer = Viewer::new(UserId::new("zeca"));
        assert!(viewer.teams.is_empty());
        assert!(viewer.held_workflows.is_empty());
        assert!(!is_visible(&workflow(Visibility::Team), &viewer));
        assert!(!is_visible(&workflow(Visibility::Restricted), &viewer));
    }

    #[test]
    fn test_creator_always_sees() {
        let wf = workflow(Visibility::Restricted);
        assert!(is_visible(&wf, &Viewer::new(UserId::new("ana"))));
    }
}
