//! Identifiers for every workflow entity
//!
//! All identifiers are opaque string newtypes. Generated identifiers are
//! UUIDv4; callers may also supply their own (e.g. directory user ids).

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// First eight characters, for log lines
            pub fn short(&self) -> &str {
                match self.0.char_indices().nth(8) {
                    Some((end, _)) => &self.0[..end],
                    None => &self.0,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Unique identifier for a workflow template
    TemplateId
);
string_id!(
    /// Unique identifier for a template step
    TemplateStepId
);
string_id!(
    /// Unique identifier for a status template (custom status vocabulary)
    StatusTemplateId
);
string_id!(
    /// Unique identifier for an item of a status template
    StatusItemId
);
string_id!(
    /// Unique identifier for a running workflow
    WorkflowId
);
string_id!(
    /// Unique identifier for a step assignment
    AssignmentId
);
string_id!(
    /// Unique identifier for a ledger transition
    TransitionId
);
string_id!(
    /// Unique identifier for an emitted notification
    NotificationId
);
string_id!(
    /// Directory identifier of a user (actor)
    UserId
);
string_id!(
    /// Directory identifier of a team
    TeamId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = WorkflowId::generate();
        let b = WorkflowId::generate();
        assert_ne!(a, b);
        assert_eq!(a.short().len(), 8);
    }

    #[test]
    fn test_id_display_and_serde() {
        let id = UserId::new("ana");
        assert_eq!(id.to_string(), "ana");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ana\"");

        let back: UserId = serde_json::from_str("\"ana\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_short_on_tiny_id() {
        assert_eq!(TeamId::new("ops").short(), "ops");
    }
}
