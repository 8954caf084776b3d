//! Custom status vocabularies
//!
//! A StatusTemplate is an alternative to the fixed lifecycle statuses:
//! an ordered list of named, colored items with exactly one initial item.

use crate::{StatusItemId, StatusTemplateId, WorkflowError, WorkflowResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a custom status vocabulary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusItem {
    pub id: StatusItemId,
    pub name: String,
    /// Display color, e.g. `#1e88e5`
    pub color: String,
    pub order: u32,
    pub is_initial: bool,
    pub is_final: bool,
}

impl StatusItem {
    pub fn new(name: impl Into<String>, color: impl Into<String>, order: u32) -> Self {
        Self {
            id: StatusItemId::generate(),
            name: name.into(),
            color: color.into(),
            order,
            is_initial: false,
            is_final: false,
        }
    }

    pub fn initial(mut self) -> Self {
        self.is_initial = true;
        self
    }

    pub fn terminal(mut self) -> Self {
        self.is_final = true;
        self
    }
}

/// An ordered custom status vocabulary
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusTemplate {
    pub id: StatusTemplateId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Items sorted by `order`
    pub items: Vec<StatusItem>,
    pub created_at: DateTime<Utc>,
}

impl StatusTemplate {
    /// Build a status template, enforcing the single-initial-item rule.
    ///
    /// Items are sorted by `order`. More than one initial item is rejected;
    /// with none flagged the first item by order is promoted.
    pub fn build(name: impl Into<String>, mut items: Vec<StatusItem>) -> WorkflowResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(WorkflowError::ValidationError(
                "status template name must not be empty".into(),
            ));
        }
        if items.is_empty() {
            return Err(WorkflowError::ValidationError(
                "status template needs at least one item".into(),
            ));
        }

        items.sort_by_key(|i| i.order);
        for pair in items.windows(2) {
            if pair[0].order == pair[1].order {
                return Err(WorkflowError::ValidationError(format!(
                    "duplicate status item order {}",
                    pair[0].order
                )));
            }
        }

        match items.iter().filter(|i| i.is_initial).count() {
            0 => items[0].is_initial = true,
            1 => {}
            n => {
                return Err(WorkflowError::ValidationError(format!(
                    "status template has {} initial items, expected exactly one",
                    n
                )))
            }
        }

        Ok(Self {
            id: StatusTemplateId::generate(),
            name,
            description: String::new(),
            items,
            created_at: Utc::now(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The designated initial item
    pub fn initial_item(&self) -> Option<&StatusItem> {
        self.items.iter().find(|i| i.is_initial)
    }

    pub fn item(&self, id: &StatusItemId) -> Option<&StatusItem> {
        self.items.iter().find(|i| &i.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_item_promoted_when_none_initial() {
        let template = StatusTemplate::build(
            "Claims",
            vec![
                StatusItem::new("Review", "#fbc02d", 2),
                StatusItem::new("Received", "#1e88e5", 1),
                StatusItem::new("Paid", "#43a047", 3).terminal(),
            ],
        )
        .unwrap();

        let initial = template.initial_item().unwrap();
        assert_eq!(initial.name, "Received");
        assert_eq!(template.items.iter().filter(|i| i.is_initial).count(), 1);
    }

    #[test]
    fn test_explicit_initial_kept() {
        let template = StatusTemplate::build(
            "Claims",
            vec![
                StatusItem::new("Received", "#1e88e5", 1),
                StatusItem::new("Review", "#fbc02d", 2).initial(),
            ],
        )
        .unwrap();
        assert_eq!(template.initial_item().unwrap().name, "Review");
    }

    #[test]
    fn test_duplicate_initial_rejected() {
        let result = StatusTemplate::build(
            "Claims",
            vec![
                StatusItem::new("A", "#000", 1).initial(),
                StatusItem::new("B", "#fff", 2).initial(),
            ],
        );
        assert!(matches!(result, Err(WorkflowError::ValidationError(_))));
    }

    #[test]
    fn test_empty_and_duplicate_order_rejected() {
        assert!(StatusTemplate::build("Empty", vec![]).is_err());
        assert!(StatusTemplate::build(
            "Dup",
            vec![StatusItem::new("A", "#000", 1), StatusItem::new("B", "#fff", 1)],
        )
        .is_err());
    }
}
