//! Authorization predicates for mutating operations.

use std::fmt;

use uuid::Uuid;

use crate::domain::Insight;
use crate::error::DomainError;

/// Mutations that only the creator may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerAction {
    Update,
    Delete,
}

impl fmt::Display for OwnerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerAction::Update => f.write_str("update"),
            OwnerAction::Delete => f.write_str("delete"),
        }
    }
}

/// Fail with [`DomainError::Forbidden`] unless `actor` created `insight`.
pub fn ensure_owner(insight: &Insight, actor: Uuid, action: OwnerAction) -> Result<(), DomainError> {
    if insight.is_owned_by(actor) {
        Ok(())
    } else {
        Err(DomainError::Forbidden(format!(
            "Only the owner can {action} this insight."
        )))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::{Category, Creator};

    fn owned_by(owner: Uuid) -> Insight {
        let now = Utc::now();
        Insight {
            id: Uuid::new_v4(),
            title: "Alpha insight".to_string(),
            category: Category::Macro,
            body: "This is a long enough body for validation.".to_string(),
            tags: vec!["CPI".to_string()],
            creator: Creator {
                id: owner,
                username: "owner".to_string(),
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_owner_is_allowed() {
        let owner = Uuid::new_v4();
        assert!(ensure_owner(&owned_by(owner), owner, OwnerAction::Update).is_ok());
    }

    #[test]
    fn test_other_user_is_forbidden() {
        let insight = owned_by(Uuid::new_v4());

        let err = ensure_owner(&insight, Uuid::new_v4(), OwnerAction::Delete).unwrap_err();

        match err {
            DomainError::Forbidden(msg) => {
                assert_eq!(msg, "Only the owner can delete this insight.")
            }
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }
}
