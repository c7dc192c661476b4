use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// The three row-level mutation kinds the pipeline replicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Insert,
    Update,
    Delete,
}

/// A decoded row, keyed by column name (matching the declared model's
/// `column_name`s, in model-declaration order for iteration where order
/// matters, e.g. the Statement Builder).
pub type RowValues = HashMap<String, Value>;

/// The unit stored in the change-log. `new_values` is present iff
/// `action` is `Insert` or `Update`; `old_values` is present iff `action`
/// is `Update` or `Delete`. For `Update`, `old_values` must be the
/// pre-image of the same row as `new_values`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub action: Action,
    pub new_values: Option<RowValues>,
    pub old_values: Option<RowValues>,
}

impl ChangeRecord {
    pub fn insert(new_values: RowValues) -> Self {
        ChangeRecord {
            action: Action::Insert,
            new_values: Some(new_values),
            old_values: None,
        }
    }

    pub fn update(old_values: RowValues, new_values: RowValues) -> Self {
        ChangeRecord {
            action: Action::Update,
            new_values: Some(new_values),
            old_values: Some(old_values),
        }
    }

    pub fn delete(old_values: RowValues) -> Self {
        ChangeRecord {
            action: Action::Delete,
            new_values: None,
            old_values: Some(old_values),
        }
    }

    /// Field-by-field equality under kind-appropriate equality, used by the
    /// record codec's round-trip law.
    pub fn equivalent(&self, other: &ChangeRecord) -> bool {
        self.action == other.action
            && rows_equivalent(&self.new_values, &other.new_values)
            && rows_equivalent(&self.old_values, &other.old_values)
    }
}

fn rows_equivalent(a: &Option<RowValues>, b: &Option<RowValues>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).map_or(false, |bv| bv == v))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalent_ignores_map_ordering() {
        let mut a = RowValues::new();
        a.insert("x".into(), Value::Int(1));
        a.insert("y".into(), Value::Str("hi".into()));
        let mut b = RowValues::new();
        b.insert("y".into(), Value::Str("hi".into()));
        b.insert("x".into(), Value::Int(1));
        assert!(ChangeRecord::insert(a).equivalent(&ChangeRecord::insert(b)));
    }

    #[test]
    fn different_action_not_equivalent() {
        let row = RowValues::new();
        assert!(!ChangeRecord::insert(row.clone()).equivalent(&ChangeRecord::delete(row)));
    }
}
