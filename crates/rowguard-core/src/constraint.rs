use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Structured relation parsed from a foreign-key constraint name.
///
/// Foreign keys must be named `<fromTable>-<fromColumn>-<toTable>-<toColumn>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub from: String,
    pub key_from: String,
    pub to: String,
    pub key_to: String,
}

impl Relation {
    fn parse(name: &str) -> Result<Self> {
        let parts: Vec<&str> = name.split('-').collect();
        let &[from, key_from, to, key_to] = parts.as_slice() else {
            return Err(Error::InvalidSchema(format!(
                "foreign key `{name}` does not follow the `from-keyFrom-to-keyTo` naming convention"
            )));
        };
        Ok(Relation {
            from: from.to_string(),
            key_from: key_from.to_string(),
            to: to.to_string(),
            key_to: key_to.to_string(),
        })
    }
}

/// Kind of table constraint. Foreign keys carry their parsed relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintKind {
    Primary,
    Unique,
    Foreign { relation: Relation },
}

/// One `INFORMATION_SCHEMA.TABLE_CONSTRAINTS` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
}

impl Constraint {
    /// Classify a raw constraint row. A foreign key with a name that does
    /// not encode its relation is rejected rather than silently producing
    /// a nonsense descriptor.
    pub fn from_facts(name: String, constraint_type: &str) -> Result<Self> {
        let kind = match constraint_type {
            "PRIMARY KEY" => ConstraintKind::Primary,
            "UNIQUE" => ConstraintKind::Unique,
            "FOREIGN KEY" => ConstraintKind::Foreign {
                relation: Relation::parse(&name)?,
            },
            other => {
                return Err(Error::InvalidSchema(format!(
                    "unrecognized constraint type `{other}` for `{name}`"
                )));
            }
        };
        Ok(Constraint { name, kind })
    }

    pub fn is_primary(&self) -> bool {
        matches!(self.kind, ConstraintKind::Primary)
    }

    pub fn is_unique(&self) -> bool {
        matches!(self.kind, ConstraintKind::Unique)
    }

    pub fn is_foreign(&self) -> bool {
        matches!(self.kind, ConstraintKind::Foreign { .. })
    }

    pub fn relation(&self) -> Option<&Relation> {
        match &self.kind {
            ConstraintKind::Foreign { relation } => Some(relation),
            _ => None,
        }
    }
}
