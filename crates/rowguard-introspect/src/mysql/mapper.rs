use rowguard_core::{Column, ColumnFacts, Constraint, Result};

use super::queries::{RawColumn, RawConstraint};

pub fn map_columns(raw: Vec<RawColumn>) -> Result<Vec<Column>> {
    raw.into_iter()
        .map(|col| {
            Column::from_facts(ColumnFacts {
                name: col.name,
                default: col.default,
                nullable: col.nullable.eq_ignore_ascii_case("YES"),
                column_type: col.column_type,
                key: Some(col.key).filter(|key| !key.is_empty()),
                extra: col.extra,
                comment: Some(col.comment).filter(|comment| !comment.trim().is_empty()),
            })
        })
        .collect()
}

pub fn map_constraints(raw: Vec<RawConstraint>) -> Result<Vec<Constraint>> {
    raw.into_iter()
        .filter(|constraint| {
            // CHECK constraints carry no facts the model layer consumes.
            let keep = constraint.constraint_type != "CHECK";
            if !keep {
                tracing::debug!(name = %constraint.name, "skipping check constraint");
            }
            keep
        })
        .map(|constraint| Constraint::from_facts(constraint.name, &constraint.constraint_type))
        .collect()
}
