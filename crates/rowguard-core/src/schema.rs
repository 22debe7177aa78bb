use serde::{Deserialize, Serialize};

use crate::column::{Column, KeyRole};
use crate::constraint::Constraint;
use crate::error::{Error, Result};

/// Primary key shape of a table: one column, or a two-column composite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryKey {
    Single(String),
    Composite(String, String),
}

impl PrimaryKey {
    pub fn columns(&self) -> Vec<&str> {
        match self {
            PrimaryKey::Single(col) => vec![col.as_str()],
            PrimaryKey::Composite(first, second) => vec![first.as_str(), second.as_str()],
        }
    }
}

/// Immutable schema descriptor for one table.
///
/// Assembled once per table at introspection (or deserialized from the
/// datastore cache) and shared read-only by every record afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<Column>,
    pub constraints: Vec<Constraint>,
    pub primary: Option<PrimaryKey>,
}

impl TableSchema {
    /// Derive the descriptor from hydrated columns and constraints.
    ///
    /// The primary key is promoted from the columns' key flags: a second
    /// primary column forms a composite, a third is rejected.
    pub fn assemble(
        table: impl Into<String>,
        columns: Vec<Column>,
        constraints: Vec<Constraint>,
    ) -> Result<Self> {
        let table = table.into();

        let mut primary: Option<PrimaryKey> = None;
        for column in columns.iter().filter(|col| col.key == KeyRole::Primary) {
            primary = match primary.take() {
                None => Some(PrimaryKey::Single(column.name.clone())),
                Some(PrimaryKey::Single(first)) => {
                    Some(PrimaryKey::Composite(first, column.name.clone()))
                }
                Some(PrimaryKey::Composite(..)) => {
                    return Err(Error::InvalidSchema(format!(
                        "`{table}` has more than two primary key columns"
                    )));
                }
            };
        }

        Ok(TableSchema {
            table,
            columns,
            constraints,
            primary,
        })
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|col| col.name == name)
    }

    /// Columns in declaration order, minus the excluded names.
    pub fn list_columns(&self, exclude: &[&str]) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|col| !exclude.contains(&col.name.as_str()))
            .collect()
    }

    /// Backtick-quoted column list used when expanding `*` in finder SQL.
    pub fn select_list(&self, exclude: &[&str]) -> String {
        self.list_columns(exclude)
            .iter()
            .map(|col| format!("`{}`", col.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnFacts;

    fn column(name: &str, column_type: &str, key: Option<&str>) -> Column {
        Column::from_facts(ColumnFacts {
            name: name.to_string(),
            default: None,
            nullable: true,
            column_type: column_type.to_string(),
            key: key.map(str::to_string),
            extra: String::new(),
            comment: None,
        })
        .expect("column under test must parse")
    }

    #[test]
    fn promotes_a_single_primary_column() {
        let schema = TableSchema::assemble(
            "users",
            vec![
                column("id", "int(10)", Some("PRI")),
                column("name", "varchar(50)", None),
            ],
            Vec::new(),
        )
        .expect("schema assembles");
        assert_eq!(schema.primary, Some(PrimaryKey::Single("id".to_string())));
    }

    #[test]
    fn promotes_two_primary_columns_to_a_composite() {
        let schema = TableSchema::assemble(
            "memberships",
            vec![
                column("user_id", "int(10)", Some("PRI")),
                column("group_id", "int(10)", Some("PRI")),
            ],
            Vec::new(),
        )
        .expect("schema assembles");
        assert_eq!(
            schema.primary,
            Some(PrimaryKey::Composite(
                "user_id".to_string(),
                "group_id".to_string(),
            ))
        );
    }

    #[test]
    fn rejects_a_third_primary_column() {
        let err = TableSchema::assemble(
            "wide",
            vec![
                column("a", "int(10)", Some("PRI")),
                column("b", "int(10)", Some("PRI")),
                column("c", "int(10)", Some("PRI")),
            ],
            Vec::new(),
        )
        .expect_err("three-column keys are unsupported");
        assert!(matches!(err, Error::InvalidSchema(_)));
    }

    #[test]
    fn tables_without_keys_have_no_primary() {
        let schema = TableSchema::assemble(
            "log",
            vec![column("line", "text", None)],
            Vec::new(),
        )
        .expect("schema assembles");
        assert_eq!(schema.primary, None);
    }

    #[test]
    fn select_list_excludes_named_columns() {
        let schema = TableSchema::assemble(
            "users",
            vec![
                column("id", "int(10)", Some("PRI")),
                column("name", "varchar(50)", None),
                column("password", "varchar(255)", None),
            ],
            Vec::new(),
        )
        .expect("schema assembles");
        assert_eq!(schema.select_list(&["password"]), "`id`, `name`");
        assert_eq!(
            schema
                .list_columns(&[])
                .iter()
                .map(|col| col.name.as_str())
                .collect::<Vec<_>>(),
            vec!["id", "name", "password"],
        );
    }

    #[test]
    fn descriptors_survive_a_serde_round_trip() {
        let schema = TableSchema::assemble(
            "users",
            vec![
                column("id", "int(10)", Some("PRI")),
                column("status", "enum('active','inactive')", None),
            ],
            vec![
                Constraint::from_facts("PRIMARY".to_string(), "PRIMARY KEY")
                    .expect("primary classifies"),
            ],
        )
        .expect("schema assembles");

        let payload = serde_json::to_string(&schema).expect("descriptor serializes");
        let restored: TableSchema =
            serde_json::from_str(&payload).expect("descriptor deserializes");
        assert_eq!(restored.table, schema.table);
        assert_eq!(restored.primary, schema.primary);
        assert_eq!(restored.columns.len(), schema.columns.len());
        assert_eq!(
            restored.column("status").map(|col| col.rules.clone()),
            schema.column("status").map(|col| col.rules.clone()),
        );
    }
}
