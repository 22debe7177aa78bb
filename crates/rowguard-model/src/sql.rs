use rowguard_core::{Error, Result, TableSchema, Value};

use crate::record::Record;

/// A synthesized statement: SQL text plus positional parameters in
/// binding order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Full-column INSERT (or REPLACE, by keyword substitution). Every known
/// column binds; missing instance values bind NULL.
pub(crate) fn build_insert(record: &Record, replace: bool) -> Statement {
    let schema = record.schema();
    let keyword = if replace { "REPLACE" } else { "INSERT" };

    let columns = schema
        .columns
        .iter()
        .map(|col| format!("`{}`", col.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; schema.columns.len()].join(", ");
    let params = schema
        .columns
        .iter()
        .map(|col| record.get(&col.name).cloned().unwrap_or(Value::Null))
        .collect();

    Statement {
        sql: format!(
            "{keyword} INTO `{}` ({columns}) VALUES ({placeholders})",
            schema.table
        ),
        params,
    }
}

/// UPDATE over the dirty fields, keyed by the primary columns. The SET
/// parameters precede the WHERE parameters in binding order.
pub(crate) fn build_update(record: &Record) -> Result<Statement> {
    let schema = record.schema();
    let primary = require_primary(schema, "UPDATE")?;

    let dirty: Vec<&str> = schema
        .columns
        .iter()
        .map(|col| col.name.as_str())
        .filter(|name| record.dirty_contains(name))
        .collect();
    if dirty.is_empty() {
        return Err(Error::NothingToUpdate {
            table: schema.table.clone(),
        });
    }

    let set_clause = dirty
        .iter()
        .map(|name| format!("`{name}` = ?"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut params: Vec<Value> = dirty
        .iter()
        .map(|name| record.get(name).cloned().unwrap_or(Value::Null))
        .collect();

    let (where_clause, key_params) = key_predicate(record, primary)?;
    params.extend(key_params);

    Ok(Statement {
        sql: format!(
            "UPDATE `{}` SET {set_clause} WHERE {where_clause}",
            schema.table
        ),
        params,
    })
}

/// DELETE keyed by the primary columns only; there is no unkeyed path.
pub(crate) fn build_delete(record: &Record) -> Result<Statement> {
    let schema = record.schema();
    let primary = require_primary(schema, "DELETE")?;
    let (where_clause, params) = key_predicate(record, primary)?;

    Ok(Statement {
        sql: format!("DELETE FROM `{}` WHERE {where_clause}", schema.table),
        params,
    })
}

fn require_primary<'a>(
    schema: &'a TableSchema,
    statement: &'static str,
) -> Result<&'a rowguard_core::PrimaryKey> {
    schema.primary.as_ref().ok_or_else(|| Error::MissingPrimaryKey {
        table: schema.table.clone(),
        statement,
    })
}

fn key_predicate(
    record: &Record,
    primary: &rowguard_core::PrimaryKey,
) -> Result<(String, Vec<Value>)> {
    let mut clauses = Vec::new();
    let mut params = Vec::new();
    for column in primary.columns() {
        let value = record.get(column).cloned().ok_or_else(|| Error::MissingKeyValue {
            table: record.schema().table.clone(),
            column: column.to_string(),
        })?;
        clauses.push(format!("`{column}` = ?"));
        params.push(value);
    }
    Ok((clauses.join(" AND "), params))
}

/// Textually expand `*` to the explicit column list, minus exclusions.
pub(crate) fn expand_select(schema: &TableSchema, sql: &str, exclude: &[&str]) -> String {
    sql.replace('*', &schema.select_list(exclude))
}

/// The single-row/many-rows routing heuristic: the literal substring
/// `LIMIT 1`, nothing smarter.
pub(crate) fn wants_single_row(sql: &str) -> bool {
    sql.contains("LIMIT 1")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::record::Record;
    use rowguard_core::{Column, ColumnFacts};

    fn schema(
        table: &str,
        columns: &[(&str, &str, bool, Option<&str>, &str)],
    ) -> Arc<TableSchema> {
        let columns = columns
            .iter()
            .map(|(name, column_type, nullable, key, extra)| {
                Column::from_facts(ColumnFacts {
                    name: name.to_string(),
                    default: None,
                    nullable: *nullable,
                    column_type: column_type.to_string(),
                    key: key.map(str::to_string),
                    extra: extra.to_string(),
                    comment: None,
                })
                .expect("test column parses")
            })
            .collect();
        Arc::new(TableSchema::assemble(table, columns, Vec::new()).expect("schema assembles"))
    }

    fn users_schema() -> Arc<TableSchema> {
        schema(
            "users",
            &[
                ("id", "int(10) unsigned", false, Some("PRI"), "auto_increment"),
                ("name", "varchar(50)", false, None, ""),
                ("email", "varchar(255)", true, None, ""),
            ],
        )
    }

    #[test]
    fn insert_binds_every_column_in_schema_order() {
        let mut record = Record::new(users_schema());
        record.try_set("name", "Alice").expect("known field");

        let statement = build_insert(&record, false);
        assert_eq!(
            statement.sql,
            "INSERT INTO `users` (`id`, `name`, `email`) VALUES (?, ?, ?)"
        );
        assert_eq!(
            statement.params,
            vec![
                Value::Null,
                Value::Text("Alice".to_string()),
                Value::Null,
            ]
        );
    }

    #[test]
    fn replace_substitutes_the_keyword_only() {
        let record = Record::new(users_schema());
        let insert = build_insert(&record, false);
        let replace = build_insert(&record, true);
        assert!(replace.sql.starts_with("REPLACE INTO `users`"));
        assert_eq!(
            insert.sql.strip_prefix("INSERT"),
            replace.sql.strip_prefix("REPLACE")
        );
    }

    #[test]
    fn update_sets_dirty_fields_and_keys_on_the_primary() {
        let mut record = Record::new(users_schema());
        record.set_raw("id", Value::Int(7));
        record.set_raw("name", Value::Text("Alice".to_string()));
        record.set_raw("email", Value::Null);
        record.clean();
        record.try_set("name", "Bob").expect("known field");

        let statement = build_update(&record).expect("update builds");
        assert_eq!(statement.sql, "UPDATE `users` SET `name` = ? WHERE `id` = ?");
        assert_eq!(
            statement.params,
            vec![Value::Text("Bob".to_string()), Value::Int(7)]
        );
    }

    #[test]
    fn update_requires_a_primary_key_before_building_sql() {
        let log = schema("log", &[("line", "text", true, None, "")]);
        let mut record = Record::new(log);
        record.try_set("line", "hello").expect("known field");

        let err = build_update(&record).expect_err("no primary key");
        assert!(matches!(err, Error::MissingPrimaryKey { statement: "UPDATE", .. }));
    }

    #[test]
    fn update_without_dirty_fields_is_an_error() {
        let mut record = Record::new(users_schema());
        record.set_raw("id", Value::Int(7));
        record.clean();

        let err = build_update(&record).expect_err("nothing to update");
        assert!(matches!(err, Error::NothingToUpdate { .. }));
    }

    #[test]
    fn delete_keys_on_the_primary_only() {
        let mut record = Record::new(users_schema());
        record.set_raw("id", Value::Int(7));
        record.set_raw("name", Value::Text("Alice".to_string()));
        record.clean();

        let statement = build_delete(&record).expect("delete builds");
        assert_eq!(statement.sql, "DELETE FROM `users` WHERE `id` = ?");
        assert_eq!(statement.params, vec![Value::Int(7)]);
    }

    #[test]
    fn delete_requires_a_primary_key() {
        let log = schema("log", &[("line", "text", true, None, "")]);
        let record = Record::new(log);
        assert!(matches!(
            build_delete(&record).expect_err("no primary key"),
            Error::MissingPrimaryKey { statement: "DELETE", .. }
        ));
    }

    #[test]
    fn composite_keys_produce_an_and_predicate() {
        let memberships = schema(
            "memberships",
            &[
                ("user_id", "int(10)", false, Some("PRI"), ""),
                ("group_id", "int(10)", false, Some("PRI"), ""),
                ("role", "varchar(20)", true, None, ""),
            ],
        );
        let mut record = Record::new(memberships);
        record.set_raw("user_id", Value::Int(1));
        record.set_raw("group_id", Value::Int(2));
        record.clean();
        record.try_set("role", "admin").expect("known field");

        let statement = build_update(&record).expect("update builds");
        assert_eq!(
            statement.sql,
            "UPDATE `memberships` SET `role` = ? WHERE `user_id` = ? AND `group_id` = ?"
        );
        assert_eq!(
            statement.params,
            vec![
                Value::Text("admin".to_string()),
                Value::Int(1),
                Value::Int(2),
            ]
        );
    }

    #[test]
    fn missing_key_values_are_reported_before_sql_is_built() {
        let mut record = Record::new(users_schema());
        record.try_set("name", "Alice").expect("known field");

        let err = build_update(&record).expect_err("id value missing");
        assert!(matches!(err, Error::MissingKeyValue { .. }));
    }

    #[test]
    fn star_expansion_substitutes_the_column_list() {
        let users = users_schema();
        assert_eq!(
            expand_select(&users, "SELECT * FROM `users` WHERE `id` = ?", &[]),
            "SELECT `id`, `name`, `email` FROM `users` WHERE `id` = ?"
        );
        assert_eq!(
            expand_select(&users, "SELECT * FROM `users`", &["email"]),
            "SELECT `id`, `name` FROM `users`"
        );
    }

    #[test]
    fn single_row_routing_matches_the_literal_substring() {
        assert!(wants_single_row("SELECT * FROM t LIMIT 1"));
        assert!(!wants_single_row("SELECT * FROM t"));
        assert!(!wants_single_row("SELECT * FROM t limit 1"));
        assert!(wants_single_row("SELECT * FROM t LIMIT 10"), "textual heuristic, not a parser");
    }
}
