use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rowguard_core::{Error, Result, TableSchema, Value};

/// One row in flight: current values, the dirty set, and accumulated
/// validation failures.
///
/// Records are created either empty (new rows) or by finder hydration,
/// which assigns trusted values through the raw path and then calls
/// [`Record::clean`]. Validation failures are never errors: the offending
/// assignment is dropped, the message accumulates, and the record stays
/// usable.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<TableSchema>,
    values: BTreeMap<String, Value>,
    dirty: BTreeSet<String>,
    errors: BTreeMap<String, Vec<String>>,
}

impl Record {
    pub(crate) fn new(schema: Arc<TableSchema>) -> Self {
        Record {
            schema,
            values: BTreeMap::new(),
            dirty: BTreeSet::new(),
            errors: BTreeMap::new(),
        }
    }

    /// Assign a field through the validation gate.
    ///
    /// Unknown fields are programming errors and return `Err`. Otherwise
    /// the value is coerced and checked by the column's rule chain:
    /// `Ok(true)` means it was stored and marked dirty, `Ok(false)` means
    /// it was rejected and the messages were added to [`Record::errors`].
    pub fn try_set(&mut self, field: &str, value: impl Into<Value>) -> Result<bool> {
        let column = self.schema.column(field).ok_or_else(|| Error::UnknownField {
            table: self.schema.table.clone(),
            field: field.to_string(),
        })?;

        let value = column.coerce(value.into());
        match column.validate(&value) {
            Ok(()) => {
                self.values.insert(field.to_string(), value);
                self.dirty.insert(field.to_string());
                Ok(true)
            }
            Err(messages) => {
                self.errors
                    .entry(field.to_string())
                    .or_default()
                    .extend(messages);
                Ok(false)
            }
        }
    }

    /// Store a trusted value verbatim, bypassing the rule chain. Used by
    /// finder hydration, which calls [`Record::clean`] afterwards.
    pub(crate) fn set_raw(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_string(), value);
        self.dirty.insert(field.to_string());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Drop a field's value and its dirty mark.
    pub fn unset(&mut self, field: &str) {
        self.values.remove(field);
        self.dirty.remove(field);
    }

    /// Clear the dirty set wholesale.
    pub fn clean(&mut self) {
        self.dirty.clear();
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn dirty_contains(&self, field: &str) -> bool {
        self.dirty.contains(field)
    }

    pub fn dirty_fields(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    /// Accumulated validation failures, field name to message list.
    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowguard_core::{Column, ColumnFacts};

    fn users_schema() -> Arc<TableSchema> {
        let columns = vec![
            ("id", "int(10) unsigned", false, Some("PRI"), "auto_increment"),
            ("name", "varchar(50)", false, None, ""),
            ("email", "varchar(255)", true, None, ""),
        ]
        .into_iter()
        .map(|(name, column_type, nullable, key, extra)| {
            Column::from_facts(ColumnFacts {
                name: name.to_string(),
                default: None,
                nullable,
                column_type: column_type.to_string(),
                key: key.map(str::to_string),
                extra: extra.to_string(),
                comment: None,
            })
            .expect("test column parses")
        })
        .collect();
        Arc::new(TableSchema::assemble("users", columns, Vec::new()).expect("schema assembles"))
    }

    #[test]
    fn successful_assignment_stores_and_marks_dirty() {
        let mut record = Record::new(users_schema());
        assert!(record.try_set("name", "Alice").expect("known field"));
        assert_eq!(record.get("name"), Some(&Value::Text("Alice".to_string())));
        assert!(record.dirty_contains("name"));
        assert!(!record.has_errors());
    }

    #[test]
    fn rejected_assignment_keeps_values_and_dirty_untouched() {
        let mut record = Record::new(users_schema());
        assert!(!record.try_set("name", "").expect("known field"));
        assert_eq!(record.get("name"), None);
        assert!(!record.is_dirty());
        assert_eq!(
            record.errors().get("name"),
            Some(&vec!["name is a required field".to_string()])
        );
    }

    #[test]
    fn repeated_assignment_marks_dirty_once() {
        let mut record = Record::new(users_schema());
        record.try_set("name", "Alice").expect("known field");
        record.try_set("name", "Bob").expect("known field");
        assert_eq!(record.dirty_fields().count(), 1);
        assert_eq!(record.get("name"), Some(&Value::Text("Bob".to_string())));
    }

    #[test]
    fn clean_clears_the_dirty_set() {
        let mut record = Record::new(users_schema());
        record.try_set("name", "Alice").expect("known field");
        record.clean();
        assert!(!record.is_dirty());
        // The value survives; only the dirty mark is dropped.
        assert!(record.contains("name"));
    }

    #[test]
    fn unknown_fields_are_hard_errors() {
        let mut record = Record::new(users_schema());
        let err = record.try_set("nickname", "Al").expect_err("unknown field");
        assert!(matches!(err, Error::UnknownField { .. }));
    }

    #[test]
    fn automatic_columns_reject_assignment() {
        let mut record = Record::new(users_schema());
        assert!(!record.try_set("id", 7i64).expect("known field"));
        assert_eq!(
            record.errors().get("id"),
            Some(&vec![
                "id is set automatically and may not be assigned".to_string()
            ])
        );
    }

    #[test]
    fn raw_assignment_bypasses_validation() {
        let mut record = Record::new(users_schema());
        record.set_raw("name", Value::Text(String::new()));
        assert_eq!(record.get("name"), Some(&Value::Text(String::new())));
        assert!(!record.has_errors());
        record.clean();
        assert!(!record.is_dirty());
    }

    #[test]
    fn unset_drops_value_and_dirty_mark() {
        let mut record = Record::new(users_schema());
        record.try_set("name", "Alice").expect("known field");
        record.unset("name");
        assert!(!record.contains("name"));
        assert!(!record.is_dirty());
    }

    #[test]
    fn failures_accumulate_across_assignments() {
        let mut record = Record::new(users_schema());
        record.try_set("name", "").expect("known field");
        record.try_set("name", Value::Null).expect("known field");
        assert_eq!(
            record.errors().get("name").map(Vec::len),
            Some(2),
            "each rejected assignment appends its message"
        );
    }
}
