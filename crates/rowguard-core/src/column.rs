use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rules::Rule;
use crate::value::Value;

/// Raw `INFORMATION_SCHEMA.COLUMNS` facts for one column, before parsing.
#[derive(Debug, Clone)]
pub struct ColumnFacts {
    pub name: String,
    pub default: Option<String>,
    pub nullable: bool,
    /// Full declared type, e.g. `varchar(50)` or `int(10) unsigned zerofill`.
    pub column_type: String,
    /// Key flag as reported: `PRI`, `UNI` or `MUL`.
    pub key: Option<String>,
    pub extra: String,
    pub comment: Option<String>,
}

/// Family a base type belongs to, driving default rule assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeFamily {
    String,
    Number,
    Date,
}

impl TypeFamily {
    pub fn classify(type_name: &str) -> Option<Self> {
        match type_name {
            "char" | "varchar" | "text" | "enum" => Some(TypeFamily::String),
            "int" | "tinyint" | "double" => Some(TypeFamily::Number),
            "datetime" | "timestamp" => Some(TypeFamily::Date),
            _ => None,
        }
    }
}

/// Role a column plays in the table's keys. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyRole {
    #[default]
    None,
    Primary,
    Unique,
    Multiple,
}

impl KeyRole {
    fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("PRI") => KeyRole::Primary,
            Some("UNI") => KeyRole::Unique,
            Some("MUL") => KeyRole::Multiple,
            _ => KeyRole::None,
        }
    }
}

/// One table column: parsed schema facts plus the derived rule chain.
///
/// Built once per physical column when a table is introspected (or read
/// back from the datastore cache) and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Base SQL type keyword, lower case.
    pub type_name: String,
    pub family: TypeFamily,
    /// Raw parenthesized type parameter: a length, precision, or enum list.
    pub constraint: Option<String>,
    pub nullable: bool,
    pub default: Option<String>,
    pub extra: String,
    pub comment: Option<String>,
    pub unsigned: bool,
    pub zerofill: bool,
    pub key: KeyRole,
    /// True when the database generates the value (auto-increment).
    pub automatic: bool,
    /// Ordered rule chain; insertion order is evaluation order.
    pub rules: Vec<Rule>,
}

impl Column {
    pub fn from_facts(facts: ColumnFacts) -> Result<Self> {
        let parsed = parse_column_type(&facts.column_type);
        let family = TypeFamily::classify(&parsed.type_name).ok_or_else(|| {
            Error::UnrecognizedType {
                column: facts.name.clone(),
                column_type: facts.column_type.clone(),
            }
        })?;

        let mut column = Column {
            name: facts.name,
            type_name: parsed.type_name,
            family,
            constraint: parsed.constraint,
            nullable: facts.nullable,
            default: facts.default,
            automatic: facts.extra.contains("auto_increment"),
            extra: facts.extra,
            comment: facts.comment,
            unsigned: parsed.unsigned,
            zerofill: parsed.zerofill,
            key: KeyRole::from_flag(facts.key.as_deref()),
            rules: Vec::new(),
        };

        column.assign_rules()?;
        Ok(column)
    }

    /// Assign the rule chain: the universal required rule first, then the
    /// family rule, then any comment-DSL extras.
    fn assign_rules(&mut self) -> Result<()> {
        if !self.nullable {
            self.rules.push(Rule::Required);
        }

        let family_rule = match self.family {
            TypeFamily::String if self.type_name == "enum" => Some(Rule::Options {
                allowed: self.enum_literals(),
            }),
            TypeFamily::String => self.char_limit().map(|limit| Rule::Max { limit }),
            TypeFamily::Number if self.type_name == "tinyint" && self.digits() == Some(1) => {
                Some(Rule::Binary)
            }
            TypeFamily::Number => Some(Rule::Number {
                digits: self.digits(),
            }),
            TypeFamily::Date => None,
        };
        if let Some(rule) = family_rule {
            self.rules.push(rule);
        }

        if let Some(comment) = self.comment.clone() {
            for rule in comment_rules(&comment, &self.name)? {
                self.rules.push(rule);
            }
        }

        Ok(())
    }

    /// Character ceiling for sized string types.
    pub fn char_limit(&self) -> Option<u64> {
        match self.family {
            TypeFamily::String if self.type_name != "enum" => {
                self.constraint.as_deref()?.trim().parse().ok()
            }
            _ => None,
        }
    }

    /// Digit count for numeric types; the part before any precision comma.
    pub fn digits(&self) -> Option<u32> {
        match self.family {
            TypeFamily::Number => {
                let constraint = self.constraint.as_deref()?;
                constraint.split(',').next()?.trim().parse().ok()
            }
            _ => None,
        }
    }

    /// Allowed literals of an enum column, quotes stripped, declared order.
    pub fn enum_literals(&self) -> Vec<String> {
        if self.type_name != "enum" {
            return Vec::new();
        }
        self.constraint
            .as_deref()
            .map(|list| {
                list.split(',')
                    .map(|item| item.trim().trim_matches('\'').to_string())
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Literal-to-display-label pairs for enum columns; empty otherwise.
    pub fn options(&self) -> Vec<(String, String)> {
        self.enum_literals()
            .into_iter()
            .map(|literal| {
                let label = capitalize(&literal);
                (literal, label)
            })
            .collect()
    }

    pub fn matches_type(&self, type_name: &str) -> bool {
        self.type_name == type_name
    }

    pub fn is_primary(&self) -> bool {
        self.key == KeyRole::Primary
    }

    pub fn is_unique(&self) -> bool {
        self.key == KeyRole::Unique
    }

    /// Run the candidate value through every coercion in rule order.
    pub fn coerce(&self, value: Value) -> Value {
        self.rules
            .iter()
            .fold(value, |value, rule| rule.coerce(value))
    }

    /// Validate a candidate value against every rule in order, accumulating
    /// each failure message. Success requires every rule to pass.
    pub fn validate(&self, value: &Value) -> std::result::Result<(), Vec<String>> {
        let failures: Vec<String> = self
            .rules
            .iter()
            .filter_map(|rule| rule.check(self, value).err())
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }
}

struct ParsedType {
    type_name: String,
    constraint: Option<String>,
    unsigned: bool,
    zerofill: bool,
}

/// Split a declared type into `<type>(<constraint>)? unsigned? zerofill?`.
fn parse_column_type(full: &str) -> ParsedType {
    let full = full.trim();

    let (head, tail) = match full.split_once('(') {
        Some((head, rest)) => {
            // The constraint runs to the last closing paren so enum lists
            // containing parens survive.
            let (constraint, flags) = match rest.rfind(')') {
                Some(end) => (Some(rest[..end].to_string()), &rest[end + 1..]),
                None => (Some(rest.to_string()), ""),
            };
            ((head, constraint), flags)
        }
        None => match full.split_once(' ') {
            Some((head, flags)) => ((head, None), flags),
            None => ((full, None), ""),
        },
    };

    let flags: Vec<&str> = tail.split_whitespace().collect();
    ParsedType {
        type_name: head.0.trim().to_ascii_lowercase(),
        constraint: head.1,
        unsigned: flags.contains(&"unsigned"),
        zerofill: flags.contains(&"zerofill"),
    }
}

/// Parse a column comment as the rule DSL: comma-separated `name` or
/// `name(arg)` tokens. Comments on introspected tables are reserved for
/// this annotation language; an unknown token is a schema error.
fn comment_rules(comment: &str, column_name: &str) -> Result<Vec<Rule>> {
    let mut rules = Vec::new();
    for token in split_tokens(comment) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (name, arg) = match token.split_once('(') {
            Some((name, rest)) => {
                let arg = rest.strip_suffix(')').ok_or_else(|| {
                    Error::InvalidSchema(format!(
                        "malformed rule token `{token}` in comment for column `{column_name}`"
                    ))
                })?;
                (name.trim(), Some(arg.trim()))
            }
            None => (token, None),
        };
        rules.push(Rule::resolve(name, arg)?);
    }
    Ok(rules)
}

/// Split on commas outside parentheses, so `options('a','b'),required`
/// stays two tokens.
fn split_tokens(comment: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in comment.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                tokens.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    tokens.push(current);
    tokens
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
