use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::column::{Column, TypeFamily};
use crate::error::{Error, Result};
use crate::value::Value;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$";

/// A single validation/normalization rule bound to a column.
///
/// Rules are assigned once at column construction and evaluated in
/// insertion order. `coerce` runs over the candidate value first, then
/// `check` validates the result; a value that cannot be coerced is left
/// untouched so the check reports it instead of masking it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    Required,
    Max { limit: u64 },
    Min { limit: u64 },
    Number { digits: Option<u32> },
    Binary,
    Options { allowed: Vec<String> },
    Email,
    Username,
    Password,
    Ip,
    Uri,
}

impl Rule {
    /// Resolve a comment-DSL token into a rule.
    ///
    /// The registry is the complete set of rule names; an unknown name or a
    /// malformed argument is a schema error surfaced at introspection time.
    pub fn resolve(name: &str, arg: Option<&str>) -> Result<Self> {
        let rule = match name.to_ascii_lowercase().as_str() {
            "required" => Rule::Required,
            "max" => Rule::Max {
                limit: required_limit("max", arg)?,
            },
            "min" => Rule::Min {
                limit: required_limit("min", arg)?,
            },
            "number" => Rule::Number {
                digits: optional_digits(arg)?,
            },
            "binary" => Rule::Binary,
            "options" => Rule::Options {
                allowed: literal_list(arg)?,
            },
            "email" => Rule::Email,
            "username" => Rule::Username,
            "password" => Rule::Password,
            "ip" => Rule::Ip,
            "uri" => Rule::Uri,
            other => {
                return Err(Error::InvalidSchema(format!(
                    "unknown validation rule `{other}`"
                )));
            }
        };
        Ok(rule)
    }

    /// Normalize a candidate value. Identity for most rules.
    pub fn coerce(&self, value: Value) -> Value {
        match self {
            Rule::Binary => match value {
                Value::Int(0) | Value::UInt(0) => Value::Bool(false),
                Value::Int(1) | Value::UInt(1) => Value::Bool(true),
                other => other,
            },
            Rule::Number { .. } => match value {
                Value::Text(text) => match text.trim().parse::<i64>() {
                    Ok(n) => Value::Int(n),
                    Err(_) => Value::Text(text),
                },
                Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Value::Int(f as i64)
                }
                other => other,
            },
            _ => value,
        }
    }

    /// Validate a candidate value against the owning column.
    ///
    /// The returned message is fully interpolated with the field name and
    /// suitable for direct display.
    pub fn check(&self, column: &Column, value: &Value) -> std::result::Result<(), String> {
        let field = column.name.as_str();

        // Null is only ever rejected by the required rule.
        if value.is_null() && !matches!(self, Rule::Required) {
            return Ok(());
        }

        match self {
            Rule::Required => check_required(field, value),
            Rule::Max { limit } => check_max(field, column, value, *limit),
            Rule::Min { limit } => check_min(field, column, value, *limit),
            Rule::Number { digits } => check_number(field, column, value, *digits),
            Rule::Binary => check_binary(field, value),
            Rule::Options { allowed } => check_options(field, value, allowed),
            Rule::Email => check_email(field, value),
            Rule::Username => check_username(field, value),
            Rule::Password => check_password(field, value),
            Rule::Ip => check_ip(field, value),
            Rule::Uri => Ok(()), // TODO: validate with url::Url::parse once the accepted scheme set is decided
        }
    }
}

fn check_required(field: &str, value: &Value) -> std::result::Result<(), String> {
    match value {
        Value::Null => Err(format!("{field} is a required field")),
        Value::Text(text) if text.is_empty() => Err(format!("{field} is a required field")),
        // `false` is a legitimate stored value.
        _ => Ok(()),
    }
}

fn check_max(
    field: &str,
    column: &Column,
    value: &Value,
    limit: u64,
) -> std::result::Result<(), String> {
    if column.family == TypeFamily::String {
        if value.rendered_len() as u64 <= limit {
            Ok(())
        } else {
            Err(format!(
                "{field} may not be longer than {limit} characters"
            ))
        }
    } else {
        match value.coarse_integer() {
            Some(n) if n <= i128::from(limit) => Ok(()),
            _ => Err(format!("{field} may not be greater than {limit}")),
        }
    }
}

fn check_min(
    field: &str,
    column: &Column,
    value: &Value,
    limit: u64,
) -> std::result::Result<(), String> {
    if column.family == TypeFamily::String {
        if value.rendered_len() as u64 >= limit {
            Ok(())
        } else {
            Err(format!(
                "{field} must be at least {limit} characters long"
            ))
        }
    } else {
        match value.coarse_integer() {
            Some(n) if n >= i128::from(limit) => Ok(()),
            _ => Err(format!("{field} may not be less than {limit}")),
        }
    }
}

fn check_number(
    field: &str,
    column: &Column,
    value: &Value,
    digits: Option<u32>,
) -> std::result::Result<(), String> {
    if column.automatic {
        return Err(format!(
            "{field} is set automatically and may not be assigned"
        ));
    }

    let Some(n) = value.integer_value() else {
        return Err(format!("{field} must be a whole number"));
    };

    if column.unsigned && n < 0 {
        return Err(format!("{field} may not be negative"));
    }

    if let Some(digits) = digits {
        // Ceiling is the all-nines number with `digits` digits.
        if let Some(power) = 10i128.checked_pow(digits) {
            if n > power - 1 {
                return Err(format!("{field} may not be longer than {digits} digits"));
            }
        }
    }

    Ok(())
}

fn check_binary(field: &str, value: &Value) -> std::result::Result<(), String> {
    match value {
        Value::Bool(_) => Ok(()),
        _ => Err(format!("{field} must contain a true/false value")),
    }
}

fn check_options(
    field: &str,
    value: &Value,
    allowed: &[String],
) -> std::result::Result<(), String> {
    match value {
        Value::Text(text) if allowed.iter().any(|option| option == text) => Ok(()),
        _ => Err(format!(
            "{field} may only be set to {}",
            join_alternatives(allowed)
        )),
    }
}

fn check_email(field: &str, value: &Value) -> std::result::Result<(), String> {
    let Value::Text(text) = value else {
        return Err(format!("{field} is not a valid email address"));
    };

    let len = text.chars().count();
    if !(9..=255).contains(&len) {
        return Err(format!(
            "{field} must be between 9 and 255 characters long"
        ));
    }

    match text.find('@') {
        None | Some(0) => return Err(format!("{field} must contain an @ sign")),
        Some(_) => {}
    }

    match Regex::new(EMAIL_PATTERN) {
        Ok(pattern) if pattern.is_match(text) => Ok(()),
        _ => Err(format!("{field} is not a valid email address")),
    }
}

fn check_username(field: &str, value: &Value) -> std::result::Result<(), String> {
    let Value::Text(text) = value else {
        return Err(format!("{field} may only contain letters and numbers"));
    };

    if !text.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(format!("{field} may only contain letters and numbers"));
    }

    let len = text.chars().count();
    if len < 3 {
        return Err(format!("{field} must be at least 3 characters long"));
    }
    if len > 32 {
        return Err(format!("{field} may not be longer than 32 characters"));
    }

    Ok(())
}

fn check_password(field: &str, value: &Value) -> std::result::Result<(), String> {
    let Value::Text(text) = value else {
        return Err(format!("{field} must be at least 6 characters long"));
    };

    if text.chars().count() < 6 {
        return Err(format!("{field} must be at least 6 characters long"));
    }
    if !text.chars().any(|c| c.is_ascii_digit()) {
        return Err(format!("{field} must contain at least one number"));
    }
    if !text.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(format!("{field} must contain at least one lowercase letter"));
    }
    if !text.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(format!("{field} must contain at least one uppercase letter"));
    }

    Ok(())
}

/// Score a password 0-100: twenty points each for length, a digit, a
/// lowercase letter, an uppercase letter, and a symbol. Symbols affect the
/// score only; `check` never requires one.
pub fn password_strength(text: &str) -> u8 {
    let mut strength: u8 = 100;
    if text.chars().count() < 6 {
        strength -= 20;
    }
    if !text.chars().any(|c| c.is_ascii_digit()) {
        strength -= 20;
    }
    if !text.chars().any(|c| c.is_ascii_lowercase()) {
        strength -= 20;
    }
    if !text.chars().any(|c| c.is_ascii_uppercase()) {
        strength -= 20;
    }
    if !text.chars().any(|c| !c.is_ascii_alphanumeric()) {
        strength -= 20;
    }
    strength
}

fn check_ip(field: &str, value: &Value) -> std::result::Result<(), String> {
    let message = || format!("{field} is not a valid IPv4 or IPv6 address");

    let Value::Text(text) = value else {
        return Err(message());
    };

    match text.parse::<IpAddr>() {
        Ok(IpAddr::V4(addr)) if is_public_v4(&addr) => Ok(()),
        Ok(IpAddr::V6(addr)) if is_public_v6(&addr) => Ok(()),
        _ => Err(message()),
    }
}

fn is_public_v4(addr: &Ipv4Addr) -> bool {
    !(addr.is_unspecified()
        || addr.is_loopback()
        || addr.is_private()
        || addr.is_link_local()
        || addr.is_broadcast()
        || addr.is_documentation()
        || addr.is_multicast())
}

fn is_public_v6(addr: &Ipv6Addr) -> bool {
    !(addr.is_unspecified()
        || addr.is_loopback()
        || addr.is_multicast()
        || addr.is_unique_local()
        || addr.is_unicast_link_local())
}

/// Render `["a", "b", "c"]` as "a, b or c" for option-list messages.
fn join_alternatives(options: &[String]) -> String {
    match options {
        [] => String::new(),
        [only] => only.clone(),
        [head @ .., last] => format!("{} or {last}", head.join(", ")),
    }
}

fn required_limit(rule: &str, arg: Option<&str>) -> Result<u64> {
    let raw = arg.ok_or_else(|| {
        Error::InvalidSchema(format!("rule `{rule}` requires a numeric argument"))
    })?;
    raw.trim().parse::<u64>().map_err(|_| {
        Error::InvalidSchema(format!("rule `{rule}` has a non-numeric argument `{raw}`"))
    })
}

fn optional_digits(arg: Option<&str>) -> Result<Option<u32>> {
    match arg {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| {
                Error::InvalidSchema(format!(
                    "rule `number` has a non-numeric argument `{raw}`"
                ))
            }),
    }
}

fn literal_list(arg: Option<&str>) -> Result<Vec<String>> {
    let raw = arg.ok_or_else(|| {
        Error::InvalidSchema("rule `options` requires a literal list".to_string())
    })?;
    let allowed: Vec<String> = raw
        .split(',')
        .map(|item| item.trim().trim_matches('\'').to_string())
        .filter(|item| !item.is_empty())
        .collect();
    if allowed.is_empty() {
        return Err(Error::InvalidSchema(
            "rule `options` requires a non-empty literal list".to_string(),
        ));
    }
    Ok(allowed)
}
