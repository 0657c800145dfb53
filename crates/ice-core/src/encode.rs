//! Encoding of [`ConditionRecord`]s back into DSL text.
//!
//! This is the inverse of [`crate::parse`]: structured records are rebuilt from
//! their fields, raw records are written back byte for byte. Output is stable
//! from the second round trip onward (`parse ∘ encode` is idempotent on fields),
//! even where the first pass normalizes spacing or the `js:` marker.
use log::warn;
use serde_json::Value;

use crate::parse::{
    AND_TOKEN, BALANCE_VAR, ITEM_CHECK_PREFIX, ITEM_REMOVE_PREFIX, LEVEL_VAR, META_PREFIX, MYTHIC_MARKER,
    NAME_CLAUSE, NBT_CLAUSE, NEIGE_MARKER, SCRIPT_MARKER,
};
use crate::path::PathKind;
use crate::record::{Comparator, Condition, ConditionRecord, ItemMatch};

/// Encoded form of a record list, shaped for its path kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoded {
    /// `None` when there is nothing to write; the field should be omitted.
    Scalar(Option<String>),
    Lines(Vec<String>),
}

impl Encoded {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Encoded::Scalar(s) => s.map(Value::String),
            Encoded::Lines(lines) => Some(Value::Array(lines.into_iter().map(Value::String).collect())),
        }
    }
}

pub fn encode(records: &[ConditionRecord], kind: PathKind) -> Encoded {
    match kind {
        PathKind::String => Encoded::Scalar(encode_scalar(records)),
        PathKind::Array => Encoded::Lines(records.iter().map(encode_line).collect()),
    }
}

/// Text of a single record as it would appear at a path of `kind`.
pub fn encode_record(record: &ConditionRecord, kind: PathKind) -> String {
    match kind {
        PathKind::String => encode_clause(record),
        PathKind::Array => encode_line(record),
    }
}

// One part stays on the marker line; several become an indented block.
fn encode_scalar(records: &[ConditionRecord]) -> Option<String> {
    let parts: Vec<String> = records.iter().map(encode_clause).collect();
    match parts.len() {
        0 => None,
        1 => Some(format!("{} {}", SCRIPT_MARKER, parts[0])),
        _ => Some(format!("{}\n  {}", SCRIPT_MARKER, parts.join(&format!(" {}\n  ", AND_TOKEN)))),
    }
}

pub fn encode_clause(record: &ConditionRecord) -> String {
    let Some(var) = variable_expr(&record.condition) else {
        return raw_text_of(record);
    };
    let Some(quote) = quote_for(&var) else {
        warn!("placeholder {} holds both quote kinds, clause kept as read", var);
        return record.raw_text.clone();
    };
    if record.comparator != Comparator::Ge {
        warn!(
            "clause '{}' used '{}', rewritten as '>='",
            record.raw_text,
            record.comparator.as_str()
        );
    }
    format!("vars({q}{}{q}) >= {}", var, format_amount(record.amount()), q = quote)
}

// Double quotes unless the placeholder itself contains one.
fn quote_for(var: &str) -> Option<char> {
    match (var.contains('"'), var.contains('\'')) {
        (false, _) => Some('"'),
        (true, false) => Some('\''),
        (true, true) => None,
    }
}

pub fn encode_line(record: &ConditionRecord) -> String {
    match &record.condition {
        Condition::Raw { .. } => raw_text_of(record),
        Condition::Money { amount } => format!("console: cmi money take %player_name% {}", format_amount(*amount)),
        Condition::Meta { key, amount } => format!(
            "console: cmi usermeta %player_name% increment {} {}",
            key,
            format_amount(*amount)
        ),
        Condition::MythicMobs(m) => removal_line(m, MYTHIC_MARKER),
        Condition::NeigeItems(m) => removal_line(m, NEIGE_MARKER),
        Condition::Level { .. } | Condition::Unknown { .. } => {
            format!("console: say Unknown Action Rebuild {}", record.name())
        }
    }
}

/// Placeholder expression for a structured condition; `None` for `Raw`.
pub fn variable_expr(condition: &Condition) -> Option<String> {
    Some(match condition {
        Condition::Money { .. } => format!("%{}%", BALANCE_VAR),
        Condition::Level { .. } => format!("%{}%", LEVEL_VAR),
        Condition::Meta { key, .. } => format!("%{}{}%", META_PREFIX, key),
        Condition::MythicMobs(m) => format!("%{}{}%", ITEM_CHECK_PREFIX, item_clause(m, MYTHIC_MARKER)),
        Condition::NeigeItems(m) => format!("%{}{}%", ITEM_CHECK_PREFIX, item_clause(m, NEIGE_MARKER)),
        Condition::Unknown { key, .. } => key.clone(),
        Condition::Raw { .. } => return None,
    })
}

fn item_clause(m: &ItemMatch, marker: &str) -> String {
    if m.use_name {
        format!("{}{},{}{}{}", NAME_CLAUSE, m.name, NBT_CLAUSE, marker, m.key)
    } else {
        format!("{}{}{}", NBT_CLAUSE, marker, m.key)
    }
}

fn removal_line(m: &ItemMatch, marker: &str) -> String {
    // amt only accepts a non-negative integer
    let amt = m.amount.max(0.0).trunc() as u64;
    format!(
        "console: papi parse %player_name% %{}{},amt:{}%",
        ITEM_REMOVE_PREFIX,
        item_clause(m, marker),
        amt
    )
}

fn raw_text_of(record: &ConditionRecord) -> String {
    match &record.condition {
        Condition::Raw { text } => text.clone(),
        _ => record.raw_text.clone(),
    }
}

/// Shortest decimal form: `50`, `2.5`.
pub fn format_amount(v: f64) -> String {
    format!("{}", v)
}
