//! Decoding of condition/action DSL text into [`ConditionRecord`]s.
//!
//! Two shapes of text are understood:
//! - scalar conditions: an optional `js:` marker followed by clauses joined with
//!   `&&`, each clause ideally `vars("%placeholder%") >= <number>`;
//! - action lists: one console command per line.
//!
//! Recognition is driven by ordered rule tables ([`VARIABLE_RULES`],
//! [`LINE_RULES`]); the first rule that matches wins. Every rule matches a whole
//! clause or line, so nothing around a recognized shape is dropped. Text no rule
//! accepts becomes a [`Condition::Raw`] record and is re-emitted verbatim.
use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde_json::Value;

use crate::path::PathKind;
use crate::record::{Comparator, Condition, ConditionRecord, ItemMatch};

pub(crate) const SCRIPT_MARKER: &str = "js:";
pub(crate) const AND_TOKEN: &str = "&&";

pub(crate) const BALANCE_VAR: &str = "cmi_user_balance";
pub(crate) const LEVEL_VAR: &str = "player_level";
pub(crate) const META_PREFIX: &str = "cmi_user_meta_";
pub(crate) const ITEM_CHECK_PREFIX: &str = "checkitem_amount_";
pub(crate) const ITEM_REMOVE_PREFIX: &str = "checkitem_amount_remove_";
pub(crate) const NAME_CLAUSE: &str = "nameequals:";
pub(crate) const NBT_CLAUSE: &str = "nbtstrings:";
pub(crate) const NBT_SEPARATOR: &str = ",nbtstrings:";
pub(crate) const NEIGE_MARKER: &str = "NeigeItems..id=";
pub(crate) const MYTHIC_MARKER: &str = "PublicBukkitValues..mythicmobs:type=";

static CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^vars\(\s*(?:"([^"]*)"|'([^']*)')\s*\)\s*(>=|<=|==|>|<)\s*(-?[0-9.]+)$"#).expect("clause regex")
});
static AMT_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",amt:(\d+)$").expect("amt regex"));
static REMOVE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^console:\s*papi parse %player_name% %(checkitem_amount_remove_[^%]+)%$").expect("removal regex")
});
static MONEY_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^console:\s*cmi money take %player_name% ([0-9.]+)$").expect("money regex"));
static META_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^console:\s*cmi usermeta %player_name% increment (\S+) ([+-]?[0-9.]+)$").expect("meta regex")
});

/// A named recognizer: returns a condition when the input has its shape.
pub struct Rule {
    pub name: &'static str,
    pub recognize: fn(&str) -> Option<Condition>,
}

/// Placeholder classification, tried in order on the `%`-stripped expression.
pub const VARIABLE_RULES: &[Rule] = &[
    Rule { name: "balance", recognize: recognize_balance },
    Rule { name: "level", recognize: recognize_level },
    Rule { name: "meta", recognize: recognize_meta },
    Rule { name: "item-check", recognize: recognize_item_check },
];

/// Command line shapes, tried in order on the trimmed line.
pub const LINE_RULES: &[Rule] = &[
    Rule { name: "item-removal", recognize: recognize_removal_line },
    Rule { name: "money-take", recognize: recognize_money_line },
    Rule { name: "meta-increment", recognize: recognize_meta_line },
];

/// Split a scalar condition into records, in source order.
pub fn parse_scalar(text: &str) -> Vec<ConditionRecord> {
    let text = text.trim();
    let body = text.strip_prefix(SCRIPT_MARKER).unwrap_or(text);
    body.split(AND_TOKEN)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_clause)
        .collect()
}

/// One `&&`-separated part of a scalar condition.
pub fn parse_clause(part: &str) -> ConditionRecord {
    match match_clause(part) {
        Some(rec) => rec,
        None => {
            debug!("clause kept as raw: {}", part);
            ConditionRecord::raw(part)
        }
    }
}

fn match_clause(part: &str) -> Option<ConditionRecord> {
    let caps = CLAUSE_RE.captures(part)?;
    let expr = caps.get(1).or_else(|| caps.get(2))?.as_str();
    let comparator = Comparator::parse(&caps[3])?;
    let amount: f64 = caps[4].parse().ok()?;
    let mut condition = classify_variable(expr);
    condition.set_amount(amount);
    Some(ConditionRecord {
        condition,
        raw_text: part.to_string(),
        is_action: false,
        comparator,
    })
}

pub fn parse_lines<I, S>(lines: I) -> Vec<ConditionRecord>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines.into_iter().map(|l| parse_line(l.as_ref())).collect()
}

pub fn parse_line(line: &str) -> ConditionRecord {
    let trimmed = line.trim();
    let recognized = LINE_RULES
        .iter()
        .find_map(|rule| (rule.recognize)(trimmed).map(|c| (rule.name, c)));
    match recognized {
        Some((rule, condition)) => {
            debug!("line matched {}: {}", rule, trimmed);
            ConditionRecord {
                raw_text: line.to_string(),
                ..ConditionRecord::action(condition)
            }
        }
        None => ConditionRecord {
            is_action: true,
            ..ConditionRecord::raw(line)
        },
    }
}

/// Records stored at a path of `kind`; `None` when the value's shape does not fit.
///
/// Missing or null values read as an empty list. Scalars other than strings at a
/// `String` path are read through their text form; non-string sequence elements
/// through their JSON text.
pub fn parse_value(value: Option<&Value>, kind: PathKind) -> Option<Vec<ConditionRecord>> {
    match (kind, value) {
        (_, None) | (_, Some(Value::Null)) => Some(Vec::new()),
        (PathKind::String, Some(Value::String(s))) => Some(parse_scalar(s)),
        (PathKind::String, Some(v @ (Value::Bool(_) | Value::Number(_)))) => Some(parse_scalar(&v.to_string())),
        (PathKind::Array, Some(Value::Array(items))) => Some(parse_lines(items.iter().map(line_text))),
        _ => None,
    }
}

fn line_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn strip_percent(expr: &str) -> &str {
    let s = expr.strip_prefix('%').unwrap_or(expr);
    s.strip_suffix('%').unwrap_or(s)
}

/// Classify a placeholder expression. The amount is left at zero.
pub fn classify_variable(expr: &str) -> Condition {
    let inner = strip_percent(expr);
    VARIABLE_RULES
        .iter()
        .find_map(|rule| (rule.recognize)(inner))
        .unwrap_or_else(|| Condition::Unknown {
            key: expr.to_string(),
            amount: 0.0,
        })
}

/// Classify the inner token of an item-removal placeholder
/// (`checkitem_amount_remove_...,amt:<n>`), amount taken from the `amt` suffix.
pub fn classify_removal(inner: &str) -> Condition {
    let (body, amount) = match AMT_SUFFIX_RE.captures(inner) {
        Some(caps) => {
            let start = caps.get(0).map_or(inner.len(), |m| m.start());
            (&inner[..start], caps[1].parse::<f64>().unwrap_or(0.0))
        }
        None => (inner, 0.0),
    };
    let check = body.replacen(ITEM_REMOVE_PREFIX, ITEM_CHECK_PREFIX, 1);
    let mut condition = classify_variable(&check);
    condition.set_amount(amount);
    condition
}

fn recognize_balance(inner: &str) -> Option<Condition> {
    (inner == BALANCE_VAR).then_some(Condition::Money { amount: 0.0 })
}

fn recognize_level(inner: &str) -> Option<Condition> {
    (inner == LEVEL_VAR).then_some(Condition::Level { amount: 0.0 })
}

fn recognize_meta(inner: &str) -> Option<Condition> {
    let key = inner.strip_prefix(META_PREFIX).filter(|k| !k.is_empty())?;
    Some(Condition::Meta {
        key: key.to_string(),
        amount: 0.0,
    })
}

// checkitem_amount_nameequals:<name>,nbtstrings:<nbt>  (matched by name and tag)
// checkitem_amount_nbtstrings:<nbt>                     (matched by tag only)
fn recognize_item_check(inner: &str) -> Option<Condition> {
    let rest = inner.strip_prefix(ITEM_CHECK_PREFIX)?;
    let (name, nbt, use_name) = match rest.strip_prefix(NAME_CLAUSE) {
        Some(named) => {
            let (name, nbt) = named.split_once(NBT_SEPARATOR)?;
            (name, nbt, true)
        }
        None => ("", rest.strip_prefix(NBT_CLAUSE)?, false),
    };
    let item = |key: &str| ItemMatch {
        name: name.to_string(),
        key: key.to_string(),
        amount: 0.0,
        use_name,
    };
    if let Some(key) = nbt.strip_prefix(NEIGE_MARKER) {
        return Some(Condition::NeigeItems(item(key)));
    }
    if let Some(key) = nbt.strip_prefix(MYTHIC_MARKER) {
        return Some(Condition::MythicMobs(item(key)));
    }
    None
}

fn recognize_removal_line(line: &str) -> Option<Condition> {
    let caps = REMOVE_LINE_RE.captures(line)?;
    match classify_removal(&caps[1]) {
        // An unknown item cannot be rebuilt as a removal command; keep the line raw.
        Condition::Unknown { .. } => None,
        condition => Some(condition),
    }
}

fn recognize_money_line(line: &str) -> Option<Condition> {
    let caps = MONEY_LINE_RE.captures(line)?;
    let amount = caps[1].parse().ok()?;
    Some(Condition::Money { amount })
}

fn recognize_meta_line(line: &str) -> Option<Condition> {
    let caps = META_LINE_RE.captures(line)?;
    let amount = caps[2].parse().ok()?;
    Some(Condition::Meta {
        key: caps[1].to_string(),
        amount,
    })
}
