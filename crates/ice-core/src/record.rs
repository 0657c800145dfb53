//! Structured view of one DSL clause or command line.
//!
//! A [`ConditionRecord`] wraps a [`Condition`] (one variant per recognized
//! shape, plus [`Condition::Raw`] for text nothing recognized) together with
//! the text it was read from and a flag telling whether it came from a
//! command line.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    Money,
    Level,
    Meta,
    MythicMobs,
    NeigeItems,
    Unknown,
    Raw,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 7] = [
        ConditionKind::Money,
        ConditionKind::Level,
        ConditionKind::Meta,
        ConditionKind::MythicMobs,
        ConditionKind::NeigeItems,
        ConditionKind::Unknown,
        ConditionKind::Raw,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConditionKind::Money => "money",
            ConditionKind::Level => "level",
            ConditionKind::Meta => "meta",
            ConditionKind::MythicMobs => "mythicmobs",
            ConditionKind::NeigeItems => "neigeitems",
            ConditionKind::Unknown => "unknown",
            ConditionKind::Raw => "raw",
        }
    }
}

impl core::fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ConditionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        ConditionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == lower)
            .ok_or_else(|| format!("unknown condition kind: {}", s))
    }
}

fn default_use_name() -> bool {
    // Entries written before the flag existed always carried a name clause.
    true
}

/// Item match shared by the MythicMobs and NeigeItems variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemMatch {
    #[serde(default)]
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub amount: f64,
    /// `true`: match display name and NBT id; `false`: NBT id only.
    #[serde(default = "default_use_name")]
    pub use_name: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Condition {
    Money {
        #[serde(default)]
        amount: f64,
    },
    Level {
        #[serde(default)]
        amount: f64,
    },
    Meta {
        key: String,
        #[serde(default)]
        amount: f64,
    },
    MythicMobs(ItemMatch),
    NeigeItems(ItemMatch),
    /// Variable expression kept exactly as written.
    Unknown {
        key: String,
        #[serde(default)]
        amount: f64,
    },
    Raw {
        text: String,
    },
}

impl Condition {
    pub fn kind(&self) -> ConditionKind {
        match self {
            Condition::Money { .. } => ConditionKind::Money,
            Condition::Level { .. } => ConditionKind::Level,
            Condition::Meta { .. } => ConditionKind::Meta,
            Condition::MythicMobs(_) => ConditionKind::MythicMobs,
            Condition::NeigeItems(_) => ConditionKind::NeigeItems,
            Condition::Unknown { .. } => ConditionKind::Unknown,
            Condition::Raw { .. } => ConditionKind::Raw,
        }
    }

    pub fn amount(&self) -> f64 {
        match self {
            Condition::Money { amount }
            | Condition::Level { amount }
            | Condition::Meta { amount, .. }
            | Condition::Unknown { amount, .. } => *amount,
            Condition::MythicMobs(m) | Condition::NeigeItems(m) => m.amount,
            Condition::Raw { .. } => 0.0,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Condition::Money { .. } => "balance",
            Condition::Level { .. } => "level",
            Condition::Meta { key, .. } | Condition::Unknown { key, .. } => key,
            Condition::MythicMobs(m) | Condition::NeigeItems(m) => &m.key,
            Condition::Raw { text } => text,
        }
    }

    /// No effect on `Raw`.
    pub fn set_amount(&mut self, value: f64) {
        match self {
            Condition::Money { amount }
            | Condition::Level { amount }
            | Condition::Meta { amount, .. }
            | Condition::Unknown { amount, .. } => *amount = value,
            Condition::MythicMobs(m) | Condition::NeigeItems(m) => m.amount = value,
            Condition::Raw { .. } => {}
        }
    }

    pub fn item_match(&self) -> Option<&ItemMatch> {
        match self {
            Condition::MythicMobs(m) | Condition::NeigeItems(m) => Some(m),
            _ => None,
        }
    }

    /// Rebuild a condition of `kind` from loose form fields.
    pub fn from_fields(kind: ConditionKind, name: &str, key: &str, amount: f64, use_name: bool) -> Self {
        let item = || ItemMatch {
            name: name.to_string(),
            key: key.to_string(),
            amount,
            use_name,
        };
        match kind {
            ConditionKind::Money => Condition::Money { amount },
            ConditionKind::Level => Condition::Level { amount },
            ConditionKind::Meta => Condition::Meta { key: key.to_string(), amount },
            ConditionKind::MythicMobs => Condition::MythicMobs(item()),
            ConditionKind::NeigeItems => Condition::NeigeItems(item()),
            ConditionKind::Unknown => Condition::Unknown { key: key.to_string(), amount },
            ConditionKind::Raw => Condition::Raw { text: key.to_string() },
        }
    }
}

/// Comparison operator of a `vars(...)` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Comparator {
    #[default]
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
}

impl Comparator {
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            ">=" => Some(Comparator::Ge),
            "<=" => Some(Comparator::Le),
            "==" => Some(Comparator::Eq),
            ">" => Some(Comparator::Gt),
            "<" => Some(Comparator::Lt),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::Ge => ">=",
            Comparator::Le => "<=",
            Comparator::Eq => "==",
            Comparator::Gt => ">",
            Comparator::Lt => "<",
        }
    }

    fn is_default(&self) -> bool {
        *self == Comparator::Ge
    }
}

/// The editable unit of a condition or action list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRecord {
    #[serde(flatten)]
    pub condition: Condition,
    /// Text the record was parsed from, or last encoded to.
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub is_action: bool,
    #[serde(default, skip_serializing_if = "Comparator::is_default")]
    pub comparator: Comparator,
}

impl ConditionRecord {
    pub fn new(condition: Condition) -> Self {
        Self {
            condition,
            raw_text: String::new(),
            is_action: false,
            comparator: Comparator::Ge,
        }
    }

    pub fn raw(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            raw_text: text.clone(),
            ..Self::new(Condition::Raw { text })
        }
    }

    pub fn action(condition: Condition) -> Self {
        Self {
            is_action: true,
            ..Self::new(condition)
        }
    }

    pub fn kind(&self) -> ConditionKind {
        self.condition.kind()
    }

    pub fn is_parsed(&self) -> bool {
        !matches!(self.condition, Condition::Raw { .. })
    }

    pub fn amount(&self) -> f64 {
        self.condition.amount()
    }

    pub fn key(&self) -> &str {
        self.condition.key()
    }

    /// Item name for item kinds, otherwise a descriptive label.
    pub fn name(&self) -> &str {
        match &self.condition {
            Condition::Money { .. } if self.is_action => "Money deduction",
            Condition::Money { .. } => "Balance",
            Condition::Level { .. } => "Level",
            Condition::Meta { .. } => "Player meta",
            Condition::MythicMobs(m) | Condition::NeigeItems(m) => &m.name,
            Condition::Unknown { .. } => "Unknown variable",
            Condition::Raw { .. } if self.is_action => "Command",
            Condition::Raw { .. } => "Raw logic",
        }
    }

    /// `None` for non-item kinds.
    pub fn use_name(&self) -> Option<bool> {
        self.condition.item_match().map(|m| m.use_name)
    }

    /// Switch kind, carrying name/key/amount across.
    pub fn set_kind(&mut self, kind: ConditionKind) {
        if kind == self.kind() {
            return;
        }
        let use_name = self.use_name().unwrap_or_else(default_use_name);
        let name = match &self.condition {
            Condition::MythicMobs(m) | Condition::NeigeItems(m) => m.name.clone(),
            _ => String::new(),
        };
        let key = self.key().to_string();
        self.condition = Condition::from_fields(kind, &name, &key, self.amount(), use_name);
        if let Condition::Raw { text } = &self.condition {
            self.raw_text = text.clone();
        }
    }

    /// Only item kinds carry a name; other kinds ignore it.
    pub fn set_name(&mut self, name: &str) {
        if let Condition::MythicMobs(m) | Condition::NeigeItems(m) = &mut self.condition {
            m.name = name.to_string();
        }
    }

    /// For `Raw` records this replaces the verbatim text.
    pub fn set_key(&mut self, key: &str) {
        match &mut self.condition {
            Condition::Money { .. } | Condition::Level { .. } => {}
            Condition::Meta { key: k, .. } | Condition::Unknown { key: k, .. } => *k = key.to_string(),
            Condition::MythicMobs(m) | Condition::NeigeItems(m) => m.key = key.to_string(),
            Condition::Raw { text } => {
                *text = key.to_string();
                self.raw_text = key.to_string();
            }
        }
    }

    pub fn set_amount(&mut self, value: f64) {
        self.condition.set_amount(value);
    }

    pub fn set_use_name(&mut self, use_name: bool) {
        if let Condition::MythicMobs(m) | Condition::NeigeItems(m) = &mut self.condition {
            m.use_name = use_name;
        }
    }
}
