use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{reason}{}", line_suffix(.line))]
    Syntax { reason: String, line: Option<usize> },
    #[error("top-level value must be a mapping of item keys, found {0}")]
    NotAMapping(&'static str),
    #[error("failed to serialize document: {0}")]
    Serialize(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(" (line {})", l)).unwrap_or_default()
}

/// Output flavour of [`Document::dump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DumpFormat {
    /// Block YAML, 2-space indent, no wrapping, no anchors/aliases.
    #[default]
    Yaml,
    Json,
}

/// Item key → item entry tree, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self { root: Value::Object(Map::new()) }
    }

    pub fn load(text: &str) -> Result<Self, DocumentError> {
        if text.trim().is_empty() {
            return Ok(Self::new());
        }
        let syntax = |e: serde_yaml::Error| DocumentError::Syntax {
            line: e.location().map(|l| l.line()),
            reason: e.to_string(),
        };
        let mut yaml: serde_yaml::Value = serde_yaml::from_str(text).map_err(syntax)?;
        // `<<: *anchor` entries are folded into their mapping.
        yaml.apply_merge().map_err(syntax)?;
        let value = serde_json::to_value(yaml).map_err(|e| DocumentError::Syntax {
            reason: e.to_string(),
            line: None,
        })?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(_) => Ok(Self { root: value }),
            other => Err(DocumentError::NotAMapping(value_type_name(&other))),
        }
    }

    pub fn dump(&self, format: DumpFormat) -> Result<String, DocumentError> {
        match format {
            DumpFormat::Yaml => serde_yaml::to_string(&self.root).map_err(|e| DocumentError::Serialize(e.to_string())),
            DumpFormat::Json => {
                serde_json::to_string_pretty(&self.root).map_err(|e| DocumentError::Serialize(e.to_string()))
            }
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }

    pub fn item(&self, key: &str) -> Option<&Value> {
        self.root.as_object().and_then(|m| m.get(key))
    }

    pub fn item_keys(&self) -> impl Iterator<Item = &str> {
        self.root.as_object().into_iter().flat_map(|m| m.keys().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.root.as_object().map_or(0, Map::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
