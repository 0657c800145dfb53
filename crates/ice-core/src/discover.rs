use serde::Serialize;
use serde_json::Value;

use crate::path::{ItemPath, PathKind};

/// A DSL-bearing location found in an item entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredPath {
    pub path: ItemPath,
    pub kind: PathKind,
}

impl DiscoveredPath {
    fn new(path: ItemPath) -> Self {
        let kind = path.kind();
        Self { path, kind }
    }
}

/// null, false, 0 and "" are falsy; containers are always truthy.
pub fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn truthy_field(v: &Value, key: &str) -> bool {
    v.get(key).is_some_and(truthy)
}

/// Every location of `item` holding condition or action DSL, in a fixed order:
/// `display.shiny` first, then each `actions.<key>.<i>` entry's `condition`
/// followed by its `actions`.
pub fn discover_paths(item: &Value) -> Vec<DiscoveredPath> {
    let mut out = Vec::new();
    if let Some(display) = item.get("display")
        && truthy_field(display, "shiny")
    {
        out.push(DiscoveredPath::new(ItemPath::new(["display", "shiny"])));
    }
    let Some(actions) = item.get("actions").and_then(Value::as_object) else {
        return out;
    };
    for (action_key, action_value) in actions {
        let Some(entries) = action_value.as_array() else {
            continue;
        };
        for (index, entry) in entries.iter().enumerate() {
            let idx = index.to_string();
            for field in ["condition", "actions"] {
                if truthy_field(entry, field) {
                    out.push(DiscoveredPath::new(ItemPath::new([
                        "actions",
                        action_key.as_str(),
                        idx.as_str(),
                        field,
                    ])));
                }
            }
        }
    }
    out
}
