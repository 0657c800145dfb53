//! Propagation of one path's structured records to the other paths of the
//! same item that share its [`PathKind`].
//!
//! Raw records never travel. At `Array` targets the target's own raw lines are
//! kept (in front of the synced lines) while its previously structured lines are
//! replaced; `String` targets are overwritten entirely.
use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::discover::discover_paths;
use crate::document::Document;
use crate::encode::encode;
use crate::parse::parse_value;
use crate::path::{self, ItemPath, PathKind};
use crate::record::ConditionRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("no structured conditions to sync")]
    NothingToSync,
    #[error("unknown item '{0}'")]
    UnknownItem(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub updated: Vec<ItemPath>,
    /// Same-kind targets that could not be written.
    pub skipped: Vec<ItemPath>,
}

impl SyncReport {
    pub fn updated_count(&self) -> usize {
        self.updated.len()
    }
}

pub fn sync_conditions(
    doc: &mut Document,
    item_key: &str,
    source: &ItemPath,
    records: &[ConditionRecord],
) -> Result<SyncReport, SyncError> {
    let parsed: Vec<ConditionRecord> = records.iter().filter(|r| r.is_parsed()).cloned().collect();
    if parsed.is_empty() {
        return Err(SyncError::NothingToSync);
    }
    let item = doc
        .item(item_key)
        .ok_or_else(|| SyncError::UnknownItem(item_key.to_string()))?;
    let source_kind = source.kind();
    let targets: Vec<ItemPath> = discover_paths(item)
        .into_iter()
        .filter(|d| &d.path != source && d.kind == source_kind)
        .map(|d| d.path)
        .collect();

    let mut report = SyncReport::default();
    for target in targets {
        let value = match source_kind {
            PathKind::String => encode(&parsed, PathKind::String).into_value(),
            PathKind::Array => {
                let existing = path::get(doc, item_key, &target);
                let Some(mut merged) = parse_value(existing, PathKind::Array) else {
                    warn!("sync target {} is not a sequence, skipped", target);
                    report.skipped.push(target);
                    continue;
                };
                merged.retain(|r| !r.is_parsed());
                merged.extend(parsed.iter().cloned());
                encode(&merged, PathKind::Array).into_value()
            }
        };
        let Some(value) = value else {
            report.skipped.push(target);
            continue;
        };
        match path::set(doc, item_key, &target, value) {
            Ok(()) => {
                debug!("synced {} -> {}", source, target);
                report.updated.push(target);
            }
            Err(_) => report.skipped.push(target),
        }
    }
    info!(
        "synced {} condition(s) from {} to {} path(s) of '{}'",
        parsed.len(),
        source,
        report.updated.len(),
        item_key
    );
    Ok(report)
}
