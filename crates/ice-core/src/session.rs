//! Editing session over one selected path of one item.
//!
//! A session is created when a path is selected and thrown away when another
//! one is; nothing about the current selection lives outside it. All document
//! access goes through the `&Document`/`&mut Document` passed to each call.
use serde_json::Value;
use thiserror::Error;

use crate::document::{Document, value_type_name};
use crate::encode::{encode, encode_record};
use crate::parse::parse_value;
use crate::path::{self, ItemPath, PathError, PathKind};
use crate::record::{Condition, ConditionRecord};
use crate::sync::{SyncError, SyncReport, sync_conditions};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown item '{0}'")]
    UnknownItem(String),
    #[error("value at {path} is a {found}, expected {expected}")]
    UnsupportedValue {
        path: ItemPath,
        found: &'static str,
        expected: &'static str,
    },
    #[error("condition index {index} out of range (len={len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Path(#[from] PathError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Encoded value written at the path.
    Written,
    /// Empty scalar list: the field was removed.
    Removed,
    /// Records equal what was loaded; document left as is.
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    item_key: String,
    path: ItemPath,
    kind: PathKind,
    records: Vec<ConditionRecord>,
    loaded: Vec<ConditionRecord>,
    selected: Option<usize>,
}

impl EditSession {
    pub fn open(doc: &Document, item_key: &str, path: ItemPath) -> Result<Self, SessionError> {
        let records = load_conditions(doc, item_key, &path)?;
        Ok(Self {
            item_key: item_key.to_string(),
            kind: path.kind(),
            path,
            selected: (!records.is_empty()).then_some(0),
            loaded: records.clone(),
            records,
        })
    }

    pub fn item_key(&self) -> &str {
        &self.item_key
    }

    pub fn path(&self) -> &ItemPath {
        &self.path
    }

    pub fn kind(&self) -> PathKind {
        self.kind
    }

    pub fn records(&self) -> &[ConditionRecord] {
        &self.records
    }

    pub fn selected(&self) -> Option<(usize, &ConditionRecord)> {
        let idx = self.selected?;
        self.records.get(idx).map(|r| (idx, r))
    }

    pub fn select(&mut self, index: usize) -> Result<&ConditionRecord, SessionError> {
        self.check_index(index)?;
        self.selected = Some(index);
        Ok(&self.records[index])
    }

    pub fn is_dirty(&self) -> bool {
        self.records != self.loaded
    }

    /// Append a zero money condition and select it.
    pub fn add_condition(&mut self) -> usize {
        let mut record = ConditionRecord::new(Condition::Money { amount: 0.0 });
        record.is_action = self.kind == PathKind::Array;
        self.records.push(record);
        let idx = self.records.len() - 1;
        self.selected = Some(idx);
        idx
    }

    /// Remove and return the record at `index`; the selection is cleared.
    pub fn delete_condition(&mut self, index: usize) -> Result<ConditionRecord, SessionError> {
        self.check_index(index)?;
        self.selected = None;
        Ok(self.records.remove(index))
    }

    pub fn update_condition(&mut self, index: usize, record: ConditionRecord) -> Result<(), SessionError> {
        self.check_index(index)?;
        self.records[index] = record;
        Ok(())
    }

    /// Mutable access for field-level edits through the record setters.
    pub fn record_mut(&mut self, index: usize) -> Result<&mut ConditionRecord, SessionError> {
        self.check_index(index)?;
        Ok(&mut self.records[index])
    }

    /// Encode the records into the document and refresh each record's `raw_text`.
    pub fn commit(&mut self, doc: &mut Document) -> Result<CommitOutcome, SessionError> {
        if !self.is_dirty() {
            return Ok(CommitOutcome::Unchanged);
        }
        let outcome = commit_conditions(doc, &self.item_key, &self.path, &self.records)?;
        for record in self.records.iter_mut().filter(|r| r.is_parsed()) {
            record.raw_text = encode_record(record, self.kind);
        }
        self.loaded = self.records.clone();
        Ok(outcome)
    }

    pub fn sync(&self, doc: &mut Document) -> Result<SyncReport, SyncError> {
        sync_conditions(doc, &self.item_key, &self.path, &self.records)
    }

    fn check_index(&self, index: usize) -> Result<(), SessionError> {
        if index >= self.records.len() {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: self.records.len(),
            });
        }
        Ok(())
    }
}

/// Decode the DSL stored at `path` of `item_key`.
pub fn load_conditions(doc: &Document, item_key: &str, path: &ItemPath) -> Result<Vec<ConditionRecord>, SessionError> {
    if doc.item(item_key).is_none() {
        return Err(SessionError::UnknownItem(item_key.to_string()));
    }
    let kind = path.kind();
    let value = path::get(doc, item_key, path);
    parse_value(value, kind).ok_or_else(|| SessionError::UnsupportedValue {
        path: path.clone(),
        found: value.map_or("missing value", value_type_name),
        expected: match kind {
            PathKind::String => "string",
            PathKind::Array => "sequence",
        },
    })
}

/// Encode `records` and write them at `path`. An empty scalar list removes the field.
pub fn commit_conditions(
    doc: &mut Document,
    item_key: &str,
    path: &ItemPath,
    records: &[ConditionRecord],
) -> Result<CommitOutcome, SessionError> {
    if doc.item(item_key).is_none() {
        return Err(SessionError::UnknownItem(item_key.to_string()));
    }
    match encode(records, path.kind()).into_value() {
        Some(value) => {
            path::set(doc, item_key, path, value)?;
            Ok(CommitOutcome::Written)
        }
        None => {
            path::remove(doc, item_key, path)?;
            Ok(CommitOutcome::Removed)
        }
    }
}

/// Current value at `path`, cloned; convenience for front ends.
pub fn raw_value(doc: &Document, item_key: &str, path: &ItemPath) -> Option<Value> {
    path::get(doc, item_key, path).cloned()
}
