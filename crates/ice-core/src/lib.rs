//! ice-core: item condition editing core
//!
//! This crate focuses on a small, well-factored surface:
//! - YAML document model addressed by item key + ordered path
//! - Discovery of condition/action DSL fields inside an item
//! - Lossless DSL codec (parse into records, encode back)
//! - Sync of one path's conditions across the item, and an editing session API
//! - File helpers for scanning config directories and taking backups
//!
pub mod discover;
pub mod document;
pub mod encode;
pub mod files;
pub mod parse;
pub mod path;
pub mod record;
pub mod session;
pub mod sync;

pub use discover::{DiscoveredPath, discover_paths};
pub use document::{Document, DocumentError, DumpFormat};
pub use encode::{Encoded, encode, encode_record};
pub use parse::{classify_removal, classify_variable, parse_lines, parse_scalar, parse_value};
pub use path::{ItemPath, PathError, PathKind};
pub use record::{Comparator, Condition, ConditionKind, ConditionRecord, ItemMatch};
pub use session::{CommitOutcome, EditSession, SessionError, commit_conditions, load_conditions};
pub use sync::{SyncError, SyncReport, sync_conditions};
