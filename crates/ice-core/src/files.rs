use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::info;
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::FileOptions;

use crate::document::{Document, DocumentError, DumpFormat};

pub fn is_item_file(p: &Path) -> bool {
    p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("yml") | Some("yaml"))
}

// Recursive, sorted; unreadable entries are skipped.
pub fn find_item_files(dir: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .flatten()
        .map(|e| e.into_path())
        .filter(|p| is_item_file(p))
        .collect();
    out.sort();
    out
}

pub fn read_document(path: &Path) -> Result<Document, DocumentError> {
    let text = fs::read_to_string(path)?;
    Document::load(&text)
}

pub fn write_document(path: &Path, doc: &Document) -> Result<(), DocumentError> {
    let text = doc.dump(DumpFormat::Yaml)?;
    fs::write(path, text)?;
    Ok(())
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Copy `path` next to itself as `<name>.<timestamp>.bak`.
pub fn backup_file(path: &Path) -> io::Result<PathBuf> {
    if !path.is_file() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a file"));
    }
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("items.yml");
    let dest = path.with_file_name(format!("{}.{}.bak", name, timestamp()));
    fs::copy(path, &dest)?;
    Ok(dest)
}

/// Zip every item file under `dir` into `<dir>_<timestamp>.zip` beside it.
/// Entry names are relative to `dir`; `.bak` copies and other files are left out.
pub fn zip_backup_dir(dir: &Path) -> io::Result<PathBuf> {
    if !dir.is_dir() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a directory"));
    }
    let items = find_item_files(dir);
    if items.is_empty() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "no item files to back up"));
    }
    let parent = dir.parent().unwrap_or(Path::new("."));
    let name = dir.file_name().and_then(|s| s.to_str()).unwrap_or("items");
    let dest = parent.join(format!("{}_{}.zip", name, timestamp()));

    let mut zip = zip::ZipWriter::new(fs::File::create(&dest)?);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    for path in &items {
        let Ok(rel) = path.strip_prefix(dir) else {
            continue;
        };
        zip.start_file(rel.to_string_lossy().replace('\\', "/"), options)?;
        zip.write_all(&fs::read(path)?)?;
    }
    zip.finish()?;
    info!("backed up {} item file(s) to {}", items.len(), dest.display());
    Ok(dest)
}
