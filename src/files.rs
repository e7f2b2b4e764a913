use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BrowseError, Result};

// ---------------------------------------------------------------------------
// Extension sets
// ---------------------------------------------------------------------------

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "tiff", "tif", "webp", "ico", "tga", "pnm", "pbm",
    "pgm", "ppm", "qoi",
];

pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "log", "md", "json", "csv", "xml", "html", "htm", "css", "js", "ini", "cfg", "conf",
    "toml", "yaml", "yml", "rs", "py", "sh",
];

/// What the content pane should do with a file. Decided by extension only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Image,
    Text,
    Other,
}

fn lower_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

pub fn classify(path: &Path) -> ContentKind {
    match lower_extension(path) {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => ContentKind::Image,
        Some(ext) if TEXT_EXTENSIONS.contains(&ext.as_str()) => ContentKind::Text,
        _ => ContentKind::Other,
    }
}

pub fn is_image_file(path: &Path) -> bool {
    classify(path) == ContentKind::Image
}

// ---------------------------------------------------------------------------
// Directory listing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// List the immediate entries of `dir`: directories first, then files, each
/// group ordered by case-insensitive name. Entries that vanish or cannot be
/// stat'ed mid-listing are skipped.
pub fn list_dir(dir: &Path) -> Result<Vec<DirEntry>> {
    if !dir.is_dir() && dir.exists() {
        return Err(BrowseError::NotFound(dir.to_path_buf()));
    }
    let read = fs::read_dir(dir).map_err(|e| BrowseError::from_listing(dir.to_path_buf(), e))?;

    let mut entries = Vec::new();
    for entry in read.filter_map(|e| e.ok()) {
        let Ok(ft) = entry.file_type() else { continue };
        let path = entry.path();
        let is_dir = if ft.is_symlink() {
            path.is_dir()
        } else {
            ft.is_dir()
        };
        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path,
            is_dir,
        });
    }

    entries.sort_by(|a, b| {
        b.is_dir
            .cmp(&a.is_dir)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    Ok(entries)
}
