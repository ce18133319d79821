use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

/// Expands the user-supplied path list into concrete image files.
pub struct FileScanner {
    recursive: bool,
    follow_symlinks: bool,
}

impl FileScanner {
    pub fn new(recursive: bool, follow_symlinks: bool) -> Self {
        Self {
            recursive,
            follow_symlinks,
        }
    }

    pub fn collect(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in paths {
            if !path.exists() {
                warn!(
                    "Path does not exist or is not accessible: {}",
                    path.display()
                );
                continue;
            }
            if path.is_dir() {
                self.walk_directory(path, &mut files);
            } else if Self::is_supported_file(path) {
                files.push(path.clone());
            } else {
                warn!("Not a supported image file: {}", path.display());
            }
        }

        info!("Found {} candidate image files", files.len());
        files
    }

    /// Collects supported files directly in `dir`, descending into
    /// subdirectories only when recursion is on, and into symlinked
    /// directories only when following symlinks is on.
    fn walk_directory(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read directory {}: {}", dir.display(), e);
                return;
            }
        };
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_dir() {
                if !self.recursive {
                    continue;
                }
                if !self.follow_symlinks && is_symlink(&path) {
                    continue;
                }
                self.walk_directory(&path, files);
            } else if path.is_file() && Self::is_supported_file(&path) {
                files.push(path);
            }
        }
    }

    fn is_supported_file(path: &Path) -> bool {
        let supported_extensions = ["jpg", "jpeg", "png"];

        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| supported_extensions.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}
