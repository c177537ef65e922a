//! Depth-bounded directory traversal.
//!
//! The root sits at depth 0. Directories up to and including `max_depth` are yielded together
//! with their immediate children; nothing below that is visited.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use walkdir::{DirEntry, FilterEntry, WalkDir};

use crate::error::SorterError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub dir: Utf8PathBuf,
    pub depth: usize,
    pub subdirs: Vec<String>,
    pub files: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DepthWalker {
    root: Utf8PathBuf,
    max_depth: usize,
}

impl DepthWalker {
    pub fn new(root: &Utf8Path, max_depth: usize) -> Result<Self, SorterError> {
        if !root.is_dir() {
            return Err(SorterError::SourceNotFound(root.as_std_path().to_path_buf()));
        }
        // Drops trailing separators so yielded paths are stable across configs.
        let root = root.components().collect::<Utf8PathBuf>();
        Ok(Self { root, max_depth })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn iter(&self) -> Walk {
        let inner = WalkDir::new(self.root.as_std_path())
            .min_depth(0)
            .max_depth(self.max_depth)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(is_dir as fn(&DirEntry) -> bool);
        Walk { inner }
    }
}

pub struct Walk {
    inner: FilterEntry<walkdir::IntoIter, fn(&DirEntry) -> bool>,
}

impl Iterator for Walk {
    type Item = WalkEntry;

    fn next(&mut self) -> Option<WalkEntry> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable directory");
                    continue;
                }
            };
            let depth = entry.depth();
            let dir = match Utf8PathBuf::from_path_buf(entry.into_path()) {
                Ok(dir) => dir,
                Err(path) => {
                    tracing::warn!(path = %path.display(), "skipping directory with non UTF-8 path");
                    continue;
                }
            };
            match list_children(&dir) {
                Ok((subdirs, files)) => {
                    return Some(WalkEntry {
                        dir,
                        depth,
                        subdirs,
                        files,
                    });
                }
                Err(err) => {
                    tracing::warn!(dir = %dir, error = %err, "skipping unreadable directory");
                }
            }
        }
    }
}

fn is_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
}

fn list_children(dir: &Utf8Path) -> std::io::Result<(Vec<String>, Vec<String>)> {
    let mut subdirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            tracing::debug!(dir = %dir, "ignoring entry with non UTF-8 name");
            continue;
        };
        if entry.file_type()?.is_dir() {
            subdirs.push(name);
        } else {
            files.push(name);
        }
    }
    subdirs.sort();
    files.sort();
    Ok((subdirs, files))
}
