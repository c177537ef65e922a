//! Append-only record of source folders that were already copied.
//!
//! Membership is checked before a copy and the path is appended after it. The two steps are not
//! atomic: a crash in between means the folder is copied again (under a numbered name) next run.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::SorterError;

#[derive(Debug)]
pub struct Ledger {
    path: Utf8PathBuf,
    processed: HashSet<String>,
    persist: bool,
    needs_newline: bool,
}

impl Ledger {
    /// Loads the ledger, creating an empty file when none exists yet.
    pub fn open(path: &Utf8Path) -> Result<Self, SorterError> {
        let content = match fs::read_to_string(path.as_std_path()) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path, "ledger does not exist, creating it");
                if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
                    fs::create_dir_all(parent.as_std_path())
                        .map_err(|err| ledger_err(path, err))?;
                }
                fs::File::create(path.as_std_path()).map_err(|err| ledger_err(path, err))?;
                String::new()
            }
            Err(err) => return Err(ledger_err(path, err)),
        };

        Ok(Self::from_content(path, &content, true))
    }

    /// Loads the ledger if it exists; recording only updates memory. Used for dry runs.
    pub fn open_read_only(path: &Utf8Path) -> Result<Self, SorterError> {
        let content = match fs::read_to_string(path.as_std_path()) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(ledger_err(path, err)),
        };
        Ok(Self::from_content(path, &content, false))
    }

    fn from_content(path: &Utf8Path, content: &str, persist: bool) -> Self {
        let processed = content
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            path: path.to_path_buf(),
            processed,
            persist,
            needs_newline: !content.is_empty() && !content.ends_with('\n'),
        }
    }

    pub fn contains(&self, folder: &str) -> bool {
        self.processed.contains(folder)
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }

    pub fn record(&mut self, folder: &str) -> Result<(), SorterError> {
        if self.persist {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.path.as_std_path())
                .map_err(|err| ledger_err(&self.path, err))?;
            if self.needs_newline {
                writeln!(file).map_err(|err| ledger_err(&self.path, err))?;
                self.needs_newline = false;
            }
            writeln!(file, "{folder}").map_err(|err| ledger_err(&self.path, err))?;
        }
        self.processed.insert(folder.to_string());
        Ok(())
    }
}

fn ledger_err(path: &Utf8Path, err: io::Error) -> SorterError {
    SorterError::Ledger {
        path: path.as_std_path().to_path_buf(),
        message: err.to_string(),
    }
}
