use std::collections::HashSet;
use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use walkdir::WalkDir;

use crate::config::ResolvedConfig;
use crate::domain::{SampleName, run_folder_name};
use crate::error::SorterError;

/// Destination side of the sorter: `<root>/<subfolder>/<sample> <suffix>.d`.
#[derive(Debug, Clone)]
pub struct Store {
    destination_root: Utf8PathBuf,
    instrument_suffix: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutcome {
    pub destination: Utf8PathBuf,
    /// How many names were taken before a free one was found.
    pub collisions: u64,
}

impl Store {
    pub fn new(destination_root: Utf8PathBuf, instrument_suffix: impl Into<String>) -> Self {
        Self {
            destination_root,
            instrument_suffix: instrument_suffix.into(),
        }
    }

    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new(config.destination.clone(), config.instrument_suffix.clone())
    }

    pub fn subfolder_dir(&self, subfolder: &str) -> Utf8PathBuf {
        self.destination_root.join(subfolder)
    }

    pub fn ensure_subfolders<'a>(
        &self,
        subfolders: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), SorterError> {
        for subfolder in subfolders {
            let dir = self.subfolder_dir(subfolder);
            fs::create_dir_all(dir.as_std_path())
                .map_err(|err| SorterError::Filesystem(format!("create {dir}: {err}")))?;
        }
        Ok(())
    }

    /// First destination name that neither exists on disk nor is in `reserved`, without
    /// creating anything.
    ///
    /// A dry run passes the names it has already handed out as `reserved`, so two runs with the
    /// same sample name are planned the way a real run would number them.
    pub fn planned_destination(
        &self,
        subfolder: &str,
        sample: &SampleName,
        reserved: &HashSet<Utf8PathBuf>,
    ) -> Utf8PathBuf {
        let dir = self.subfolder_dir(subfolder);
        (0u64..)
            .map(|n| dir.join(run_folder_name(sample, &self.instrument_suffix, n)))
            .find(|candidate| !reserved.contains(candidate) && !candidate.as_std_path().exists())
            .unwrap_or_else(|| dir.join(run_folder_name(sample, &self.instrument_suffix, 0)))
    }

    /// Copies `source` under `subfolder`, numbering the name until an unused one is found.
    pub fn copy_run(
        &self,
        source: &Utf8Path,
        subfolder: &str,
        sample: &SampleName,
    ) -> Result<CopyOutcome, SorterError> {
        let dir = self.subfolder_dir(subfolder);
        fs::create_dir_all(dir.as_std_path())
            .map_err(|err| SorterError::Filesystem(format!("create {dir}: {err}")))?;

        let outcome = self.claim_destination(&dir, sample)?;
        if let Err(err) = Self::copy_dir_recursive(source, &outcome.destination) {
            // Leave no half-copied run behind; the next invocation retries from scratch.
            if let Err(cleanup) = fs::remove_dir_all(outcome.destination.as_std_path()) {
                tracing::warn!(
                    destination = %outcome.destination,
                    error = %cleanup,
                    "failed to remove partial copy"
                );
            }
            return Err(err);
        }
        Ok(outcome)
    }

    fn claim_destination(
        &self,
        dir: &Utf8Path,
        sample: &SampleName,
    ) -> Result<CopyOutcome, SorterError> {
        let mut copy_number = 0u64;
        loop {
            let name = run_folder_name(sample, &self.instrument_suffix, copy_number);
            let candidate = dir.join(&name);
            // create_dir fails on an existing path, so nothing is ever overwritten.
            match fs::create_dir(candidate.as_std_path()) {
                Ok(()) => {
                    return Ok(CopyOutcome {
                        destination: candidate,
                        collisions: copy_number,
                    });
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::info!(folder = %name, "folder already exists, retrying");
                    copy_number += 1;
                }
                Err(err) => {
                    return Err(SorterError::Filesystem(format!("create {candidate}: {err}")));
                }
            }
        }
    }

    pub fn copy_dir_recursive(source: &Utf8Path, dest: &Utf8Path) -> Result<(), SorterError> {
        let copy_err = |message: String| SorterError::Copy {
            source_dir: source.as_std_path().to_path_buf(),
            destination: dest.as_std_path().to_path_buf(),
            message,
        };

        fs::create_dir_all(dest.as_std_path()).map_err(|err| copy_err(err.to_string()))?;
        for entry in WalkDir::new(source.as_std_path())
            .min_depth(1)
            .follow_links(true)
        {
            let entry = entry.map_err(|err| copy_err(err.to_string()))?;
            let relative = entry
                .path()
                .strip_prefix(source.as_std_path())
                .map_err(|err| copy_err(err.to_string()))?;
            let target = dest.as_std_path().join(relative);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&target).map_err(|err| copy_err(err.to_string()))?;
            } else {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(|err| copy_err(err.to_string()))?;
                }
                fs::copy(entry.path(), &target).map_err(|err| {
                    copy_err(format!("{}: {err}", entry.path().display()))
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let store = Store::new(Utf8PathBuf::from("/dest"), "ESI");
        let sample = SampleName::sanitize("xy 1234");
        assert_eq!(
            store.planned_destination("Xy", &sample, &HashSet::new()),
            Utf8PathBuf::from("/dest/Xy/xy 1234 ESI.d")
        );
    }

    #[test]
    fn planned_destination_skips_reserved_names() {
        let store = Store::new(Utf8PathBuf::from("/dest"), "ESI");
        let sample = SampleName::sanitize("Foo");
        let reserved = HashSet::from([
            Utf8PathBuf::from("/dest/NoInitials/Foo ESI.d"),
            Utf8PathBuf::from("/dest/NoInitials/Foo-1 ESI.d"),
        ]);
        assert_eq!(
            store.planned_destination("NoInitials", &sample, &reserved),
            Utf8PathBuf::from("/dest/NoInitials/Foo-2 ESI.d")
        );
    }
}
