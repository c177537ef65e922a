use std::collections::HashSet;

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::classify::{Classification, Classifier, InitialsClassifier};
use crate::config::ResolvedConfig;
use crate::domain::{RunFolder, SampleName, is_metadata_file};
use crate::error::SorterError;
use crate::extract;
use crate::ledger::Ledger;
use crate::store::Store;
use crate::walk::{DepthWalker, WalkEntry};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub started_at: String,
    pub finished_at: String,
    pub source: String,
    pub destination: String,
    pub dry_run: bool,
    pub folders: Vec<FolderResult>,
}

impl RunResult {
    pub fn count(&self, action: FolderAction) -> usize {
        self.folders.iter().filter(|f| f.action == action).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FolderResult {
    pub folder: String,
    pub action: FolderAction,
    pub sample_name: Option<String>,
    pub subfolder: Option<String>,
    pub destination: Option<String>,
    pub error: Option<String>,
}

impl FolderResult {
    fn skipped(folder: &RunFolder, action: FolderAction) -> Self {
        Self {
            folder: folder.ledger_key().to_string(),
            action,
            sample_name: None,
            subfolder: None,
            destination: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderAction {
    Copied,
    Planned,
    AlreadyProcessed,
    InProgress,
    Failed,
}

/// Everything the orchestrator reports while it works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Started {
        source: String,
        destination: String,
        dry_run: bool,
    },
    SourceMissing {
        source: String,
    },
    FolderFound {
        folder: String,
        metadata_file: String,
    },
    AlreadyProcessed {
        folder: String,
    },
    RunInProgress {
        folder: String,
    },
    SampleNameFound {
        raw: String,
    },
    GeneratedName {
        name: String,
        placeholder: bool,
    },
    Classified {
        initials: Option<String>,
        sample_name: String,
        subfolder: String,
    },
    Copied {
        subfolder: String,
        destination: String,
        collisions: u64,
    },
    Planned {
        subfolder: String,
        destination: String,
    },
    Failed {
        folder: String,
        error: String,
    },
    Finished {
        copied: usize,
        skipped: usize,
        failed: usize,
    },
}

pub trait EventSink {
    fn event(&self, event: RunEvent);
}

#[derive(Clone)]
pub struct App<C: Classifier> {
    config: ResolvedConfig,
    store: Store,
    classifier: C,
}

impl App<InitialsClassifier> {
    pub fn from_config(config: ResolvedConfig) -> Self {
        let store = Store::from_config(&config);
        let classifier = InitialsClassifier::from_config(&config);
        Self::new(config, store, classifier)
    }
}

impl<C: Classifier> App<C> {
    pub fn new(config: ResolvedConfig, store: Store, classifier: C) -> Self {
        Self {
            config,
            store,
            classifier,
        }
    }

    /// Checks the source root, then opens the ledger. A dry run never creates the ledger file.
    ///
    /// The source is checked first so a misconfigured run leaves nothing behind.
    pub fn open_ledger(
        &self,
        options: RunOptions,
        sink: &dyn EventSink,
    ) -> Result<Ledger, SorterError> {
        self.walker(sink)?;
        if options.dry_run {
            Ledger::open_read_only(&self.config.ledger_path)
        } else {
            Ledger::open(&self.config.ledger_path)
        }
    }

    /// Walks the source tree once and files every finished, not yet processed run.
    ///
    /// Only an unusable source root or destination root is fatal; anything going wrong with a
    /// single run folder is reported through `sink` and the walk carries on.
    pub fn run(
        &self,
        ledger: &mut Ledger,
        options: RunOptions,
        sink: &dyn EventSink,
    ) -> Result<RunResult, SorterError> {
        let started_at = timestamp();
        sink.event(RunEvent::Started {
            source: self.config.source.to_string(),
            destination: self.config.destination.to_string(),
            dry_run: options.dry_run,
        });

        let walker = self.walker(sink)?;

        if !options.dry_run {
            self.store.ensure_subfolders(self.config.subfolders())?;
        }

        let mut folders = Vec::new();
        let mut planned = HashSet::new();
        for entry in walker.iter() {
            let Some(folder) = self.candidate(&entry) else {
                continue;
            };
            folders.push(self.process_folder(&folder, ledger, &mut planned, options, sink));
        }

        let result = RunResult {
            started_at,
            finished_at: timestamp(),
            source: walker.root().to_string(),
            destination: self.config.destination.to_string(),
            dry_run: options.dry_run,
            folders,
        };
        sink.event(RunEvent::Finished {
            copied: result.count(FolderAction::Copied) + result.count(FolderAction::Planned),
            skipped: result.count(FolderAction::AlreadyProcessed)
                + result.count(FolderAction::InProgress),
            failed: result.count(FolderAction::Failed),
        });
        Ok(result)
    }

    fn walker(&self, sink: &dyn EventSink) -> Result<DepthWalker, SorterError> {
        DepthWalker::new(&self.config.source, self.config.search_depth).inspect_err(|_| {
            sink.event(RunEvent::SourceMissing {
                source: self.config.source.to_string(),
            });
        })
    }

    fn candidate(&self, entry: &WalkEntry) -> Option<RunFolder> {
        if entry.depth > self.config.search_depth {
            return None;
        }
        let metadata = entry.files.iter().find(|name| is_metadata_file(name))?;
        Some(RunFolder {
            path: entry.dir.clone(),
            metadata_file: entry.dir.join(metadata),
        })
    }

    fn process_folder(
        &self,
        folder: &RunFolder,
        ledger: &mut Ledger,
        planned: &mut HashSet<Utf8PathBuf>,
        options: RunOptions,
        sink: &dyn EventSink,
    ) -> FolderResult {
        let key = folder.ledger_key();
        sink.event(RunEvent::FolderFound {
            folder: key.to_string(),
            metadata_file: folder.metadata_file.to_string(),
        });

        if ledger.contains(key) {
            sink.event(RunEvent::AlreadyProcessed {
                folder: key.to_string(),
            });
            return FolderResult::skipped(folder, FolderAction::AlreadyProcessed);
        }
        if !folder.acquisition_complete() {
            sink.event(RunEvent::RunInProgress {
                folder: key.to_string(),
            });
            return FolderResult::skipped(folder, FolderAction::InProgress);
        }

        let classification = match self.identify(folder, sink) {
            Ok(classification) => classification,
            Err(err) => return self.failed(folder, None, err, sink),
        };

        if options.dry_run {
            let destination = self.store.planned_destination(
                &classification.subfolder,
                &classification.sample_name,
                planned,
            );
            planned.insert(destination.clone());
            sink.event(RunEvent::Planned {
                subfolder: classification.subfolder.clone(),
                destination: destination.to_string(),
            });
            return FolderResult {
                action: FolderAction::Planned,
                destination: Some(destination.to_string()),
                ..self.classified(folder, &classification)
            };
        }

        let outcome = match self.store.copy_run(
            &folder.path,
            &classification.subfolder,
            &classification.sample_name,
        ) {
            Ok(outcome) => outcome,
            Err(err) => return self.failed(folder, Some(&classification), err, sink),
        };
        sink.event(RunEvent::Copied {
            subfolder: classification.subfolder.clone(),
            destination: outcome.destination.to_string(),
            collisions: outcome.collisions,
        });

        let copied = FolderResult {
            action: FolderAction::Copied,
            destination: Some(outcome.destination.to_string()),
            ..self.classified(folder, &classification)
        };
        match ledger.record(key) {
            Ok(()) => copied,
            Err(err) => FolderResult {
                destination: copied.destination.clone(),
                ..self.failed(folder, Some(&classification), err, sink)
            },
        }
    }

    fn identify(
        &self,
        folder: &RunFolder,
        sink: &dyn EventSink,
    ) -> Result<Classification, SorterError> {
        let raw = extract::read_sample_name(&folder.metadata_file)?;
        sink.event(RunEvent::SampleNameFound { raw: raw.clone() });

        let name = SampleName::sanitize(&raw);
        sink.event(RunEvent::GeneratedName {
            name: name.to_string(),
            placeholder: name.is_placeholder(),
        });

        let classification = self.classifier.classify(&name);
        sink.event(RunEvent::Classified {
            initials: classification.initials.as_ref().map(ToString::to_string),
            sample_name: classification.sample_name.to_string(),
            subfolder: classification.subfolder.clone(),
        });
        Ok(classification)
    }

    fn classified(&self, folder: &RunFolder, classification: &Classification) -> FolderResult {
        FolderResult {
            folder: folder.ledger_key().to_string(),
            action: FolderAction::Copied,
            sample_name: Some(classification.sample_name.to_string()),
            subfolder: Some(classification.subfolder.clone()),
            destination: None,
            error: None,
        }
    }

    fn failed(
        &self,
        folder: &RunFolder,
        classification: Option<&Classification>,
        err: SorterError,
        sink: &dyn EventSink,
    ) -> FolderResult {
        sink.event(RunEvent::Failed {
            folder: folder.ledger_key().to_string(),
            error: err.to_string(),
        });
        let base = match classification {
            Some(classification) => self.classified(folder, classification),
            None => FolderResult::skipped(folder, FolderAction::Failed),
        };
        FolderResult {
            action: FolderAction::Failed,
            error: Some(err.to_string()),
            ..base
        }
    }
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
