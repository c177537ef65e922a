use std::io::{self, Write};

use serde::Serialize;

use crate::app::{EventSink, FolderAction, RunEvent, RunResult};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_run(result: &RunResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct HumanOutput;

impl HumanOutput {
    pub fn print_run(result: &RunResult) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        let verb = if result.dry_run { "would copy" } else { "copied" };
        writeln!(
            stdout,
            "{verb} {}, already processed {}, in progress {}, failed {}",
            result.count(FolderAction::Copied) + result.count(FolderAction::Planned),
            result.count(FolderAction::AlreadyProcessed),
            result.count(FolderAction::InProgress),
            result.count(FolderAction::Failed),
        )?;
        for folder in &result.folders {
            if let Some(destination) = &folder.destination {
                writeln!(stdout, "  {} -> {destination}", folder.folder)?;
            }
            if let Some(error) = &folder.error {
                writeln!(stdout, "  {} failed: {error}", folder.folder)?;
            }
        }
        Ok(())
    }
}

/// Forwards run events to `tracing`, which the binary routes to stderr and the log file.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn event(&self, event: RunEvent) {
        match event {
            RunEvent::Started {
                source,
                destination,
                dry_run,
            } => tracing::info!(%source, %destination, dry_run, "program started"),
            RunEvent::SourceMissing { source } => {
                tracing::error!("the source path {source} does not exist")
            }
            RunEvent::FolderFound {
                folder,
                metadata_file,
            } => tracing::info!(%metadata_file, "found folder: {folder}"),
            RunEvent::AlreadyProcessed { folder } => {
                tracing::info!("found folder: {folder}. already processed, skipping")
            }
            RunEvent::RunInProgress { folder } => {
                tracing::info!("found folder: {folder}. run in progress, skipping")
            }
            RunEvent::SampleNameFound { raw } => {
                tracing::info!("found sample name: {}", raw.replace('\0', ""))
            }
            RunEvent::GeneratedName { name, placeholder } => {
                if placeholder {
                    tracing::info!("this would generate a blank folder name, renamed to: {name}")
                } else {
                    tracing::info!("generated new folder name: {name}")
                }
            }
            RunEvent::Classified {
                initials,
                sample_name,
                subfolder,
            } => {
                match initials {
                    Some(initials) => tracing::info!("found initials: {initials}"),
                    None => tracing::info!("no valid initials found in sample name: {sample_name}"),
                }
                tracing::info!("run will be saved in subfolder: {subfolder}");
            }
            RunEvent::Copied {
                subfolder,
                destination,
                collisions,
            } => tracing::info!(collisions, "saved in subfolder {subfolder} as {destination}"),
            RunEvent::Planned {
                subfolder,
                destination,
            } => tracing::info!("dry run: would save in subfolder {subfolder} as {destination}"),
            RunEvent::Failed { folder, error } => {
                tracing::warn!(%error, "failed to process folder {folder}")
            }
            RunEvent::Finished {
                copied,
                skipped,
                failed,
            } => tracing::info!(copied, skipped, failed, "program finished"),
        }
    }
}
