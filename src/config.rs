use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::SorterError;

pub const DEFAULT_CONFIG_FILE: &str = "agilent-sorter.toml";
pub const DEFAULT_LEDGER_FILE: &str = "processed_folders.txt";
pub const DEFAULT_LOG_FILE: &str = "agilent-sorter.log";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub paths: PathsSection,
    pub initials: InitialsSection,
    pub parameters: ParametersSection,
    #[serde(default)]
    pub files: FilesSection,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathsSection {
    pub source_path: String,
    pub destination_path: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialsSection {
    pub initials_list: InitialsList,
    pub folder_no_initials: String,
}

/// Either the historical comma-separated string or a TOML array.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum InitialsList {
    Shorthand(String),
    Detailed(Vec<String>),
}

impl InitialsList {
    fn entries(self) -> Vec<String> {
        let raw: Vec<String> = match self {
            InitialsList::Shorthand(value) => value.split(',').map(str::to_string).collect(),
            InitialsList::Detailed(values) => values,
        };
        raw.into_iter()
            .map(|entry| entry.trim().to_string())
            .filter(|entry| !entry.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParametersSection {
    pub search_depth: usize,
    pub instrument_suffix: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FilesSection {
    #[serde(default)]
    pub ledger: Option<String>,
    #[serde(default)]
    pub log: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub source: Utf8PathBuf,
    pub destination: Utf8PathBuf,
    pub initials: Vec<String>,
    pub fallback_folder: String,
    pub search_depth: usize,
    pub instrument_suffix: String,
    pub ledger_path: Utf8PathBuf,
    pub log_path: Utf8PathBuf,
}

impl ResolvedConfig {
    /// Every destination subfolder, fallback last.
    pub fn subfolders(&self) -> impl Iterator<Item = &str> {
        self.initials
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.fallback_folder.as_str()))
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(source) = overrides.source {
            self.source = source;
        }
        if let Some(destination) = overrides.destination {
            self.destination = destination;
        }
        if let Some(depth) = overrides.search_depth {
            self.search_depth = depth;
        }
        if let Some(ledger) = overrides.ledger_path {
            self.ledger_path = ledger;
        }
        if let Some(log) = overrides.log_path {
            self.log_path = log;
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source: Option<Utf8PathBuf>,
    pub destination: Option<Utf8PathBuf>,
    pub search_depth: Option<usize>,
    pub ledger_path: Option<Utf8PathBuf>,
    pub log_path: Option<Utf8PathBuf>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, SorterError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Err(SorterError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| SorterError::ConfigRead(config_path.clone()))?;
        Self::resolve_str(&content)
    }

    pub fn resolve_str(content: &str) -> Result<ResolvedConfig, SorterError> {
        let config: Config =
            toml::from_str(content).map_err(|err| SorterError::ConfigParse(err.to_string()))?;
        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, SorterError> {
        let initials = config.initials.initials_list.entries();
        for entry in &initials {
            validate_folder_name("initials.initialsList", entry)?;
        }

        let fallback_folder = config.initials.folder_no_initials.trim().to_string();
        validate_folder_name("initials.folderNoInitials", &fallback_folder)?;

        if config.paths.source_path.trim().is_empty() {
            return Err(SorterError::InvalidConfig {
                key: "paths.sourcePath",
                message: "must not be empty".to_string(),
            });
        }
        if config.paths.destination_path.trim().is_empty() {
            return Err(SorterError::InvalidConfig {
                key: "paths.destinationPath",
                message: "must not be empty".to_string(),
            });
        }

        Ok(ResolvedConfig {
            source: Utf8PathBuf::from(config.paths.source_path.trim()),
            destination: Utf8PathBuf::from(config.paths.destination_path.trim()),
            initials,
            fallback_folder,
            search_depth: config.parameters.search_depth,
            instrument_suffix: config.parameters.instrument_suffix.trim().to_string(),
            ledger_path: Utf8PathBuf::from(
                config.files.ledger.as_deref().unwrap_or(DEFAULT_LEDGER_FILE),
            ),
            log_path: Utf8PathBuf::from(config.files.log.as_deref().unwrap_or(DEFAULT_LOG_FILE)),
        })
    }
}

fn validate_folder_name(key: &'static str, name: &str) -> Result<(), SorterError> {
    let message = if name.is_empty() {
        "folder name must not be empty"
    } else if name == "." || name == ".." {
        "folder name must not be a relative path component"
    } else if name.contains(['/', '\\']) {
        "folder name must not contain a path separator"
    } else {
        return Ok(());
    };
    Err(SorterError::InvalidConfig {
        key,
        message: format!("{message}: {name:?}"),
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_config_shorthand() {
        let resolved = ConfigLoader::resolve_str(
            r#"
            [paths]
            sourcePath = "/data/in"
            destinationPath = "/data/out"

            [initials]
            initialsList = "Xy, Ab ,,"
            folderNoInitials = "NoInitials"

            [parameters]
            searchDepth = 2
            instrumentSuffix = "ESI"
            "#,
        )
        .unwrap();

        assert_eq!(resolved.initials, vec!["Xy".to_string(), "Ab".to_string()]);
        assert_eq!(resolved.ledger_path, Utf8PathBuf::from(DEFAULT_LEDGER_FILE));
        assert_eq!(
            resolved.subfolders().collect::<Vec<_>>(),
            vec!["Xy", "Ab", "NoInitials"]
        );
    }

    #[test]
    fn reject_separator_in_subfolder() {
        let err = ConfigLoader::resolve_str(
            r#"
            [paths]
            sourcePath = "/data/in"
            destinationPath = "/data/out"

            [initials]
            initialsList = ["Xy", "../Ab"]
            folderNoInitials = "NoInitials"

            [parameters]
            searchDepth = 2
            instrumentSuffix = "ESI"
            "#,
        )
        .unwrap_err();
        assert_matches!(
            err,
            SorterError::InvalidConfig {
                key: "initials.initialsList",
                ..
            }
        );
    }
}
