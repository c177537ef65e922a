use std::fmt;

use camino::Utf8PathBuf;
use serde::Serialize;

/// File name suffix (matched case-insensitively) of the detector file carrying the sample name.
pub const METADATA_FILE_SUFFIX: &str = "dad1.uv";

/// Written by the instrument once acquisition has finished.
pub const ACQUISITION_MARKER: &str = "ACQRES.REG";

pub const MAX_SAMPLE_NAME_CHARS: usize = 30;
pub const UNNAMED_SAMPLE: &str = "unnamed";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SampleName(String);

impl SampleName {
    /// Turns the raw text decoded from the metadata file into a folder-safe name.
    ///
    /// The result is never empty, holds at most [`MAX_SAMPLE_NAME_CHARS`] characters and only
    /// contains letters, digits, `_`, `-`, `.` and whitespace. Applying it twice changes nothing.
    pub fn sanitize(raw: &str) -> Self {
        let without_nulls = raw.replace('\0', "");
        let substituted = without_nulls
            .trim()
            .replace('+', "plus")
            .replace('=', "eq")
            .replace('°', "deg");
        let truncated: String = substituted
            .chars()
            .filter(|&ch| is_allowed_char(ch))
            .take(MAX_SAMPLE_NAME_CHARS)
            .collect();
        let trimmed = truncated.trim();

        if trimmed.is_empty() {
            Self(UNNAMED_SAMPLE.to_string())
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Builds `"<initials> <rest>"` from an already sanitized remainder.
    pub(crate) fn with_initials(initials: &Initials, rest: &str) -> Self {
        Self(format!("{} {}", initials.as_str(), rest.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_placeholder(&self) -> bool {
        self.0 == UNNAMED_SAMPLE
    }
}

impl fmt::Display for SampleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The 2-3 letter routing prefix, kept exactly as it appeared in the sample name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Initials(String);

impl Initials {
    pub(crate) fn new(value: &str) -> Self {
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Initials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One acquisition directory discovered under the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFolder {
    pub path: Utf8PathBuf,
    pub metadata_file: Utf8PathBuf,
}

impl RunFolder {
    pub fn acquisition_complete(&self) -> bool {
        self.path.join(ACQUISITION_MARKER).is_file()
    }

    /// Key under which the folder is recorded in the ledger.
    pub fn ledger_key(&self) -> &str {
        self.path.as_str()
    }
}

/// Letters and digits of any script, whitespace, `_`, `-` and `.`.
pub fn is_allowed_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch.is_whitespace() || matches!(ch, '_' | '-' | '.')
}

pub fn is_metadata_file(file_name: &str) -> bool {
    file_name.to_lowercase().ends_with(METADATA_FILE_SUFFIX)
}

/// `<sample> <suffix>.d`, or `<sample>-<n> <suffix>.d` for the n-th collision.
pub fn run_folder_name(sample: &SampleName, suffix: &str, copy_number: u64) -> String {
    if copy_number == 0 {
        format!("{sample} {suffix}.d")
    } else {
        format!("{sample}-{copy_number} {suffix}.d")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_substitutes_before_filtering() {
        let name = SampleName::sanitize("\0\0 a+b=c 40°C \0");
        assert_eq!(name.as_str(), "aplusbeqc 40degC");
    }

    #[test]
    fn sanitize_truncates_to_thirty_chars() {
        let name = SampleName::sanitize(&"x".repeat(50));
        assert_eq!(name.as_str().chars().count(), MAX_SAMPLE_NAME_CHARS);
    }

    #[test]
    fn sanitize_falls_back_to_placeholder() {
        assert_eq!(SampleName::sanitize("").as_str(), UNNAMED_SAMPLE);
        assert_eq!(SampleName::sanitize("***").as_str(), UNNAMED_SAMPLE);
        assert!(SampleName::sanitize("\0\0  \0").is_placeholder());
    }

    #[test]
    fn sanitize_keeps_numeric_symbols_and_drops_marks() {
        assert_eq!(SampleName::sanitize("xy 5 m² ½ conc").as_str(), "xy 5 m² ½ conc");
        assert_eq!(SampleName::sanitize("a\u{203F}b").as_str(), "ab");
        assert_eq!(SampleName::sanitize("e\u{301}x").as_str(), "ex");
    }

    #[test]
    fn metadata_file_match_is_case_insensitive() {
        assert!(is_metadata_file("DAD1.UV"));
        assert!(is_metadata_file("dad1.uv"));
        assert!(!is_metadata_file("dad1.uv.bak"));
    }

    #[test]
    fn folder_name_numbering() {
        let sample = SampleName::sanitize("Foo");
        assert_eq!(run_folder_name(&sample, "ESI", 0), "Foo ESI.d");
        assert_eq!(run_folder_name(&sample, "ESI", 2), "Foo-2 ESI.d");
    }
}
