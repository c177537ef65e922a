use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::config::ResolvedConfig;
use crate::domain::{Initials, SampleName};

// 2-3 letters at the start, then a space and anything, or a digit directly.
static INITIALS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"^([a-zA-Z]{2,3})(?: .|\d)")
        .case_insensitive(true)
        .build()
        .expect("initials pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Sample name after initials normalization; this is what the copy is named after.
    pub sample_name: SampleName,
    pub initials: Option<Initials>,
    pub subfolder: String,
    pub fallback: bool,
}

/// Decides which destination subfolder a sample belongs to.
pub trait Classifier {
    fn classify(&self, name: &SampleName) -> Classification;
}

#[derive(Debug, Clone)]
pub struct InitialsClassifier {
    initials: Vec<String>,
    fallback_folder: String,
}

impl InitialsClassifier {
    pub fn new(initials: Vec<String>, fallback_folder: impl Into<String>) -> Self {
        Self {
            initials,
            fallback_folder: fallback_folder.into(),
        }
    }

    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new(config.initials.clone(), config.fallback_folder.clone())
    }

    fn matching_entry(&self, initials: &Initials) -> Option<&str> {
        let pattern = match RegexBuilder::new(initials.as_str())
            .case_insensitive(true)
            .build()
        {
            Ok(pattern) => pattern,
            Err(err) => {
                tracing::warn!(%initials, error = %err, "initials are not a usable pattern");
                return None;
            }
        };
        self.initials
            .iter()
            .find(|entry| pattern.is_match(entry))
            .map(String::as_str)
    }

    fn fallback(&self, sample_name: SampleName, initials: Option<Initials>) -> Classification {
        Classification {
            sample_name,
            initials,
            subfolder: self.fallback_folder.clone(),
            fallback: true,
        }
    }
}

impl Classifier for InitialsClassifier {
    fn classify(&self, name: &SampleName) -> Classification {
        let Some(initials) = detect_initials(name) else {
            return self.fallback(name.clone(), None);
        };
        let sample_name = normalize_initials(name, &initials);

        match self.matching_entry(&initials) {
            Some(entry) => Classification {
                sample_name,
                initials: Some(initials),
                subfolder: entry.to_string(),
                fallback: false,
            },
            None => self.fallback(sample_name, Some(initials)),
        }
    }
}

pub fn detect_initials(name: &SampleName) -> Option<Initials> {
    INITIALS_PATTERN
        .captures(name.as_str())
        .and_then(|caps| caps.get(1))
        .map(|m| Initials::new(m.as_str()))
}

/// Rewrites the name as `"<initials> <rest>"`, whatever spacing it had before.
///
/// The initials are matched literally, so they never need to be a valid pattern.
pub fn normalize_initials(name: &SampleName, initials: &Initials) -> SampleName {
    let literal = RegexBuilder::new(&regex::escape(initials.as_str()))
        .case_insensitive(true)
        .build()
        .expect("escaped initials are a valid pattern");
    let rest = literal.replacen(name.as_str(), 1, "");
    SampleName::with_initials(initials, &rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> InitialsClassifier {
        InitialsClassifier::new(vec!["Xy".to_string(), "Ab".to_string()], "NoInitials")
    }

    fn initials_of(raw: &str) -> Option<String> {
        detect_initials(&SampleName::sanitize(raw)).map(|i| i.as_str().to_string())
    }

    #[test]
    fn detects_initials_followed_by_space_or_digit() {
        assert_eq!(initials_of("xy Sample One").as_deref(), Some("xy"));
        assert_eq!(initials_of("ABC12").as_deref(), Some("ABC"));
        assert_eq!(initials_of("Ab1234").as_deref(), Some("Ab"));
        assert_eq!(initials_of("Sample Two"), None);
        assert_eq!(initials_of("ABcd1 Sample"), None);
        assert_eq!(initials_of("x 1"), None);
    }

    #[test]
    fn normalizes_spacing() {
        let name = SampleName::sanitize("xy1234 run");
        let initials = detect_initials(&name).unwrap();
        assert_eq!(normalize_initials(&name, &initials).as_str(), "xy 1234 run");

        let spaced = SampleName::sanitize("Ab   blank");
        let initials = detect_initials(&spaced).unwrap();
        assert_eq!(normalize_initials(&spaced, &initials).as_str(), "Ab blank");
    }

    #[test]
    fn routes_known_initials_case_insensitively() {
        let result = classifier().classify(&SampleName::sanitize("xy Sample One"));
        assert_eq!(result.subfolder, "Xy");
        assert!(!result.fallback);
        assert_eq!(result.sample_name.as_str(), "xy Sample One");
    }

    #[test]
    fn routes_missing_initials_to_fallback() {
        let result = classifier().classify(&SampleName::sanitize("Sample Two"));
        assert_eq!(result.subfolder, "NoInitials");
        assert!(result.fallback);
        assert_eq!(result.initials, None);
        assert_eq!(result.sample_name.as_str(), "Sample Two");
    }

    #[test]
    fn unusable_initials_pattern_is_no_match() {
        let classifier = classifier();
        assert_eq!(classifier.matching_entry(&Initials::new("(")), None);
        assert_eq!(classifier.matching_entry(&Initials::new("[x")), None);
        assert_eq!(classifier.matching_entry(&Initials::new("XY")), Some("Xy"));
    }

    #[test]
    fn odd_list_entries_do_not_break_matching() {
        let classifier =
            InitialsClassifier::new(vec!["(".to_string(), "Xy".to_string()], "NoInitials");
        let result = classifier.classify(&SampleName::sanitize("xy 1 run"));
        assert_eq!(result.subfolder, "Xy");
        assert_eq!(classifier.matching_entry(&Initials::new("(")), None);
    }

    #[test]
    fn routes_unknown_initials_to_fallback() {
        let result = classifier().classify(&SampleName::sanitize("QQ 17"));
        assert_eq!(result.subfolder, "NoInitials");
        assert_eq!(result.initials.as_ref().map(Initials::as_str), Some("QQ"));
        assert_eq!(result.sample_name.as_str(), "QQ 17");
    }
}
