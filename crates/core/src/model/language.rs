use thiserror::Error;

/// Validated language code ("de", "en-us"), stored lowercase.
///
/// Used as the key for translation lookups and for per-language threshold
/// tuning, so it needs `Eq + Hash + Ord`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageTag(String);

impl LanguageTag {
    /// Create a validated language tag.
    ///
    /// # Errors
    ///
    /// Returns `LanguageError::Empty` if the tag is empty after trimming,
    /// or `LanguageError::Malformed` if it contains inner whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, LanguageError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LanguageError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(LanguageError::Malformed(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LanguageError {
    #[error("language tag cannot be empty")]
    Empty,

    #[error("language tag cannot contain whitespace: {0:?}")]
    Malformed(String),
}
