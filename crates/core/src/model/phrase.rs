use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use crate::model::language::{LanguageError, LanguageTag};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PhraseError {
    #[error("phrase text cannot be empty")]
    EmptyText,

    #[error(transparent)]
    Language(#[from] LanguageError),
}

/// A single target phrase within a lesson.
///
/// Supplied as lesson content and never mutated by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Phrase {
    order: u32,
    text: String,
    translations: HashMap<LanguageTag, String>,
}

impl Phrase {
    /// Creates a phrase with validated text.
    ///
    /// # Errors
    ///
    /// Returns `PhraseError::EmptyText` if the text is empty or whitespace-only.
    pub fn new(
        order: u32,
        text: impl Into<String>,
        translations: HashMap<LanguageTag, String>,
    ) -> Result<Self, PhraseError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(PhraseError::EmptyText);
        }

        Ok(Self {
            order,
            text: text.trim().to_owned(),
            translations,
        })
    }

    /// Position of this phrase within its lesson.
    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    /// The text the learner is asked to pronounce.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Translation of this phrase into the given language, when provided.
    #[must_use]
    pub fn translation(&self, language: &LanguageTag) -> Option<&str> {
        self.translations.get(language).map(String::as_str)
    }
}

/// Unvalidated phrase as it appears in lesson content.
#[derive(Debug, Clone, Deserialize)]
pub struct PhraseDraft {
    pub order: u32,
    pub text: String,
    #[serde(default)]
    pub translations: HashMap<String, String>,
}

impl PhraseDraft {
    /// Validate the draft into a `Phrase`.
    ///
    /// # Errors
    ///
    /// Returns `PhraseError::EmptyText` for blank text, or a wrapped
    /// `LanguageError` when a translation key is not a valid language tag.
    pub fn validate(self) -> Result<Phrase, PhraseError> {
        let mut translations = HashMap::with_capacity(self.translations.len());
        for (tag, value) in self.translations {
            translations.insert(LanguageTag::new(tag)?, value);
        }
        Phrase::new(self.order, self.text, translations)
    }
}
