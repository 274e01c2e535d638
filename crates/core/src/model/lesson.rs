use serde::Deserialize;
use thiserror::Error;

use crate::model::ids::LessonId;
use crate::model::language::{LanguageError, LanguageTag};
use crate::model::phrase::{Phrase, PhraseDraft, PhraseError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("lesson must contain at least one phrase")]
    NoPhrases,

    #[error("duplicate phrase order {0}")]
    DuplicateOrder(u32),

    #[error(transparent)]
    Phrase(#[from] PhraseError),

    #[error(transparent)]
    Language(#[from] LanguageError),
}

/// An ordered, immutable sequence of phrases to speak through.
///
/// The `id` is carried along for outcome reporting; the target language
/// drives threshold tuning, the native language only translation lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    id: LessonId,
    title: String,
    target_language: LanguageTag,
    native_language: LanguageTag,
    phrases: Vec<Phrase>,
}

impl Lesson {
    /// Creates a lesson, sorting phrases by their `order` value.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTitle` for a blank title,
    /// `LessonError::NoPhrases` for an empty phrase list, and
    /// `LessonError::DuplicateOrder` when two phrases share an order value.
    pub fn new(
        id: LessonId,
        title: impl Into<String>,
        target_language: LanguageTag,
        native_language: LanguageTag,
        mut phrases: Vec<Phrase>,
    ) -> Result<Self, LessonError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        if phrases.is_empty() {
            return Err(LessonError::NoPhrases);
        }

        phrases.sort_by_key(Phrase::order);
        for pair in phrases.windows(2) {
            if pair[0].order() == pair[1].order() {
                return Err(LessonError::DuplicateOrder(pair[0].order()));
            }
        }

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            target_language,
            native_language,
            phrases,
        })
    }

    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn target_language(&self) -> &LanguageTag {
        &self.target_language
    }

    #[must_use]
    pub fn native_language(&self) -> &LanguageTag {
        &self.native_language
    }

    /// Number of phrases in the lesson.
    #[must_use]
    pub fn phrase_count(&self) -> usize {
        self.phrases.len()
    }

    /// Phrase at the given position, in lesson order.
    #[must_use]
    pub fn phrase(&self, index: usize) -> Option<&Phrase> {
        self.phrases.get(index)
    }

    #[must_use]
    pub fn phrases(&self) -> &[Phrase] {
        &self.phrases
    }
}

/// Unvalidated lesson content, as delivered by the content service.
#[derive(Debug, Clone, Deserialize)]
pub struct LessonDraft {
    pub id: u64,
    pub title: String,
    pub target_language: String,
    pub native_language: String,
    pub phrases: Vec<PhraseDraft>,
}

impl LessonDraft {
    /// Validate the draft into a `Lesson`.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` if the language tags, phrases, or the lesson
    /// shape itself fail validation.
    pub fn validate(self) -> Result<Lesson, LessonError> {
        let target_language = LanguageTag::new(self.target_language)?;
        let native_language = LanguageTag::new(self.native_language)?;
        let phrases = self
            .phrases
            .into_iter()
            .map(PhraseDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Lesson::new(
            LessonId::new(self.id),
            self.title,
            target_language,
            native_language,
            phrases,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn phrase(order: u32, text: &str) -> Phrase {
        Phrase::new(order, text, HashMap::new()).unwrap()
    }

    fn tag(code: &str) -> LanguageTag {
        LanguageTag::new(code).unwrap()
    }

    fn build_lesson(phrases: Vec<Phrase>) -> Result<Lesson, LessonError> {
        Lesson::new(LessonId::new(1), "Greetings", tag("de"), tag("en"), phrases)
    }

    #[test]
    fn lesson_rejects_empty_phrase_list() {
        let err = build_lesson(Vec::new()).unwrap_err();
        assert_eq!(err, LessonError::NoPhrases);
    }

    #[test]
    fn lesson_rejects_blank_title() {
        let err = Lesson::new(
            LessonId::new(1),
            "  ",
            tag("de"),
            tag("en"),
            vec![phrase(0, "Hallo")],
        )
        .unwrap_err();
        assert_eq!(err, LessonError::EmptyTitle);
    }

    #[test]
    fn lesson_sorts_phrases_by_order() {
        let lesson = build_lesson(vec![phrase(2, "Danke"), phrase(0, "Hallo"), phrase(1, "Bitte")])
            .unwrap();

        assert_eq!(lesson.phrase_count(), 3);
        assert_eq!(lesson.phrase(0).unwrap().text(), "Hallo");
        assert_eq!(lesson.phrase(1).unwrap().text(), "Bitte");
        assert_eq!(lesson.phrase(2).unwrap().text(), "Danke");
        assert!(lesson.phrase(3).is_none());
    }

    #[test]
    fn lesson_rejects_duplicate_order() {
        let err = build_lesson(vec![phrase(0, "Hallo"), phrase(0, "Danke")]).unwrap_err();
        assert_eq!(err, LessonError::DuplicateOrder(0));
    }

    #[test]
    fn draft_validates_into_lesson() {
        let draft = LessonDraft {
            id: 9,
            title: "Basics".to_string(),
            target_language: "DE".to_string(),
            native_language: "en".to_string(),
            phrases: vec![PhraseDraft {
                order: 0,
                text: "Hallo".to_string(),
                translations: HashMap::new(),
            }],
        };

        let lesson = draft.validate().unwrap();
        assert_eq!(lesson.id(), LessonId::new(9));
        assert_eq!(lesson.target_language().as_str(), "de");
        assert_eq!(lesson.phrase_count(), 1);
    }

    #[test]
    fn draft_propagates_phrase_errors() {
        let draft = LessonDraft {
            id: 1,
            title: "Basics".to_string(),
            target_language: "de".to_string(),
            native_language: "en".to_string(),
            phrases: vec![PhraseDraft {
                order: 0,
                text: "  ".to_string(),
                translations: HashMap::new(),
            }],
        };

        assert!(matches!(
            draft.validate().unwrap_err(),
            LessonError::Phrase(PhraseError::EmptyText)
        ));
    }
}
