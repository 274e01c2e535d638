mod ids;
mod language;
mod lesson;
mod outcome;
mod phrase;
mod settings;

pub use ids::{LessonId, ParseIdError};
pub use language::{LanguageError, LanguageTag};
pub use lesson::{Lesson, LessonDraft, LessonError};
pub use outcome::{GameOutcome, OutcomeError};
pub use phrase::{Phrase, PhraseDraft, PhraseError};
pub use settings::{GameSettings, SettingsError};
