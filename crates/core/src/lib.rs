#![forbid(unsafe_code)]

pub mod model;
pub mod text;
pub mod threshold;
pub mod time;

pub use time::Clock;

pub use model::{
    GameOutcome, GameSettings, LanguageTag, Lesson, LessonDraft, LessonId, Phrase, PhraseDraft,
};
pub use threshold::ThresholdPolicy;
