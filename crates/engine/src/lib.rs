#![forbid(unsafe_code)]

pub mod error;
pub mod game;
pub mod recognizer;
pub mod reporter;
pub mod timer;

pub use parrot_core::Clock;

pub use error::{GameError, RecognizerError, ReporterError};
pub use game::{FinishedGame, GameHandle, GameRunner, GameSession, GameState, GameUpdate};
pub use recognizer::{RecognizerEvent, ScriptStep, ScriptedRecognizer, SpeechRecognizer};
pub use reporter::{HttpOutcomeReporter, OutcomeReporter, RecordingReporter, ReporterConfig};
pub use timer::{RoundClock, Stopwatch, TimerEvent};
