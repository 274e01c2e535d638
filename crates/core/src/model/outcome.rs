use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OutcomeError {
    #[error("correct count {correct} exceeds total phrase count {total}")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("an outcome needs at least one phrase")]
    NoPhrases,
}

/// Result of a finished play-through.
///
/// The elapsed time is sampled once, at the moment the game terminates,
/// from the monotonic session stopwatch.
#[derive(Debug, Clone, PartialEq)]
pub struct GameOutcome {
    elapsed: Duration,
    correct_count: u32,
    total_phrases: u32,
    finished_at: DateTime<Utc>,
}

impl GameOutcome {
    /// Builds an outcome from the raw tallies.
    ///
    /// # Errors
    ///
    /// Returns an error when `total_phrases` is zero or when
    /// `correct_count` exceeds it.
    pub fn from_parts(
        elapsed: Duration,
        correct_count: u32,
        total_phrases: u32,
        finished_at: DateTime<Utc>,
    ) -> Result<Self, OutcomeError> {
        if total_phrases == 0 {
            return Err(OutcomeError::NoPhrases);
        }
        if correct_count > total_phrases {
            return Err(OutcomeError::CorrectExceedsTotal {
                correct: correct_count,
                total: total_phrases,
            });
        }

        Ok(Self {
            elapsed,
            correct_count,
            total_phrases,
            finished_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_phrases(&self) -> u32 {
        self.total_phrases
    }

    #[must_use]
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    #[must_use]
    pub fn all_correct(&self) -> bool {
        self.correct_count == self.total_phrases
    }

    /// Share of phrases pronounced correctly, in percent.
    #[must_use]
    pub fn score_percent(&self) -> f64 {
        f64::from(self.correct_count) / f64::from(self.total_phrases) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{fixed_clock, fixed_now};

    #[test]
    fn outcome_from_parts() {
        let clock = fixed_clock();
        let outcome =
            GameOutcome::from_parts(Duration::from_secs(42), 3, 4, clock.now()).unwrap();

        assert_eq!(outcome.elapsed(), Duration::from_secs(42));
        assert_eq!(outcome.correct_count(), 3);
        assert_eq!(outcome.total_phrases(), 4);
        assert_eq!(outcome.finished_at(), clock.now());
        assert!(!outcome.all_correct());
        assert!((outcome.score_percent() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn outcome_rejects_empty_lesson() {
        let err = GameOutcome::from_parts(Duration::ZERO, 0, 0, fixed_now()).unwrap_err();
        assert_eq!(err, OutcomeError::NoPhrases);
    }

    #[test]
    fn outcome_rejects_impossible_tally() {
        let err = GameOutcome::from_parts(Duration::ZERO, 5, 4, fixed_now()).unwrap_err();
        assert_eq!(
            err,
            OutcomeError::CorrectExceedsTotal {
                correct: 5,
                total: 4
            }
        );
    }

    #[test]
    fn outcome_all_correct_wins_full_score() {
        let mut clock = fixed_clock();
        clock.advance(chrono::Duration::seconds(90));

        let outcome =
            GameOutcome::from_parts(Duration::from_secs(90), 2, 2, clock.now()).unwrap();
        assert!(outcome.all_correct());
        assert!((outcome.score_percent() - 100.0).abs() < f64::EPSILON);
    }
}
