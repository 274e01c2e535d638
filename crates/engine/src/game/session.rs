use parrot_core::ThresholdPolicy;
use parrot_core::model::{GameSettings, Lesson};
use parrot_core::text::{match_score, normalize};

use crate::error::GameError;
use crate::game::round::Round;

/// Lifecycle of one play-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Idle,
    Playing,
    Won,
    Lost,
}

impl GameState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, GameState::Won | GameState::Lost)
    }
}

/// Instruction to start a fresh countdown for the phrase at `phrase_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSpawn {
    pub phrase_index: usize,
    pub seq: u64,
}

/// What one recognizer result or timeout did to the game.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Nothing to judge: stale round, gated partial, or empty speech.
    Ignored,
    /// The attempt did not reach the acceptance threshold.
    Rejected { similarity: f64 },
    /// The current phrase passed. `next` is `None` when this won the game.
    Advanced {
        resolved_index: usize,
        similarity: f64,
        next: Option<RoundSpawn>,
    },
    /// The current round timed out. `next` is `None` when the game is over.
    LifeLost {
        failed_index: usize,
        lives_left: u32,
        next: Option<RoundSpawn>,
    },
}

/// The game state machine: recognizer results and timeouts go in, state
/// transitions come out.
///
/// Purely synchronous. All timing, I/O, and event ordering live in
/// `GameRunner`, which owns the session and feeds it one event at a time,
/// so no two transitions ever interleave.
#[derive(Debug, Clone)]
pub struct GameSession {
    lesson: Lesson,
    settings: GameSettings,
    thresholds: ThresholdPolicy,
    state: GameState,
    lives: u32,
    correct_indices: Vec<usize>,
    failed_indices: Vec<usize>,
    round: Option<Round>,
    next_seq: u64,
    // Cumulative-transcript bookkeeping: characters settled by resolved
    // rounds, and the longest transcript observed so far.
    transcript_settled: usize,
    last_seen_len: usize,
}

impl GameSession {
    #[must_use]
    pub fn new(lesson: Lesson, settings: GameSettings, thresholds: ThresholdPolicy) -> Self {
        let lives = settings.lives();
        Self {
            lesson,
            settings,
            thresholds,
            state: GameState::Idle,
            lives,
            correct_indices: Vec::new(),
            failed_indices: Vec::new(),
            round: None,
            next_seq: 0,
            transcript_settled: 0,
            last_seen_len: 0,
        }
    }

    /// Moves from `Idle` to `Playing` and spawns the first round.
    ///
    /// # Errors
    ///
    /// Returns `GameError::AlreadyStarted` unless the session is `Idle`.
    pub fn begin(&mut self) -> Result<RoundSpawn, GameError> {
        if self.state != GameState::Idle {
            return Err(GameError::AlreadyStarted);
        }
        self.state = GameState::Playing;
        Ok(self.spawn_round(0))
    }

    /// Judges one cumulative transcript against the current round's phrase.
    pub fn judge_transcript(&mut self, transcript: &str, is_final: bool) -> StepOutcome {
        if self.state != GameState::Playing {
            return StepOutcome::Ignored;
        }

        let total_chars = transcript.chars().count();
        self.last_seen_len = self.last_seen_len.max(total_chars);

        let Some((offset, phrase_index)) = self
            .round
            .as_ref()
            .filter(|round| !round.is_resolved())
            .map(|round| (round.transcript_offset(), round.phrase_index()))
        else {
            return StepOutcome::Ignored;
        };

        if !is_final && !self.settings.match_partials() {
            return StepOutcome::Ignored;
        }

        // Only speech after the settled prefix counts for this round.
        let relevant = slice_from_chars(transcript, offset);
        if normalize(relevant).is_empty() {
            return StepOutcome::Ignored;
        }

        let target = match self.lesson.phrase(phrase_index) {
            Some(phrase) => phrase.text(),
            None => return StepOutcome::Ignored,
        };
        let score = match_score(relevant, target);
        let threshold = self
            .thresholds
            .acceptance_threshold(target, self.lesson.target_language());
        if score < threshold {
            return StepOutcome::Rejected { similarity: score };
        }

        if !self.round.as_mut().is_some_and(Round::resolve) {
            return StepOutcome::Ignored;
        }

        self.transcript_settled = total_chars;
        self.correct_indices.push(phrase_index);
        self.round = None;

        let next_index = phrase_index + 1;
        let next = if next_index == self.lesson.phrase_count() {
            self.state = GameState::Won;
            None
        } else {
            Some(self.spawn_round(next_index))
        };

        StepOutcome::Advanced {
            resolved_index: phrase_index,
            similarity: score,
            next,
        }
    }

    /// Applies a round timeout, identified by the clock's sequence number so
    /// a tick from an already-resolved round cannot fail the wrong one.
    pub fn timeout_round(&mut self, seq: u64) -> StepOutcome {
        if self.state != GameState::Playing {
            return StepOutcome::Ignored;
        }
        let failed_index = match &mut self.round {
            Some(round) if round.seq() == seq && !round.is_resolved() => {
                round.resolve();
                round.phrase_index()
            }
            _ => return StepOutcome::Ignored,
        };

        // Speech heard during the failed round never carries over.
        self.transcript_settled = self.transcript_settled.max(self.last_seen_len);
        self.failed_indices.push(failed_index);
        self.lives -= 1;
        self.round = None;
        log::debug!(
            "phrase {} timed out, {} lives left",
            failed_index,
            self.lives
        );

        let next = if self.lives == 0 {
            self.state = GameState::Lost;
            None
        } else {
            let next_index = failed_index + 1;
            if next_index == self.lesson.phrase_count() {
                // Out of phrases, not out of lives.
                self.state = GameState::Won;
                None
            } else {
                Some(self.spawn_round(next_index))
            }
        };

        StepOutcome::LifeLost {
            failed_index,
            lives_left: self.lives,
            next,
        }
    }

    /// Rebases transcript bookkeeping after the recognizer restarted from an
    /// empty transcript. Round and score state are untouched.
    pub fn recognizer_reopened(&mut self) {
        self.transcript_settled = 0;
        self.last_seen_len = 0;
        if let Some(round) = &mut self.round {
            round.rebase(0);
        }
    }

    /// Manual stop. Finalizes as `Lost` without awarding the open round.
    /// Returns `false` when the game had already ended.
    pub fn abort(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        if let Some(round) = &mut self.round {
            round.resolve();
        }
        self.round = None;
        self.state = GameState::Lost;
        true
    }

    // Accessors
    #[must_use]
    pub fn state(&self) -> GameState {
        self.state
    }

    #[must_use]
    pub fn lives(&self) -> u32 {
        self.lives
    }

    #[must_use]
    pub fn correct_indices(&self) -> &[usize] {
        &self.correct_indices
    }

    #[must_use]
    pub fn failed_indices(&self) -> &[usize] {
        &self.failed_indices
    }

    #[must_use]
    pub fn current_round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    #[must_use]
    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        u32::try_from(self.correct_indices.len()).unwrap_or(u32::MAX)
    }

    fn spawn_round(&mut self, phrase_index: usize) -> RoundSpawn {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.round = Some(Round::spawn(phrase_index, self.transcript_settled, seq));
        log::debug!("round {} starting for phrase {}", seq, phrase_index);
        RoundSpawn { phrase_index, seq }
    }
}

/// Slice of `text` starting at a character (not byte) offset. An offset past
/// the end yields the empty string.
fn slice_from_chars(text: &str, offset_chars: usize) -> &str {
    if offset_chars == 0 {
        return text;
    }
    match text.char_indices().nth(offset_chars) {
        Some((byte_index, _)) => &text[byte_index..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use parrot_core::model::{LanguageTag, LessonId, Phrase};

    fn build_lesson(texts: &[&str]) -> Lesson {
        let phrases = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                Phrase::new(u32::try_from(i).unwrap(), *text, HashMap::new()).unwrap()
            })
            .collect();
        Lesson::new(
            LessonId::new(7),
            "Greetings",
            LanguageTag::new("de").unwrap(),
            LanguageTag::new("en").unwrap(),
            phrases,
        )
        .unwrap()
    }

    fn playing_session(texts: &[&str]) -> (GameSession, RoundSpawn) {
        let mut session = GameSession::new(
            build_lesson(texts),
            GameSettings::default_challenge(),
            ThresholdPolicy::new(),
        );
        let spawn = session.begin().unwrap();
        (session, spawn)
    }

    #[test]
    fn begin_spawns_the_first_round() {
        let (session, spawn) = playing_session(&["Hallo", "Danke"]);

        assert_eq!(session.state(), GameState::Playing);
        assert_eq!(session.lives(), 3);
        assert_eq!(spawn.phrase_index, 0);

        let round = session.current_round().unwrap();
        assert_eq!(round.phrase_index(), 0);
        assert_eq!(round.transcript_offset(), 0);
    }

    #[test]
    fn begin_twice_fails() {
        let (mut session, _) = playing_session(&["Hallo"]);
        assert!(matches!(session.begin(), Err(GameError::AlreadyStarted)));
    }

    #[test]
    fn matching_result_advances_to_the_next_phrase() {
        let (mut session, _) = playing_session(&["Hallo", "Danke"]);

        let outcome = session.judge_transcript("hallo", true);
        let StepOutcome::Advanced {
            resolved_index,
            similarity,
            next,
        } = outcome
        else {
            panic!("expected Advanced, got {outcome:?}");
        };

        assert_eq!(resolved_index, 0);
        assert!((similarity - 1.0).abs() < f64::EPSILON);
        assert_eq!(next.unwrap().phrase_index, 1);
        assert_eq!(session.correct_indices(), [0]);
        assert_eq!(session.state(), GameState::Playing);
    }

    #[test]
    fn filler_around_the_phrase_still_passes() {
        let (mut session, _) = playing_session(&["Hallo", "Danke"]);

        let outcome = session.judge_transcript("uh hallo there", true);
        assert!(matches!(
            outcome,
            StepOutcome::Advanced {
                resolved_index: 0,
                ..
            }
        ));
    }

    #[test]
    fn poor_match_is_rejected() {
        let (mut session, _) = playing_session(&["Hallo", "Danke"]);

        let outcome = session.judge_transcript("completely wrong words", true);
        let StepOutcome::Rejected { similarity } = outcome else {
            panic!("expected Rejected, got {outcome:?}");
        };

        assert!(similarity < 0.80);
        assert!(!session.current_round().unwrap().is_resolved());
        assert!(session.correct_indices().is_empty());
    }

    #[test]
    fn winning_the_last_phrase_wins_the_game() {
        let (mut session, _) = playing_session(&["Hallo"]);

        let outcome = session.judge_transcript("hallo", true);
        let StepOutcome::Advanced { next, .. } = outcome else {
            panic!("expected Advanced, got {outcome:?}");
        };

        assert!(next.is_none());
        assert_eq!(session.state(), GameState::Won);
        assert!(session.current_round().is_none());
    }

    #[test]
    fn stale_timeout_after_success_is_ignored() {
        let (mut session, spawn) = playing_session(&["Hallo", "Danke"]);

        assert!(matches!(
            session.judge_transcript("hallo", true),
            StepOutcome::Advanced { .. }
        ));

        // Round 0's clock fires a beat too late.
        assert_eq!(session.timeout_round(spawn.seq), StepOutcome::Ignored);
        assert_eq!(session.lives(), 3);
        assert_eq!(session.correct_indices(), [0]);
        assert!(session.failed_indices().is_empty());
        assert_eq!(session.current_round().unwrap().phrase_index(), 1);
    }

    #[test]
    fn late_result_after_timeout_counts_toward_the_next_round_only() {
        let (mut session, spawn) = playing_session(&["Hallo", "Danke"]);

        assert!(matches!(
            session.timeout_round(spawn.seq),
            StepOutcome::LifeLost {
                failed_index: 0,
                lives_left: 2,
                ..
            }
        ));

        // The matching transcript lands a moment after the timeout. It is
        // judged against "Danke" now and fails, rather than resurrecting
        // the round that already resolved.
        assert!(matches!(
            session.judge_transcript("hallo", true),
            StepOutcome::Rejected { .. }
        ));
        assert!(session.correct_indices().is_empty());
        assert_eq!(session.failed_indices(), [0]);
    }

    #[test]
    fn duplicate_timeout_is_ignored() {
        let (mut session, spawn) = playing_session(&["Hallo", "Danke"]);

        assert!(matches!(
            session.timeout_round(spawn.seq),
            StepOutcome::LifeLost { .. }
        ));
        assert_eq!(session.timeout_round(spawn.seq), StepOutcome::Ignored);

        assert_eq!(session.lives(), 2);
        assert_eq!(session.failed_indices(), [0]);
    }

    #[test]
    fn phrase_index_strictly_increases_through_a_win() {
        let (mut session, _) = playing_session(&["Hallo", "Danke", "Tschüss"]);
        let mut spawned = vec![0];

        for transcript in ["hallo", "hallo danke", "hallo danke tschuss"] {
            let outcome = session.judge_transcript(transcript, true);
            let StepOutcome::Advanced {
                resolved_index,
                next,
                ..
            } = outcome
            else {
                panic!("expected Advanced, got {outcome:?}");
            };
            if let Some(spawn) = next {
                assert_eq!(spawn.phrase_index, resolved_index + 1);
                spawned.push(spawn.phrase_index);
            }
        }

        assert_eq!(spawned, vec![0, 1, 2]);
        assert_eq!(session.state(), GameState::Won);
        assert_eq!(session.correct_indices(), [0, 1, 2]);
    }

    #[test]
    fn three_timeouts_lose_the_game() {
        let (mut session, first) = playing_session(&["Hallo", "Danke", "Tschüss"]);

        let StepOutcome::LifeLost { next, .. } = session.timeout_round(first.seq) else {
            panic!("first timeout should cost a life");
        };
        let second = next.unwrap();
        let StepOutcome::LifeLost { next, .. } = session.timeout_round(second.seq) else {
            panic!("second timeout should cost a life");
        };
        let third = next.unwrap();
        let StepOutcome::LifeLost {
            lives_left, next, ..
        } = session.timeout_round(third.seq)
        else {
            panic!("third timeout should cost the last life");
        };

        assert_eq!(lives_left, 0);
        assert!(next.is_none());
        assert_eq!(session.state(), GameState::Lost);
        assert_eq!(session.lives(), 0);
        assert_eq!(session.failed_indices(), [0, 1, 2]);
    }

    #[test]
    fn surviving_all_phrases_wins_even_with_failures() {
        let (mut session, first) = playing_session(&["Hallo", "Danke"]);

        let StepOutcome::LifeLost { next, .. } = session.timeout_round(first.seq) else {
            panic!("first timeout should cost a life");
        };
        let second = next.unwrap();
        let StepOutcome::LifeLost {
            lives_left, next, ..
        } = session.timeout_round(second.seq)
        else {
            panic!("second timeout should cost a life");
        };

        assert_eq!(lives_left, 1);
        assert!(next.is_none());
        // Out of phrases, not out of lives.
        assert_eq!(session.state(), GameState::Won);
        assert_eq!(session.failed_indices(), [0, 1]);
        assert_eq!(session.correct_count(), 0);
    }

    #[test]
    fn settled_speech_never_scores_twice() {
        let (mut session, _) = playing_session(&["Hallo", "Hallo"]);

        assert!(matches!(
            session.judge_transcript("hallo", true),
            StepOutcome::Advanced { .. }
        ));

        // The same cumulative transcript again: everything before the
        // settled mark is spoken for, nothing new to judge.
        assert_eq!(session.judge_transcript("hallo", true), StepOutcome::Ignored);

        // Fresh speech after the mark is what counts.
        assert!(matches!(
            session.judge_transcript("hallo hallo", true),
            StepOutcome::Advanced { .. }
        ));
        assert_eq!(session.state(), GameState::Won);
    }

    #[test]
    fn transcript_shorter_than_the_settled_prefix_is_ignored() {
        let (mut session, _) = playing_session(&["Hallo", "Danke"]);

        assert!(matches!(
            session.judge_transcript("hallo und mehr", true),
            StepOutcome::Advanced { .. }
        ));

        // A revised transcript shorter than the settled prefix.
        assert_eq!(session.judge_transcript("hall", true), StepOutcome::Ignored);
    }

    #[test]
    fn transcript_offsets_count_characters_not_bytes() {
        let (mut session, _) = playing_session(&["Grüße", "Danke"]);

        assert!(matches!(
            session.judge_transcript("grüße", true),
            StepOutcome::Advanced { .. }
        ));
        assert!(matches!(
            session.judge_transcript("grüße danke", true),
            StepOutcome::Advanced { .. }
        ));
        assert_eq!(session.state(), GameState::Won);
    }

    #[test]
    fn partial_results_are_ignored_by_default() {
        let (mut session, _) = playing_session(&["Hallo"]);

        assert_eq!(session.judge_transcript("hallo", false), StepOutcome::Ignored);
        assert_eq!(session.state(), GameState::Playing);
    }

    #[test]
    fn partial_results_match_when_enabled() {
        let settings = GameSettings::new(3, 7, 60, true).unwrap();
        let mut session = GameSession::new(
            build_lesson(&["Hallo"]),
            settings,
            ThresholdPolicy::new(),
        );
        session.begin().unwrap();

        assert!(matches!(
            session.judge_transcript("hallo", false),
            StepOutcome::Advanced { .. }
        ));
        assert_eq!(session.state(), GameState::Won);
    }

    #[test]
    fn empty_speech_is_never_judged() {
        let (mut session, _) = playing_session(&["Hallo"]);

        assert_eq!(session.judge_transcript("", true), StepOutcome::Ignored);
        assert_eq!(session.judge_transcript("   ", true), StepOutcome::Ignored);
        assert_eq!(session.judge_transcript("?!.", true), StepOutcome::Ignored);
        assert!(!session.current_round().unwrap().is_resolved());
    }

    #[test]
    fn recognizer_restart_rebases_the_offset() {
        let (mut session, _) = playing_session(&["Hallo", "Danke"]);

        assert!(matches!(
            session.judge_transcript("hallo", true),
            StepOutcome::Advanced { .. }
        ));

        // The recognizer died and came back; its transcript starts over.
        session.recognizer_reopened();
        assert_eq!(session.current_round().unwrap().transcript_offset(), 0);

        assert!(matches!(
            session.judge_transcript("danke", true),
            StepOutcome::Advanced { .. }
        ));
        assert_eq!(session.state(), GameState::Won);
    }

    #[test]
    fn abort_finalizes_as_lost_and_silences_late_events() {
        let (mut session, spawn) = playing_session(&["Hallo"]);

        assert!(session.abort());
        assert_eq!(session.state(), GameState::Lost);
        assert!(!session.abort());

        assert_eq!(session.judge_transcript("hallo", true), StepOutcome::Ignored);
        assert_eq!(session.timeout_round(spawn.seq), StepOutcome::Ignored);
        assert_eq!(session.lives(), 3);
    }
}
