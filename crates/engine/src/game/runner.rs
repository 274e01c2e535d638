use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use parrot_core::model::{GameOutcome, GameSettings, Lesson};
use parrot_core::{Clock, ThresholdPolicy};

use crate::error::GameError;
use crate::game::session::{GameSession, GameState, RoundSpawn, StepOutcome};
use crate::game::update::GameUpdate;
use crate::recognizer::{RecognizerEvent, SpeechRecognizer};
use crate::reporter::OutcomeReporter;
use crate::timer::{RoundClock, Stopwatch, TimerEvent};

#[derive(Debug, Clone, Copy)]
enum GameCommand {
    Stop,
    Restart,
}

/// Terminal state and outcome of a completed play-through.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedGame {
    pub state: GameState,
    pub outcome: GameOutcome,
}

/// Control handle for a running game.
pub struct GameHandle {
    commands: mpsc::Sender<GameCommand>,
    task: JoinHandle<Result<FinishedGame, GameError>>,
}

impl GameHandle {
    /// Requests a manual stop; the game finalizes as `Lost` without
    /// awarding the open round.
    pub async fn stop(&self) {
        let _ = self.commands.send(GameCommand::Stop).await;
    }

    /// Tears the current play-through down and starts a fresh one, with
    /// lives, indices, offsets, and clocks all reset.
    pub async fn restart(&self) {
        let _ = self.commands.send(GameCommand::Restart).await;
    }

    /// Waits for the game to finish and returns its outcome.
    ///
    /// # Errors
    ///
    /// Returns the error the game finished with, or
    /// `GameError::Interrupted` when its task was cancelled or panicked.
    pub async fn await_finished(self) -> Result<FinishedGame, GameError> {
        // The runner treats a closed command channel as a stop request, so
        // the sender has to stay alive while we wait.
        let GameHandle {
            commands: _commands,
            task,
        } = self;
        match task.await {
            Ok(result) => result,
            Err(_) => Err(GameError::Interrupted),
        }
    }
}

/// Owns one game end to end: the recognizer session, both clocks, the state
/// machine, and outcome reporting.
///
/// Everything is serialized onto a single task; recognizer results, round
/// timeouts, and display ticks are handled one at a time, so no two state
/// transitions can ever interleave.
pub struct GameRunner {
    lesson: Lesson,
    settings: GameSettings,
    thresholds: ThresholdPolicy,
    recognizer: Arc<dyn SpeechRecognizer>,
    reporter: Arc<dyn OutcomeReporter>,
    clock: Clock,
}

impl GameRunner {
    #[must_use]
    pub fn new(
        lesson: Lesson,
        settings: GameSettings,
        thresholds: ThresholdPolicy,
        recognizer: Arc<dyn SpeechRecognizer>,
        reporter: Arc<dyn OutcomeReporter>,
    ) -> Self {
        Self {
            lesson,
            settings,
            thresholds,
            recognizer,
            reporter,
            clock: Clock::default(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Starts the game on its own task.
    ///
    /// The returned receiver carries UI updates; dropping it or falling
    /// behind only costs updates, never the game.
    #[must_use]
    pub fn spawn(self) -> (GameHandle, mpsc::Receiver<GameUpdate>) {
        let (command_tx, command_rx) = mpsc::channel(8);
        let (update_tx, update_rx) = mpsc::channel(64);
        let task = tokio::spawn(self.run(command_rx, update_tx));

        (
            GameHandle {
                commands: command_tx,
                task,
            },
            update_rx,
        )
    }

    async fn run(
        self,
        mut commands: mpsc::Receiver<GameCommand>,
        updates: mpsc::Sender<GameUpdate>,
    ) -> Result<FinishedGame, GameError> {
        'game: loop {
            // Each play-through gets a fresh timer channel and session, so
            // nothing queued by a previous run can leak into this one.
            let (timer_tx, mut timer_rx) = mpsc::channel(64);
            let mut recognizer_rx = self.recognizer.open().await?;
            let mut recognizer_alive = true;

            let mut session = GameSession::new(
                self.lesson.clone(),
                self.settings.clone(),
                self.thresholds.clone(),
            );

            let mut stopwatch = Stopwatch::start();
            stopwatch.run_display_ticker(self.settings.display_tick_hz(), timer_tx.clone());

            let spawn = session.begin()?;
            let mut round_clock =
                RoundClock::spawn(self.settings.round_seconds(), spawn.seq, timer_tx.clone());
            send_update(&updates, self.round_started(&session, spawn));

            let finished = loop {
                tokio::select! {
                    command = commands.recv() => match command {
                        Some(GameCommand::Restart) => {
                            log::info!("restarting game");
                            round_clock.cancel();
                            stopwatch.stop_display_ticker();
                            self.recognizer.close().await;
                            continue 'game;
                        }
                        Some(GameCommand::Stop) | None => {
                            session.abort();
                            round_clock.cancel();
                            stopwatch.stop_display_ticker();
                            self.recognizer.close().await;
                            break self.finalize(&session, &stopwatch, &updates).await?;
                        }
                    },

                    Some(event) = timer_rx.recv() => match event {
                        TimerEvent::RoundTimeout { round_seq } => {
                            if let StepOutcome::LifeLost { failed_index, lives_left, next } =
                                session.timeout_round(round_seq)
                            {
                                send_update(&updates, GameUpdate::RoundLost {
                                    phrase_index: failed_index,
                                    lives_left,
                                });
                                match next {
                                    Some(spawn) => {
                                        round_clock = RoundClock::spawn(
                                            self.settings.round_seconds(),
                                            spawn.seq,
                                            timer_tx.clone(),
                                        );
                                        send_update(&updates, self.round_started(&session, spawn));
                                    }
                                    None => {
                                        round_clock.cancel();
                                        stopwatch.stop_display_ticker();
                                        self.recognizer.close().await;
                                        break self.finalize(&session, &stopwatch, &updates).await?;
                                    }
                                }
                            }
                        }
                        TimerEvent::Countdown { round_seq, seconds_left } => {
                            let current = session
                                .current_round()
                                .is_some_and(|round| round.seq() == round_seq);
                            if current {
                                send_update(&updates, GameUpdate::Countdown { seconds_left });
                            }
                        }
                        TimerEvent::DisplayTick => {
                            send_update(&updates, GameUpdate::Elapsed {
                                since_start: stopwatch.elapsed(),
                            });
                        }
                    },

                    event = recognizer_rx.recv(), if recognizer_alive => match event {
                        Some(RecognizerEvent::Started) => {
                            log::debug!("recognizer session live");
                        }
                        Some(RecognizerEvent::Result { transcript, is_final }) => {
                            send_update(&updates, GameUpdate::Heard {
                                text: transcript.clone(),
                                is_final,
                            });
                            match session.judge_transcript(&transcript, is_final) {
                                StepOutcome::Advanced { resolved_index, similarity, next } => {
                                    round_clock.cancel();
                                    send_update(&updates, GameUpdate::RoundWon {
                                        phrase_index: resolved_index,
                                        similarity,
                                    });
                                    match next {
                                        Some(spawn) => {
                                            round_clock = RoundClock::spawn(
                                                self.settings.round_seconds(),
                                                spawn.seq,
                                                timer_tx.clone(),
                                            );
                                            send_update(&updates, self.round_started(&session, spawn));
                                        }
                                        None => {
                                            stopwatch.stop_display_ticker();
                                            self.recognizer.close().await;
                                            break self.finalize(&session, &stopwatch, &updates).await?;
                                        }
                                    }
                                }
                                StepOutcome::Rejected { similarity } => {
                                    log::debug!("attempt below threshold at {:.3}", similarity);
                                }
                                _ => {}
                            }
                        }
                        Some(RecognizerEvent::Error { code, message }) => {
                            // Non-fatal; the stream usually recovers on its own.
                            log::warn!("recognizer error {}: {}", code, message);
                        }
                        Some(RecognizerEvent::Ended) | None => {
                            match self.recognizer.open().await {
                                Ok(rx) => {
                                    log::warn!("recognizer stream ended mid-game, reopened");
                                    recognizer_rx = rx;
                                    session.recognizer_reopened();
                                }
                                Err(err) => {
                                    // Remaining rounds drain by timeout.
                                    log::error!("recognizer could not be reopened: {}", err);
                                    recognizer_alive = false;
                                }
                            }
                        }
                    },
                }
            };

            return Ok(finished);
        }
    }

    fn round_started(&self, session: &GameSession, spawn: RoundSpawn) -> GameUpdate {
        let target_text = session
            .lesson()
            .phrase(spawn.phrase_index)
            .map(|phrase| phrase.text().to_owned())
            .unwrap_or_default();
        GameUpdate::RoundStarted {
            phrase_index: spawn.phrase_index,
            target_text,
            seconds: self.settings.round_seconds(),
        }
    }

    async fn finalize(
        &self,
        session: &GameSession,
        stopwatch: &Stopwatch,
        updates: &mpsc::Sender<GameUpdate>,
    ) -> Result<FinishedGame, GameError> {
        // The authoritative score: sampled exactly once, at termination.
        let elapsed = stopwatch.elapsed();
        let state = session.state();
        let outcome = GameOutcome::from_parts(
            elapsed,
            session.correct_count(),
            u32::try_from(session.lesson().phrase_count()).unwrap_or(u32::MAX),
            self.clock.now(),
        )?;

        send_update(
            updates,
            GameUpdate::Finished {
                state,
                outcome: outcome.clone(),
            },
        );

        if state == GameState::Won {
            let lesson_id = session.lesson().id();
            if let Err(err) = self
                .reporter
                .submit_score(lesson_id, outcome.elapsed(), outcome.correct_count())
                .await
            {
                log::warn!("score submission failed: {}", err);
            }
            if let Err(err) = self
                .reporter
                .complete_lesson(lesson_id, outcome.score_percent())
                .await
            {
                log::warn!("lesson completion failed: {}", err);
            }
        }

        log::info!(
            "game finished {:?} in {:?} with {}/{} phrases correct",
            state,
            outcome.elapsed(),
            outcome.correct_count(),
            outcome.total_phrases()
        );

        Ok(FinishedGame { state, outcome })
    }
}

// Updates are best effort; a full or closed channel never stalls the game.
fn send_update(updates: &mpsc::Sender<GameUpdate>, update: GameUpdate) {
    let _ = updates.try_send(update);
}
