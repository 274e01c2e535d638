use std::time::Duration;

use parrot_core::model::GameOutcome;

use crate::game::session::GameState;

/// UI-facing progress events for one play-through.
///
/// Delivery is best effort: a consumer that falls behind loses cosmetic
/// updates rather than stalling the game.
#[derive(Debug, Clone, PartialEq)]
pub enum GameUpdate {
    /// A new round began for the phrase at `phrase_index`.
    RoundStarted {
        phrase_index: usize,
        target_text: String,
        seconds: u32,
    },
    /// Live feedback: what the recognizer currently hears.
    Heard { text: String, is_final: bool },
    /// The current round's countdown moved.
    Countdown { seconds_left: u32 },
    /// Cosmetic stopwatch refresh.
    Elapsed { since_start: Duration },
    /// The current phrase was pronounced acceptably.
    RoundWon { phrase_index: usize, similarity: f64 },
    /// The current round timed out.
    RoundLost { phrase_index: usize, lives_left: u32 },
    /// The game ended.
    Finished {
        state: GameState,
        outcome: GameOutcome,
    },
}
