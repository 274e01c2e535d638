// Public API of the game subsystem.

mod round;
mod runner;
mod session;
mod update;

pub use round::Round;
pub use runner::{FinishedGame, GameHandle, GameRunner};
pub use session::{GameSession, GameState, RoundSpawn, StepOutcome};
pub use update::GameUpdate;
