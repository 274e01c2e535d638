use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("lives must be between 1 and 9")]
    InvalidLives,

    #[error("round seconds must be between 1 and 600")]
    InvalidRoundSeconds,

    #[error("display tick rate must be between 1 and 240 Hz")]
    InvalidDisplayTickRate,
}

/// Tunable parameters for one pronunciation challenge.
///
/// The display tick rate is cosmetic only: it drives elapsed-time UI
/// updates and never feeds the score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    lives: u32,
    round_seconds: u32,
    display_tick_hz: u32,
    match_partials: bool,
}

impl GameSettings {
    /// Creates the standard challenge settings:
    /// - 3 lives
    /// - 7 seconds per phrase
    /// - 60 Hz display updates
    /// - matching on final recognizer results only
    #[must_use]
    pub fn default_challenge() -> Self {
        Self {
            lives: 3,
            round_seconds: 7,
            display_tick_hz: 60,
            match_partials: false,
        }
    }

    /// Creates custom settings.
    ///
    /// # Errors
    ///
    /// Returns an error when a value falls outside its accepted range.
    pub fn new(
        lives: u32,
        round_seconds: u32,
        display_tick_hz: u32,
        match_partials: bool,
    ) -> Result<Self, SettingsError> {
        if !(1..=9).contains(&lives) {
            return Err(SettingsError::InvalidLives);
        }
        if !(1..=600).contains(&round_seconds) {
            return Err(SettingsError::InvalidRoundSeconds);
        }
        if !(1..=240).contains(&display_tick_hz) {
            return Err(SettingsError::InvalidDisplayTickRate);
        }

        Ok(Self {
            lives,
            round_seconds,
            display_tick_hz,
            match_partials,
        })
    }

    // Accessors
    #[must_use]
    pub fn lives(&self) -> u32 {
        self.lives
    }

    #[must_use]
    pub fn round_seconds(&self) -> u32 {
        self.round_seconds
    }

    #[must_use]
    pub fn display_tick_hz(&self) -> u32 {
        self.display_tick_hz
    }

    /// When true, partial recognizer results are judged against the target
    /// in addition to final ones. Off by default: partials are noisy and
    /// normally drive UI feedback only.
    #[must_use]
    pub fn match_partials(&self) -> bool {
        self.match_partials
    }

    /// Countdown length of a single round.
    #[must_use]
    pub fn round_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.round_seconds))
    }

    /// Interval between two cosmetic display ticks.
    #[must_use]
    pub fn display_tick_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.display_tick_hz))
    }
}
