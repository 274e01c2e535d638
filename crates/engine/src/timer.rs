use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Events emitted by the round clock and the display ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// One second of the round elapsed; `seconds_left` remain.
    Countdown { round_seq: u64, seconds_left: u32 },
    /// The round ran out of time.
    RoundTimeout { round_seq: u64 },
    /// Cosmetic prompt to refresh the elapsed-time display.
    DisplayTick,
}

/// One round's 1 Hz countdown.
///
/// Fires `Countdown` each second, `RoundTimeout` when time runs out, then
/// stops itself. Events carry the round sequence number so a consumer can
/// discard ticks from a round that already resolved.
#[derive(Debug)]
pub struct RoundClock {
    handle: JoinHandle<()>,
}

impl RoundClock {
    #[must_use]
    pub fn spawn(seconds: u32, round_seq: u64, events: mpsc::Sender<TimerEvent>) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // An interval's first tick fires immediately.
            ticker.tick().await;

            let mut remaining = seconds;
            while remaining > 0 {
                ticker.tick().await;
                remaining -= 1;
                let event = if remaining == 0 {
                    TimerEvent::RoundTimeout { round_seq }
                } else {
                    TimerEvent::Countdown {
                        round_seq,
                        seconds_left: remaining,
                    }
                };
                if events.send(event).await.is_err() {
                    break;
                }
            }
        });

        Self { handle }
    }

    /// Stops the countdown without firing a timeout.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for RoundClock {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Monotonic stopwatch for a whole play-through.
///
/// Started once per game. The final score time is whatever `elapsed`
/// returns at the moment of termination; the display ticker only prompts
/// cosmetic UI refreshes and never feeds the score.
#[derive(Debug)]
pub struct Stopwatch {
    started_at: Instant,
    ticker: Option<JoinHandle<()>>,
}

impl Stopwatch {
    #[must_use]
    pub fn start() -> Self {
        Self {
            started_at: Instant::now(),
            ticker: None,
        }
    }

    /// Time since `start`.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Spawns a ticker that fires `DisplayTick` at roughly `hz`, replacing
    /// any ticker already running.
    pub fn run_display_ticker(&mut self, hz: u32, events: mpsc::Sender<TimerEvent>) {
        self.stop_display_ticker();

        let period = Duration::from_micros(1_000_000 / u64::from(hz.max(1)));
        self.ticker = Some(tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if events.send(TimerEvent::DisplayTick).await.is_err() {
                    break;
                }
            }
        }));
    }

    pub fn stop_display_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Drop for Stopwatch {
    fn drop(&mut self) {
        self.stop_display_ticker();
    }
}
