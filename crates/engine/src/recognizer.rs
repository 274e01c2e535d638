use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::RecognizerError;

/// Event stream produced by one recognition session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerEvent {
    /// The audio session is live and listening.
    Started,
    /// A transcription hypothesis. The transcript is cumulative within the
    /// session; partial results may still be revised, final ones are settled.
    Result { transcript: String, is_final: bool },
    /// The backend ended the stream on its side.
    Ended,
    /// A backend fault. The stream may keep delivering events afterwards.
    Error { code: i32, message: String },
}

/// Contract for continuous speech recognition backends.
///
/// Transcripts are cumulative within one session and start over from empty
/// on the next `open`.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Start a recognition session and return its event stream.
    ///
    /// # Errors
    ///
    /// Returns `RecognizerError::PermissionDenied` when microphone access is
    /// refused, or `RecognizerError::Unavailable` when no backend can serve
    /// the session.
    async fn open(&self) -> Result<mpsc::Receiver<RecognizerEvent>, RecognizerError>;

    /// Stop listening and release the audio session.
    async fn close(&self);
}

/// One scripted recognizer emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStep {
    /// Delay before the event fires, relative to the previous step.
    pub after: Duration,
    pub event: RecognizerEvent,
}

impl ScriptStep {
    #[must_use]
    pub fn new(after: Duration, event: RecognizerEvent) -> Self {
        Self { after, event }
    }

    /// A settled transcription arriving `after` the previous step.
    #[must_use]
    pub fn final_result(after: Duration, transcript: impl Into<String>) -> Self {
        Self::new(
            after,
            RecognizerEvent::Result {
                transcript: transcript.into(),
                is_final: true,
            },
        )
    }

    /// An in-flight hypothesis arriving `after` the previous step.
    #[must_use]
    pub fn partial_result(after: Duration, transcript: impl Into<String>) -> Self {
        Self::new(
            after,
            RecognizerEvent::Result {
                transcript: transcript.into(),
                is_final: false,
            },
        )
    }
}

/// Scripted recognizer for tests and offline demos.
///
/// Replays a fixed event sequence with scripted delays. The script is shared
/// across `open` calls, so a reopened session picks up where the previous
/// one left off. An exhausted script leaves the stream open and silent, the
/// way a live microphone does between utterances.
#[derive(Debug, Clone)]
pub struct ScriptedRecognizer {
    script: Arc<Mutex<VecDeque<ScriptStep>>>,
    deny_permission: bool,
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedRecognizer {
    #[must_use]
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            script: Arc::new(Mutex::new(steps.into())),
            deny_permission: false,
            opens: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A recognizer whose `open` always fails with `PermissionDenied`.
    #[must_use]
    pub fn denied() -> Self {
        Self {
            deny_permission: true,
            ..Self::new(Vec::new())
        }
    }

    /// Number of successfully opened sessions.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of `close` calls.
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn open(&self) -> Result<mpsc::Receiver<RecognizerEvent>, RecognizerError> {
        if self.deny_permission {
            return Err(RecognizerError::PermissionDenied);
        }
        self.opens.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(16);
        let script = Arc::clone(&self.script);
        tokio::spawn(async move {
            loop {
                let step = {
                    let Ok(guard) = script.lock() else { break };
                    guard.front().cloned()
                };
                let Some(step) = step else {
                    // Script exhausted. Keep the session open and silent
                    // until the receiver goes away.
                    tx.closed().await;
                    break;
                };

                tokio::time::sleep(step.after).await;
                // A step is only consumed once someone is still listening,
                // so a session torn down mid-delay does not swallow it.
                if tx.is_closed() {
                    break;
                }
                {
                    let Ok(mut guard) = script.lock() else { break };
                    guard.pop_front();
                }

                let ended = step.event == RecognizerEvent::Ended;
                if tx.send(step.event).await.is_err() {
                    break;
                }
                if ended {
                    break;
                }
            }
        });

        Ok(rx)
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
