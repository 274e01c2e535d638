use std::env;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use parrot_core::model::LessonId;

use crate::error::ReporterError;

/// Where finished-game results are delivered.
#[derive(Clone, Debug)]
pub struct ReporterConfig {
    pub base_url: String,
    pub api_key: String,
}

impl ReporterConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("PARROT_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("PARROT_API_BASE_URL")
            .unwrap_or_else(|_| "https://progress.parrot.app/v1".into());
        Some(Self { base_url, api_key })
    }
}

/// Delivery of finished-game results to the progress backend.
///
/// Fire-and-forget from the game's point of view: the outcome shown to the
/// player never depends on whether these calls land.
#[async_trait]
pub trait OutcomeReporter: Send + Sync {
    /// Record the final time and correct count for a won lesson.
    ///
    /// # Errors
    ///
    /// Returns `ReporterError` when reporting is disabled or the request fails.
    async fn submit_score(
        &self,
        lesson_id: LessonId,
        time: Duration,
        correct_count: u32,
    ) -> Result<(), ReporterError>;

    /// Mark the lesson completed with its score percentage.
    ///
    /// # Errors
    ///
    /// Returns `ReporterError` when reporting is disabled or the request fails.
    async fn complete_lesson(
        &self,
        lesson_id: LessonId,
        score_percent: f64,
    ) -> Result<(), ReporterError>;
}

/// Reporter that posts results to the progress API.
#[derive(Clone)]
pub struct HttpOutcomeReporter {
    client: Client,
    config: Option<ReporterConfig>,
}

impl HttpOutcomeReporter {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ReporterConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<ReporterConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    async fn post<T: Serialize>(&self, path: &str, payload: &T) -> Result<(), ReporterError> {
        let config = self.config.as_ref().ok_or(ReporterError::Disabled)?;

        let url = format!("{}/{path}", config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReporterError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

#[async_trait]
impl OutcomeReporter for HttpOutcomeReporter {
    async fn submit_score(
        &self,
        lesson_id: LessonId,
        time: Duration,
        correct_count: u32,
    ) -> Result<(), ReporterError> {
        let payload = ScoreRequest {
            lesson_id: lesson_id.value(),
            time_ms: u64::try_from(time.as_millis()).unwrap_or(u64::MAX),
            correct_count,
        };
        self.post("scores", &payload).await
    }

    async fn complete_lesson(
        &self,
        lesson_id: LessonId,
        score_percent: f64,
    ) -> Result<(), ReporterError> {
        let payload = CompletionRequest {
            lesson_id: lesson_id.value(),
            score_percent,
        };
        self.post("completions", &payload).await
    }
}

#[derive(Debug, Serialize)]
struct ScoreRequest {
    lesson_id: u64,
    time_ms: u64,
    correct_count: u32,
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    lesson_id: u64,
    score_percent: f64,
}

/// In-memory reporter for tests.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    scores: Arc<Mutex<Vec<(LessonId, Duration, u32)>>>,
    completions: Arc<Mutex<Vec<(LessonId, f64)>>>,
    fail_requests: bool,
}

impl RecordingReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A reporter whose calls all fail, for exercising error paths.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_requests: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn scores(&self) -> Vec<(LessonId, Duration, u32)> {
        self.scores
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn completions(&self) -> Vec<(LessonId, f64)> {
        self.completions
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl OutcomeReporter for RecordingReporter {
    async fn submit_score(
        &self,
        lesson_id: LessonId,
        time: Duration,
        correct_count: u32,
    ) -> Result<(), ReporterError> {
        if self.fail_requests {
            return Err(ReporterError::Disabled);
        }
        if let Ok(mut guard) = self.scores.lock() {
            guard.push((lesson_id, time, correct_count));
        }
        Ok(())
    }

    async fn complete_lesson(
        &self,
        lesson_id: LessonId,
        score_percent: f64,
    ) -> Result<(), ReporterError> {
        if self.fail_requests {
            return Err(ReporterError::Disabled);
        }
        if let Ok(mut guard) = self.completions.lock() {
            guard.push((lesson_id, score_percent));
        }
        Ok(())
    }
}
