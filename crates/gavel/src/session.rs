//! Judge sessions
//!
//! A [`JudgeSession`] takes a submission from raw source to a committed,
//! judged [`Submission`]: save the source, load the problem, run the
//! aggregator and commit the result.

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{error, info, instrument};

use crate::config::{Config, ConfigError};
use crate::runner::{RunError, TestRunner};
use crate::store::{SourceStore, Store, StoreError};
use crate::types::Submission;
use crate::verdict::Aggregator;

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("unknown language: {0}")]
    UnknownLanguage(#[from] ConfigError),

    #[error("problem '{0}' not found")]
    ProblemNotFound(String),

    #[error("failed to save source: {0}")]
    SourcePersist(#[source] std::io::Error),

    #[error("failed to run submission: {0}")]
    Launch(#[from] RunError),

    #[error("failed to persist submission: {0}")]
    Persistence(#[from] StoreError),

    #[error("judge is shutting down")]
    Admission,
}

/// One submission to judge
#[derive(Debug, Clone, Copy)]
pub struct JudgeRequest<'a> {
    pub problem_id: &'a str,
    pub user_id: &'a str,
    pub source: &'a [u8],

    /// Language ID; the configured default if not set
    pub language: Option<&'a str>,
}

/// Judges submissions against problems held by a [`Store`]
#[derive(Debug)]
pub struct JudgeSession<S> {
    config: Config,
    store: S,
    sources: SourceStore,
    aggregator: Aggregator,
    admission: Option<Semaphore>,
}

impl<S: Store> JudgeSession<S> {
    pub fn new(config: Config, store: S) -> Self {
        let sources = SourceStore::new(&config.source_dir);
        let aggregator = Aggregator::new(TestRunner::new(config.memory_sample_interval()))
            .max_parallel_tests(config.max_parallel_tests);
        let admission = config.max_concurrent_judges.map(Semaphore::new);

        Self {
            config,
            store,
            sources,
            aggregator,
            admission,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Judge a submission in the default language
    pub async fn judge(
        &self,
        problem_id: &str,
        user_id: &str,
        source: &[u8],
    ) -> Result<Submission, JudgeError> {
        self.judge_request(JudgeRequest {
            problem_id,
            user_id,
            source,
            language: None,
        })
        .await
    }

    /// Judge a submission and commit the result
    ///
    /// The returned submission carries the final status. Judged failures such
    /// as a wrong answer are a successful call; only input, launch and
    /// persistence failures are errors.
    #[instrument(skip_all, fields(problem_id = request.problem_id, user_id = request.user_id))]
    pub async fn judge_request(&self, request: JudgeRequest<'_>) -> Result<Submission, JudgeError> {
        if request.problem_id.is_empty() {
            return Err(JudgeError::InvalidInput("problem id is empty"));
        }
        if request.user_id.is_empty() {
            return Err(JudgeError::InvalidInput("user id is empty"));
        }
        if request.source.is_empty() {
            return Err(JudgeError::InvalidInput("source is empty"));
        }
        let language = self.config.resolve_language(request.language)?;

        let _permit = match &self.admission {
            Some(admission) => Some(admission.acquire().await.map_err(|_| JudgeError::Admission)?),
            None => None,
        };

        let source_path = self
            .sources
            .save(request.source, &language.source_name())
            .await
            .map_err(JudgeError::SourcePersist)?;

        let problem = self
            .store
            .load_problem(request.problem_id)
            .await?
            .ok_or_else(|| JudgeError::ProblemNotFound(request.problem_id.to_owned()))?;

        let program = language.program(&source_path);
        let verdict = self.aggregator.judge(&program, &problem).await?;

        let submission = Submission::new(request.problem_id, request.user_id, source_path)
            .with_verdict(verdict);

        if let Err(e) = self.store.commit(&submission).await {
            error!(
                submission_id = %submission.id,
                status = %submission.status,
                error = %e,
                "verdict dropped: commit failed"
            );
            return Err(e.into());
        }

        info!(submission_id = %submission.id, status = %submission.status, "submission judged");
        Ok(submission)
    }
}
