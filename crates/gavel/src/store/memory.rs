use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::problem::Problem;
use crate::store::{Store, StoreError};
use crate::types::{Counters, Submission};

#[derive(Debug, Default)]
struct State {
    problems: HashMap<String, (Problem, Counters)>,
    users: HashMap<String, Counters>,
    submissions: Vec<Submission>,
}

/// In-process [`Store`]
///
/// Every commit runs under one lock, which gives it the all-or-nothing
/// behavior a transactional database would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a problem; its counters start at zero
    pub fn insert_problem(&self, problem: Problem) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state
            .problems
            .insert(problem.id.clone(), (problem, Counters::default()));
        Ok(())
    }

    /// Register a user; existing counters are kept
    pub fn insert_user(&self, user_id: impl Into<String>) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.users.entry(user_id.into()).or_default();
        Ok(())
    }

    pub fn user_counters(&self, user_id: &str) -> Result<Option<Counters>, StoreError> {
        Ok(self.lock()?.users.get(user_id).copied())
    }

    pub fn problem_counters(&self, problem_id: &str) -> Result<Option<Counters>, StoreError> {
        Ok(self
            .lock()?
            .problems
            .get(problem_id)
            .map(|(_, counters)| *counters))
    }

    /// All committed submissions in commit order
    pub fn submissions(&self) -> Result<Vec<Submission>, StoreError> {
        Ok(self.lock()?.submissions.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl Store for MemoryStore {
    async fn load_problem(&self, id: &str) -> Result<Option<Problem>, StoreError> {
        Ok(self
            .lock()?
            .problems
            .get(id)
            .map(|(problem, _)| problem.clone()))
    }

    async fn commit(&self, submission: &Submission) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let State {
            problems,
            users,
            submissions,
        } = &mut *state;

        let user = users
            .get_mut(&submission.user_id)
            .ok_or_else(|| StoreError::UserNotFound(submission.user_id.clone()))?;
        let (_, problem) = problems
            .get_mut(&submission.problem_id)
            .ok_or_else(|| StoreError::ProblemNotFound(submission.problem_id.clone()))?;

        user.record(submission.status);
        problem.record(submission.status);
        submissions.push(submission.clone());

        debug!(submission_id = %submission.id, status = %submission.status, "submission committed");
        Ok(())
    }
}
