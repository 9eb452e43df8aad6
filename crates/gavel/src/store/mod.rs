//! Persistence seams of the judge
//!
//! [`Store`] owns problems, users and submissions. [`SourceStore`] keeps the
//! submitted source files on disk.

use std::future::Future;

use thiserror::Error;

use crate::problem::Problem;
use crate::types::Submission;

pub use crate::store::memory::MemoryStore;
pub use crate::store::source::SourceStore;

mod memory;
mod source;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user '{0}' does not exist")]
    UserNotFound(String),

    #[error("problem '{0}' does not exist")]
    ProblemNotFound(String),

    #[error("store state is poisoned")]
    Poisoned,
}

/// Problem lookup and atomic submission commit
pub trait Store: Send + Sync {
    /// Load a problem with its test cases, `None` if it doesn't exist
    fn load_problem(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Problem>, StoreError>> + Send;

    /// Insert the judged submission and update the submitting user's and the
    /// problem's counters
    ///
    /// Either all three changes are applied or none is.
    fn commit(&self, submission: &Submission) -> impl Future<Output = Result<(), StoreError>> + Send;
}
