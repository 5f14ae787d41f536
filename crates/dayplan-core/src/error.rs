//! Error types for the dayplan-core crate.
//!
//! The `Display` strings here are the rendering contract: the
//! presentation layer shows [`PlannerError`] messages to the user
//! verbatim, so the copy is user-facing. Store-level failures pass
//! through unchanged via the `Store` variant.

use dayplan_store::StoreError;
use thiserror::Error;

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, PlannerError>;

/// Unified error type for planner operations.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// One or more form fields failed validation. The message may span
    /// several lines, one per failed field.
    #[error("{0}")]
    Validation(String),

    /// A registration or email change targets a key that is taken.
    #[error("Email already exists. Please use a different email address.")]
    DuplicateEmail,

    /// The account exists but the password does not match.
    #[error("Incorrect password. Please check your password")]
    IncorrectPassword,

    /// No account exists for the given email.
    #[error("We could not find your user. Please try checking the fields!")]
    UnknownUser,

    /// An operation that needs a session found nobody logged in.
    #[error("Logged-in user not found.")]
    NoActiveUser,

    /// The referenced task is not in the active task list.
    #[error("Task not found.")]
    TaskNotFound,

    /// The task would start before 05:00 or end after 23:00.
    #[error("Tasks can only be added between 05:00 and 23:00")]
    OutOfWindow,

    /// The task overlaps an existing one on the same date.
    #[error(
        "The time slot you selected conflicts with: \
         TITLE -- ({title}) COMPLETION TIME -- ({time}) DATE -- ({date})."
    )]
    Conflict {
        /// Title of the conflicting task.
        title: String,
        /// Start time of the conflicting task.
        time: String,
        /// Date of the conflicting task.
        date: String,
    },

    /// A persistence failure, passed through from the store.
    #[error(transparent)]
    Store(#[from] StoreError),
}
