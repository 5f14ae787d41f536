//! # dayplan-core
//!
//! Planner core for dayplan: scheduling rules, field validation, and the
//! account/task operations the presentation layer calls.
//!
//! ## Architecture
//!
//! ```text
//! Planner
//! ├── account    (register, login, profile edits)
//! ├── tasks      (add, update, complete, delete)
//! ├── schedule   (id allocation, conflict checks — pure)
//! ├── validate   (credential/profile field rules — pure)
//! └── UserStore  (dayplan-store persistence)
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use dayplan_core::Planner;
//! use dayplan_store::Database;
//!
//! let db = Database::open_and_migrate("data/dayplan.db").await?;
//! let planner = Planner::new(db);
//!
//! planner.register("Ann", "ann@x.com", "password1").await?;
//! planner.login("ann@x.com", "password1").await?;
//! ```

pub mod account;
pub mod error;
pub mod schedule;
pub mod tasks;
pub mod validate;

// ── re-exports ───────────────────────────────────────────────────────

pub use account::ProfilePatch;
pub use error::{PlannerError, Result};
pub use tasks::TaskDraft;

// The storage types flow through every operation; re-export them so the
// presentation layer depends on one crate.
pub use dayplan_store::{Database, Task, User};

use dayplan_store::UserStore;

/// Entry point for the presentation layer.
///
/// Owns the user repository and exposes every operation the UI calls;
/// see the [`account`] and [`tasks`] modules for the method surface.
#[derive(Clone)]
pub struct Planner {
    pub(crate) users: UserStore,
}

impl Planner {
    /// Create a planner on top of an opened and migrated database.
    pub fn new(db: Database) -> Self {
        Self {
            users: UserStore::new(db),
        }
    }
}
