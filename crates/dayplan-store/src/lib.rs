//! # dayplan-store
//!
//! Storage engine for dayplan.
//!
//! Provides SQLite-backed persistence for user records: one row per user
//! keyed by email, with the task collections stored as JSON columns so a
//! record reads and writes as a single unit.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  UserStore   (keyed CRUD on user rows)   │
//! ├──────────────────────────────────────────┤
//! │  Database    (rusqlite WAL, async entry) │
//! │  Migrations  (versioned, transactional)  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use dayplan_store::{Database, UserStore};
//!
//! let db = Database::open_and_migrate("data/dayplan.db").await?;
//! let users = UserStore::new(db);
//! let ann = users.get("ann@x.com").await?;
//! ```

pub mod db;
pub mod error;
pub mod migration;
pub mod user_store;

// ── re-exports ───────────────────────────────────────────────────────

pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use user_store::{Archive, Task, User, UserStore};
