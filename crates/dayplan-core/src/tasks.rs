//! Task operations: creation, rescheduling, completion, and deletion.
//!
//! Every operation resolves the logged-in user, runs the scheduling
//! checks over the in-memory task list, and persists the outcome through
//! the user store. Archived tasks never return to the active list.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use dayplan_store::{Archive, Task, User};

use crate::error::{PlannerError, Result};
use crate::{Planner, schedule};

/// Input for a task that does not exist yet; the id is minted on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Start time, `HH:MM`.
    pub time: String,
    /// Length in hours; may be fractional.
    pub duration: f64,
}

impl Planner {
    /// Add a task to the active account's schedule.
    ///
    /// The placement is validated against every existing task, then an
    /// unused id is drawn against the persisted list before the grown
    /// list is saved.
    #[instrument(skip_all, fields(date = %draft.date, time = %draft.time))]
    pub async fn add_task(&self, draft: TaskDraft) -> Result<User> {
        let mut user = self.require_logged_in().await?;
        schedule::validate_placement(&draft.date, &draft.time, draft.duration, &user.tasks)?;

        let users = self.users.clone();
        let email = user.email.clone();
        let id = schedule::allocate_id(move |id| {
            let users = users.clone();
            let email = email.clone();
            async move { Ok(users.task_id_exists(&email, id).await?) }
        })
        .await?;

        user.tasks.push(Task {
            id,
            title: draft.title,
            description: draft.description,
            date: draft.date,
            time: draft.time,
            duration: draft.duration,
        });
        self.users.save_tasks(&user.email, &user.tasks).await?;

        debug!(id, "task added");
        Ok(user)
    }

    /// Reschedule or edit an existing task, identified by its id.
    ///
    /// The new placement is validated against the task's siblings — the
    /// task's own prior instance is excluded, so keeping the same slot
    /// always succeeds.
    #[instrument(skip_all, fields(id = updated.id))]
    pub async fn update_task(&self, updated: Task) -> Result<User> {
        let mut user = self.require_logged_in().await?;

        let siblings: Vec<Task> = user
            .tasks
            .iter()
            .filter(|t| t.id != updated.id)
            .cloned()
            .collect();
        schedule::validate_placement(&updated.date, &updated.time, updated.duration, &siblings)?;

        let index = user
            .tasks
            .iter()
            .position(|t| t.id == updated.id)
            .ok_or(PlannerError::TaskNotFound)?;
        user.tasks[index] = updated;
        self.users.save_tasks(&user.email, &user.tasks).await?;

        debug!("task updated");
        Ok(user)
    }

    /// Move a task into the completed archive.
    pub async fn complete_task(&self, id: u32) -> Result<User> {
        self.archive_task(id, Archive::Completed).await
    }

    /// Move a task into the deleted archive.
    pub async fn delete_task(&self, id: u32) -> Result<User> {
        self.archive_task(id, Archive::Deleted).await
    }

    #[instrument(skip(self))]
    async fn archive_task(&self, id: u32, archive: Archive) -> Result<User> {
        let mut user = self.require_logged_in().await?;

        let (remaining, removed) = schedule::remove_task(&user.tasks, id)?;
        user.tasks = remaining;
        let archived = match archive {
            Archive::Completed => {
                user.completed_tasks.push(removed);
                &user.completed_tasks
            }
            Archive::Deleted => {
                user.deleted_tasks.push(removed);
                &user.deleted_tasks
            }
        };
        self.users
            .archive_task_lists(&user.email, &user.tasks, archive, archived)
            .await?;

        debug!(id, "task archived");
        Ok(user)
    }
}

// ── tests ────────────────────────────────────────────────────────────
