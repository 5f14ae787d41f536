//! Task scheduling: identifier allocation and time-conflict validation.
//!
//! Pure functions over in-memory task slices — persistence belongs to the
//! caller. The only I/O is the asynchronous collision probe handed to
//! [`allocate_id`].

use std::future::Future;

use chrono::NaiveDate;
use rand::Rng;
use tracing::trace;

use dayplan_store::Task;

use crate::error::{PlannerError, Result};

/// Earliest minute of the day a task may start (05:00).
pub const DAY_OPEN_MINUTE: f64 = 300.0;

/// Latest minute of the day a task may end (23:00).
pub const DAY_CLOSE_MINUTE: f64 = 1380.0;

/// Task identifiers are drawn uniformly from `[0, TASK_ID_SPACE)`.
pub const TASK_ID_SPACE: u32 = 100_000;

/// Parse an `"HH:MM"` clock time into minutes since midnight.
fn minutes_of_day(time: &str) -> Result<u32> {
    let parsed = time.split_once(':').and_then(|(hours, minutes)| {
        let hours: u32 = hours.parse().ok()?;
        let minutes: u32 = minutes.parse().ok()?;
        (hours <= 23 && minutes <= 59).then_some(hours * 60 + minutes)
    });
    parsed.ok_or_else(|| {
        PlannerError::Validation(format!("Time must look like HH:MM, got \"{time}\""))
    })
}

/// The `[start, end)` minute interval a task occupies on its date.
fn slot(time: &str, duration: f64) -> Result<(f64, f64)> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(PlannerError::Validation(
            "Duration must be a positive number of hours".to_string(),
        ));
    }
    let start = f64::from(minutes_of_day(time)?);
    Ok((start, start + duration * 60.0))
}

/// Check a candidate placement against the day window and its same-date
/// siblings.
///
/// Intervals are half-open: a task ending exactly when another starts
/// does not conflict. On update, exclude the task's own prior instance
/// from `siblings` before calling.
pub fn validate_placement(
    date: &str,
    time: &str,
    duration: f64,
    siblings: &[Task],
) -> Result<()> {
    if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
        return Err(PlannerError::Validation(format!(
            "Date must look like YYYY-MM-DD, got \"{date}\""
        )));
    }
    let (start, end) = slot(time, duration)?;
    if start < DAY_OPEN_MINUTE || end > DAY_CLOSE_MINUTE {
        return Err(PlannerError::OutOfWindow);
    }
    for sibling in siblings.iter().filter(|t| t.date == date) {
        let (sib_start, sib_end) = slot(&sibling.time, sibling.duration)?;
        if start < sib_end && end > sib_start {
            return Err(PlannerError::Conflict {
                title: sibling.title.clone(),
                time: sibling.time.clone(),
                date: sibling.date.clone(),
            });
        }
    }
    Ok(())
}

/// Draw task ids until `probe` reports one free.
///
/// The probe runs against the persisted task list, not the caller's
/// in-memory copy, so an id is never reissued even from a stale list.
/// Retries are unbounded but each one suspends at the probe, so the loop
/// never starves the runtime.
pub async fn allocate_id<F, Fut>(probe: F) -> Result<u32>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    loop {
        let id = rand::thread_rng().gen_range(0..TASK_ID_SPACE);
        if !probe(id).await? {
            return Ok(id);
        }
        trace!(id, "task id taken, redrawing");
    }
}

/// Remove the task with `id` from `tasks`, returning the remaining list
/// and the removed task. Ids are compared numerically.
pub fn remove_task(tasks: &[Task], id: u32) -> Result<(Vec<Task>, Task)> {
    let index = tasks
        .iter()
        .position(|t| t.id == id)
        .ok_or(PlannerError::TaskNotFound)?;
    let mut remaining = tasks.to_vec();
    let removed = remaining.remove(index);
    Ok((remaining, removed))
}

// ── tests ────────────────────────────────────────────────────────────
