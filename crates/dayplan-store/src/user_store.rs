//! User record persistence.
//!
//! One row per user, keyed by email. The three task collections live as
//! JSON text columns inside the row, so a user record round-trips as a
//! single unit and every task mutation is one keyed UPDATE. Passwords are
//! stored and compared verbatim; this is a single-user local store, not an
//! authentication service.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

// ═══════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════

/// A task occupying a time slot on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier, unique within one user's active task list.
    pub id: u32,
    /// Display title.
    pub title: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Start time of day, `HH:MM` (24-hour).
    pub time: String,
    /// Length in hours; may be fractional.
    pub duration: f64,
}

/// Which archive collection a finished task lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Archive {
    /// Tasks the user marked done.
    Completed,
    /// Tasks the user removed without finishing.
    Deleted,
}

impl Archive {
    fn column(self) -> &'static str {
        match self {
            Self::Completed => "completed_tasks",
            Self::Deleted => "deleted_tasks",
        }
    }
}

/// A user account record. `email` is the primary key of the store, so an
/// email change is a delete+insert ([`UserStore::rekey`]), never an
/// in-place update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Legacy numeric identifier; never used for lookup.
    pub id: Option<i64>,
    /// Given name, required at registration.
    pub firstname: String,
    /// Family name, may be empty.
    pub lastname: String,
    /// Primary key.
    pub email: String,
    /// Stored verbatim.
    pub password: String,
    pub phone: String,
    pub birthday: String,
    /// Avatar: a data URI or a placeholder path.
    pub img: String,
    /// Session flag; at most one user holds it at a time.
    pub login_success: bool,
    /// Active tasks, insertion order preserved.
    pub tasks: Vec<Task>,
    /// Append-only archive of finished tasks.
    pub completed_tasks: Vec<Task>,
    /// Append-only archive of removed tasks.
    pub deleted_tasks: Vec<Task>,
}

// ═══════════════════════════════════════════════════════════════════════
//  UserStore
// ═══════════════════════════════════════════════════════════════════════

/// Keyed CRUD operations on user records.
#[derive(Clone)]
pub struct UserStore {
    db: Database,
}

impl UserStore {
    /// Create a new user store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new user record.
    ///
    /// Fails with [`StoreError::DuplicateEmail`] if the key is taken —
    /// callers pre-check with [`UserStore::email_exists`], but the
    /// constraint still holds if they race.
    #[instrument(skip_all, fields(email = %user.email))]
    pub async fn insert(&self, user: &User) -> StoreResult<()> {
        let row = InsertRow::encode(user)?;

        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO users (email, id, firstname, lastname, password, phone, birthday, img, \
                     login_success, tasks, completed_tasks, deleted_tasks) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    rusqlite::params![
                        row.email,
                        row.id,
                        row.firstname,
                        row.lastname,
                        row.password,
                        row.phone,
                        row.birthday,
                        row.img,
                        row.login_success,
                        row.tasks,
                        row.completed_tasks,
                        row.deleted_tasks,
                    ],
                )
                .map_err(|e| {
                    if let rusqlite::Error::SqliteFailure(ref err, _) = e
                        && err.code == rusqlite::ErrorCode::ConstraintViolation
                    {
                        return StoreError::DuplicateEmail(row.email.clone());
                    }
                    StoreError::Sqlite(e)
                })?;
                Ok(())
            })
            .await?;

        debug!("user record inserted");
        Ok(())
    }

    /// `true` iff a record exists at the email key.
    #[instrument(skip(self))]
    pub async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let email = email.to_string();
        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT 1 FROM users WHERE email = ?1",
                    rusqlite::params![email],
                    |_| Ok(()),
                );
                match result {
                    Ok(()) => Ok(true),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    /// Fetch a single user by email, returning `None` if not found.
    #[instrument(skip(self))]
    pub async fn get(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.to_string();
        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT email, id, firstname, lastname, password, phone, birthday, img, \
                     login_success, tasks, completed_tasks, deleted_tasks \
                     FROM users WHERE email = ?1",
                    rusqlite::params![email],
                    read_user_row,
                );
                match result {
                    Ok(row) => row.into_user().map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    /// Compare a password against the stored record.
    ///
    /// Returns `Ok(true)` only on an exact match. A record with a
    /// different password fails with [`StoreError::InvalidCredentials`];
    /// a missing record fails with [`StoreError::NotFound`].
    #[instrument(skip(self, password))]
    pub async fn verify_credentials(&self, email: &str, password: &str) -> StoreResult<bool> {
        let email = email.to_string();
        let password = password.to_string();
        self.db
            .execute(move |conn| {
                let stored = conn.query_row(
                    "SELECT password FROM users WHERE email = ?1",
                    rusqlite::params![email],
                    |row| row.get::<_, String>(0),
                );
                match stored {
                    Ok(stored) if stored == password => Ok(true),
                    Ok(_) => Err(StoreError::InvalidCredentials),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound {
                        entity: "user",
                        id: email,
                    }),
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    /// The first record (ordered by email) holding the session flag, or
    /// `None` when nobody is logged in.
    #[instrument(skip(self))]
    pub async fn find_logged_in(&self) -> StoreResult<Option<User>> {
        self.db
            .execute(|conn| {
                let result = conn.query_row(
                    "SELECT email, id, firstname, lastname, password, phone, birthday, img, \
                     login_success, tasks, completed_tasks, deleted_tasks \
                     FROM users WHERE login_success = 1 ORDER BY email LIMIT 1",
                    [],
                    read_user_row,
                );
                match result {
                    Ok(row) => row.into_user().map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    /// Set or clear the session flag for one user.
    ///
    /// Setting it true first clears every other user's flag in the same
    /// transaction, so at most one session exists at any time.
    #[instrument(skip(self))]
    pub async fn set_login_status(&self, email: &str, status: bool) -> StoreResult<()> {
        let email = email.to_string();
        self.db
            .execute_mut(move |conn| {
                let tx = conn.transaction()?;
                if status {
                    tx.execute(
                        "UPDATE users SET login_success = 0 WHERE login_success = 1 AND email <> ?1",
                        rusqlite::params![email],
                    )?;
                }
                let updated = tx.execute(
                    "UPDATE users SET login_success = ?2 WHERE email = ?1",
                    rusqlite::params![email, status],
                )?;
                if updated == 0 {
                    // Dropping the transaction rolls back the clearing pass.
                    return Err(StoreError::NotFound {
                        entity: "user",
                        id: email,
                    });
                }
                tx.commit()?;
                Ok(())
            })
            .await
    }

    /// Replace the active task list for one user.
    #[instrument(skip(self, tasks))]
    pub async fn save_tasks(&self, email: &str, tasks: &[Task]) -> StoreResult<()> {
        let email = email.to_string();
        let encoded = serde_json::to_string(tasks)?;
        self.db
            .execute(move |conn| {
                let updated = conn.execute(
                    "UPDATE users SET tasks = ?2 WHERE email = ?1",
                    rusqlite::params![email, encoded],
                )?;
                if updated == 0 {
                    return Err(StoreError::NotFound {
                        entity: "user",
                        id: email,
                    });
                }
                Ok(())
            })
            .await
    }

    /// Persist a shrunken task list and the archive it grew into, as one
    /// UPDATE so the task cannot exist in both places or neither.
    #[instrument(skip(self, tasks, archived))]
    pub async fn archive_task_lists(
        &self,
        email: &str,
        tasks: &[Task],
        archive: Archive,
        archived: &[Task],
    ) -> StoreResult<()> {
        let email = email.to_string();
        let tasks = serde_json::to_string(tasks)?;
        let archived = serde_json::to_string(archived)?;
        let sql = format!(
            "UPDATE users SET tasks = ?2, {} = ?3 WHERE email = ?1",
            archive.column()
        );
        self.db
            .execute(move |conn| {
                let updated =
                    conn.execute(&sql, rusqlite::params![email, tasks, archived])?;
                if updated == 0 {
                    return Err(StoreError::NotFound {
                        entity: "user",
                        id: email,
                    });
                }
                Ok(())
            })
            .await
    }

    /// Put a whole record at an unchanged key.
    ///
    /// `user.email` must equal `email`; the key column is not touched.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn update(&self, email: &str, user: &User) -> StoreResult<()> {
        let email = email.to_string();
        let row = InsertRow::encode(user)?;
        self.db
            .execute(move |conn| {
                let updated = conn.execute(
                    "UPDATE users SET id = ?2, firstname = ?3, lastname = ?4, password = ?5, \
                     phone = ?6, birthday = ?7, img = ?8, login_success = ?9, tasks = ?10, \
                     completed_tasks = ?11, deleted_tasks = ?12 \
                     WHERE email = ?1",
                    rusqlite::params![
                        email,
                        row.id,
                        row.firstname,
                        row.lastname,
                        row.password,
                        row.phone,
                        row.birthday,
                        row.img,
                        row.login_success,
                        row.tasks,
                        row.completed_tasks,
                        row.deleted_tasks,
                    ],
                )?;
                if updated == 0 {
                    return Err(StoreError::NotFound {
                        entity: "user",
                        id: email,
                    });
                }
                Ok(())
            })
            .await
    }

    /// Move a record to a new email key: delete at the old key and insert
    /// the merged record at `user.email`, inside one transaction.
    ///
    /// The primary key is immutable in place, so this is the only way an
    /// email change persists.
    #[instrument(skip_all, fields(old_email = %old_email, new_email = %user.email))]
    pub async fn rekey(&self, old_email: &str, user: &User) -> StoreResult<()> {
        let old_email = old_email.to_string();
        let row = InsertRow::encode(user)?;
        self.db
            .execute_mut(move |conn| {
                let tx = conn.transaction()?;
                let deleted = tx.execute(
                    "DELETE FROM users WHERE email = ?1",
                    rusqlite::params![old_email],
                )?;
                if deleted == 0 {
                    return Err(StoreError::NotFound {
                        entity: "user",
                        id: old_email,
                    });
                }
                tx.execute(
                    "INSERT INTO users (email, id, firstname, lastname, password, phone, birthday, img, \
                     login_success, tasks, completed_tasks, deleted_tasks) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    rusqlite::params![
                        row.email,
                        row.id,
                        row.firstname,
                        row.lastname,
                        row.password,
                        row.phone,
                        row.birthday,
                        row.img,
                        row.login_success,
                        row.tasks,
                        row.completed_tasks,
                        row.deleted_tasks,
                    ],
                )
                .map_err(|e| {
                    if let rusqlite::Error::SqliteFailure(ref err, _) = e
                        && err.code == rusqlite::ErrorCode::ConstraintViolation
                    {
                        return StoreError::DuplicateEmail(row.email.clone());
                    }
                    StoreError::Sqlite(e)
                })?;
                tx.commit()?;
                Ok(())
            })
            .await?;

        debug!("user record rekeyed");
        Ok(())
    }

    /// `true` iff the persisted task list for `email` already contains a
    /// task with `id`. Collision probe for the id allocator.
    #[instrument(skip(self))]
    pub async fn task_id_exists(&self, email: &str, id: u32) -> StoreResult<bool> {
        let email = email.to_string();
        self.db
            .execute(move |conn| {
                let encoded = conn.query_row(
                    "SELECT tasks FROM users WHERE email = ?1",
                    rusqlite::params![email],
                    |row| row.get::<_, String>(0),
                );
                let encoded = match encoded {
                    Ok(encoded) => encoded,
                    Err(rusqlite::Error::QueryReturnedNoRows) => {
                        return Err(StoreError::NotFound {
                            entity: "user",
                            id: email,
                        });
                    }
                    Err(e) => return Err(StoreError::Sqlite(e)),
                };
                let tasks: Vec<Task> = serde_json::from_str(&encoded)?;
                Ok(tasks.iter().any(|t| t.id == id))
            })
            .await
    }

    /// Return the total number of user records.
    #[instrument(skip(self))]
    pub async fn count(&self) -> StoreResult<i64> {
        self.db
            .execute(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
                Ok(count)
            })
            .await
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Internal row mapping
// ═══════════════════════════════════════════════════════════════════════

/// Raw row data from SQLite before the task columns are decoded.
struct UserRow {
    email: String,
    id: Option<i64>,
    firstname: String,
    lastname: String,
    password: String,
    phone: String,
    birthday: String,
    img: String,
    login_success: bool,
    tasks: String,
    completed_tasks: String,
    deleted_tasks: String,
}

fn read_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        email: row.get(0)?,
        id: row.get(1)?,
        firstname: row.get(2)?,
        lastname: row.get(3)?,
        password: row.get(4)?,
        phone: row.get(5)?,
        birthday: row.get(6)?,
        img: row.get(7)?,
        login_success: row.get(8)?,
        tasks: row.get(9)?,
        completed_tasks: row.get(10)?,
        deleted_tasks: row.get(11)?,
    })
}

impl UserRow {
    fn into_user(self) -> StoreResult<User> {
        Ok(User {
            id: self.id,
            firstname: self.firstname,
            lastname: self.lastname,
            email: self.email,
            password: self.password,
            phone: self.phone,
            birthday: self.birthday,
            img: self.img,
            login_success: self.login_success,
            tasks: serde_json::from_str(&self.tasks)?,
            completed_tasks: serde_json::from_str(&self.completed_tasks)?,
            deleted_tasks: serde_json::from_str(&self.deleted_tasks)?,
        })
    }
}

/// A user record with the task columns pre-encoded, ready to bind.
struct InsertRow {
    email: String,
    id: Option<i64>,
    firstname: String,
    lastname: String,
    password: String,
    phone: String,
    birthday: String,
    img: String,
    login_success: bool,
    tasks: String,
    completed_tasks: String,
    deleted_tasks: String,
}

impl InsertRow {
    fn encode(user: &User) -> StoreResult<Self> {
        Ok(Self {
            email: user.email.clone(),
            id: user.id,
            firstname: user.firstname.clone(),
            lastname: user.lastname.clone(),
            password: user.password.clone(),
            phone: user.phone.clone(),
            birthday: user.birthday.clone(),
            img: user.img.clone(),
            login_success: user.login_success,
            tasks: serde_json::to_string(&user.tasks)?,
            completed_tasks: serde_json::to_string(&user.completed_tasks)?,
            deleted_tasks: serde_json::to_string(&user.deleted_tasks)?,
        })
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Create an in-memory database with the users table for testing.
    async fn setup_store() -> UserStore {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        UserStore::new(db)
    }

    fn sample_user(email: &str) -> User {
        User {
            id: None,
            firstname: "Ann".to_string(),
            lastname: String::new(),
            email: email.to_string(),
            password: "password1".to_string(),
            phone: String::new(),
            birthday: String::new(),
            img: "img/nouser.png".to_string(),
            login_success: false,
            tasks: Vec::new(),
            completed_tasks: Vec::new(),
            deleted_tasks: Vec::new(),
        }
    }

    fn sample_task(id: u32, date: &str, time: &str, duration: f64) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            description: None,
            date: date.to_string(),
            time: time.to_string(),
            duration,
        }
    }

    #[tokio::test]
    async fn insert_and_get_user() {
        let store = setup_store().await;
        store.insert(&sample_user("ann@x.com")).await.unwrap();

        let fetched = store.get("ann@x.com").await.unwrap().unwrap();
        assert_eq!(fetched.email, "ann@x.com");
        assert_eq!(fetched.firstname, "Ann");
        assert_eq!(fetched.img, "img/nouser.png");
        assert!(fetched.id.is_none());
        assert!(!fetched.login_success);
        assert!(fetched.tasks.is_empty());
        assert!(fetched.completed_tasks.is_empty());
        assert!(fetched.deleted_tasks.is_empty());
    }

    #[tokio::test]
    async fn get_nonexistent_user_returns_none() {
        let store = setup_store().await;
        assert!(store.get("ghost@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn email_exists_flips_after_insert() {
        let store = setup_store().await;
        assert!(!store.email_exists("ann@x.com").await.unwrap());

        store.insert(&sample_user("ann@x.com")).await.unwrap();
        assert!(store.email_exists("ann@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let store = setup_store().await;
        store.insert(&sample_user("ann@x.com")).await.unwrap();

        let result = store.insert(&sample_user("ann@x.com")).await;
        match result.unwrap_err() {
            StoreError::DuplicateEmail(email) => assert_eq!(email, "ann@x.com"),
            other => panic!("expected DuplicateEmail, got: {other}"),
        }
    }

    #[tokio::test]
    async fn verify_credentials_exact_match() {
        let store = setup_store().await;
        store.insert(&sample_user("ann@x.com")).await.unwrap();

        assert!(store
            .verify_credentials("ann@x.com", "password1")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn verify_credentials_wrong_password() {
        let store = setup_store().await;
        store.insert(&sample_user("ann@x.com")).await.unwrap();

        let result = store.verify_credentials("ann@x.com", "wrong-pass").await;
        assert!(matches!(result, Err(StoreError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn verify_credentials_unknown_user() {
        let store = setup_store().await;
        let result = store.verify_credentials("ghost@x.com", "password1").await;
        match result.unwrap_err() {
            StoreError::NotFound { entity, .. } => assert_eq!(entity, "user"),
            other => panic!("expected NotFound, got: {other}"),
        }
    }

    #[tokio::test]
    async fn find_logged_in_when_nobody_is() {
        let store = setup_store().await;
        store.insert(&sample_user("ann@x.com")).await.unwrap();

        assert!(store.find_logged_in().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_logged_in_returns_flagged_user() {
        let store = setup_store().await;
        store.insert(&sample_user("ann@x.com")).await.unwrap();
        store.insert(&sample_user("ben@x.com")).await.unwrap();
        store.set_login_status("ben@x.com", true).await.unwrap();

        let found = store.find_logged_in().await.unwrap().unwrap();
        assert_eq!(found.email, "ben@x.com");
        assert!(found.login_success);
    }

    #[tokio::test]
    async fn set_login_status_clears_other_sessions() {
        let store = setup_store().await;
        store.insert(&sample_user("ann@x.com")).await.unwrap();
        store.insert(&sample_user("ben@x.com")).await.unwrap();

        store.set_login_status("ann@x.com", true).await.unwrap();
        store.set_login_status("ben@x.com", true).await.unwrap();

        let ann = store.get("ann@x.com").await.unwrap().unwrap();
        let ben = store.get("ben@x.com").await.unwrap().unwrap();
        assert!(!ann.login_success);
        assert!(ben.login_success);
    }

    #[tokio::test]
    async fn set_login_status_false_logs_out() {
        let store = setup_store().await;
        store.insert(&sample_user("ann@x.com")).await.unwrap();
        store.set_login_status("ann@x.com", true).await.unwrap();
        store.set_login_status("ann@x.com", false).await.unwrap();

        assert!(store.find_logged_in().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_login_status_unknown_user() {
        let store = setup_store().await;
        let result = store.set_login_status("ghost@x.com", true).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn save_tasks_roundtrip() {
        let store = setup_store().await;
        store.insert(&sample_user("ann@x.com")).await.unwrap();

        let tasks = vec![
            sample_task(17, "2024-06-01", "09:00", 1.0),
            Task {
                description: Some("bring the slides".to_string()),
                ..sample_task(23, "2024-06-01", "10:30", 0.5)
            },
        ];
        store.save_tasks("ann@x.com", &tasks).await.unwrap();

        let fetched = store.get("ann@x.com").await.unwrap().unwrap();
        assert_eq!(fetched.tasks, tasks);
    }

    #[tokio::test]
    async fn save_tasks_unknown_user() {
        let store = setup_store().await;
        let result = store.save_tasks("ghost@x.com", &[]).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn archive_task_lists_updates_both_columns() {
        let store = setup_store().await;
        store.insert(&sample_user("ann@x.com")).await.unwrap();

        let kept = vec![sample_task(1, "2024-06-01", "09:00", 1.0)];
        let done = vec![sample_task(2, "2024-06-01", "11:00", 1.0)];
        store
            .archive_task_lists("ann@x.com", &kept, Archive::Completed, &done)
            .await
            .unwrap();

        let fetched = store.get("ann@x.com").await.unwrap().unwrap();
        assert_eq!(fetched.tasks, kept);
        assert_eq!(fetched.completed_tasks, done);
        assert!(fetched.deleted_tasks.is_empty());
    }

    #[tokio::test]
    async fn archive_task_lists_deleted_column() {
        let store = setup_store().await;
        store.insert(&sample_user("ann@x.com")).await.unwrap();

        let dropped = vec![sample_task(5, "2024-06-02", "08:00", 2.0)];
        store
            .archive_task_lists("ann@x.com", &[], Archive::Deleted, &dropped)
            .await
            .unwrap();

        let fetched = store.get("ann@x.com").await.unwrap().unwrap();
        assert!(fetched.tasks.is_empty());
        assert!(fetched.completed_tasks.is_empty());
        assert_eq!(fetched.deleted_tasks, dropped);
    }

    #[tokio::test]
    async fn update_in_place_keeps_the_key() {
        let store = setup_store().await;
        store.insert(&sample_user("ann@x.com")).await.unwrap();

        let mut edited = sample_user("ann@x.com");
        edited.lastname = "Smith".to_string();
        edited.phone = "555-0100".to_string();
        store.update("ann@x.com", &edited).await.unwrap();

        let fetched = store.get("ann@x.com").await.unwrap().unwrap();
        assert_eq!(fetched.lastname, "Smith");
        assert_eq!(fetched.phone, "555-0100");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_unknown_user() {
        let store = setup_store().await;
        let result = store.update("ghost@x.com", &sample_user("ghost@x.com")).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn rekey_moves_the_record() {
        let store = setup_store().await;
        let mut user = sample_user("old@x.com");
        user.tasks = vec![sample_task(9, "2024-06-01", "09:00", 1.0)];
        store.insert(&user).await.unwrap();

        user.email = "new@x.com".to_string();
        store.rekey("old@x.com", &user).await.unwrap();

        assert!(!store.email_exists("old@x.com").await.unwrap());
        assert!(store.email_exists("new@x.com").await.unwrap());

        let moved = store.get("new@x.com").await.unwrap().unwrap();
        assert_eq!(moved.firstname, "Ann");
        assert_eq!(moved.tasks.len(), 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rekey_unknown_source() {
        let store = setup_store().await;
        let result = store.rekey("ghost@x.com", &sample_user("new@x.com")).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn rekey_into_taken_key_rolls_back() {
        let store = setup_store().await;
        store.insert(&sample_user("ann@x.com")).await.unwrap();
        store.insert(&sample_user("ben@x.com")).await.unwrap();

        let mut moved = sample_user("ann@x.com");
        moved.email = "ben@x.com".to_string();
        let result = store.rekey("ann@x.com", &moved).await;
        assert!(matches!(result, Err(StoreError::DuplicateEmail(_))));

        // The delete half must have rolled back with the failed insert.
        assert!(store.email_exists("ann@x.com").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn task_id_exists_probes_persisted_list() {
        let store = setup_store().await;
        let mut user = sample_user("ann@x.com");
        user.tasks = vec![sample_task(42, "2024-06-01", "09:00", 1.0)];
        store.insert(&user).await.unwrap();

        assert!(store.task_id_exists("ann@x.com", 42).await.unwrap());
        assert!(!store.task_id_exists("ann@x.com", 43).await.unwrap());
    }

    #[tokio::test]
    async fn task_id_exists_unknown_user() {
        let store = setup_store().await;
        let result = store.task_id_exists("ghost@x.com", 1).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn fractional_durations_survive_the_roundtrip() {
        let store = setup_store().await;
        store.insert(&sample_user("ann@x.com")).await.unwrap();

        let tasks = vec![sample_task(1, "2024-06-01", "09:00", 1.5)];
        store.save_tasks("ann@x.com", &tasks).await.unwrap();

        let fetched = store.get("ann@x.com").await.unwrap().unwrap();
        assert!((fetched.tasks[0].duration - 1.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn count_users() {
        let store = setup_store().await;
        assert_eq!(store.count().await.unwrap(), 0);

        store.insert(&sample_user("ann@x.com")).await.unwrap();
        store.insert(&sample_user("ben@x.com")).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }
}
