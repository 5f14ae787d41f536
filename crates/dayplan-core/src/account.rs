//! Account operations: registration, login, and profile maintenance.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use dayplan_store::{StoreError, User};

use crate::error::{PlannerError, Result};
use crate::{Planner, validate};

/// Placeholder avatar for accounts registered without an image.
pub const DEFAULT_AVATAR: &str = "img/nouser.png";

/// The profile fields a user may edit — the legal merge surface of a
/// stored record. Anything not listed here cannot be changed through
/// [`Planner::update_profile`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub firstname: String,
    pub email: String,
    pub password: String,
    pub lastname: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<String>,
}

impl ProfilePatch {
    /// Merge the patch over `user`, touching only the enumerated fields.
    fn merge_into(&self, user: &User) -> User {
        let mut merged = user.clone();
        merged.firstname = self.firstname.clone();
        merged.email = self.email.clone();
        merged.password = self.password.clone();
        if let Some(lastname) = &self.lastname {
            merged.lastname = lastname.clone();
        }
        if let Some(phone) = &self.phone {
            merged.phone = phone.clone();
        }
        if let Some(birthday) = &self.birthday {
            merged.birthday = birthday.clone();
        }
        merged
    }
}

impl Planner {
    /// Register a new account.
    ///
    /// The email must be free and the fields must pass
    /// [`validate::registration`]. The new user starts logged out with
    /// empty task collections and the placeholder avatar.
    #[instrument(skip(self, password))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<bool> {
        if self.users.email_exists(email).await? {
            return Err(PlannerError::DuplicateEmail);
        }
        validate::registration(name, email, password)?;

        let user = User {
            id: None,
            firstname: name.to_string(),
            lastname: String::new(),
            email: email.to_string(),
            password: password.to_string(),
            phone: String::new(),
            birthday: String::new(),
            img: DEFAULT_AVATAR.to_string(),
            login_success: false,
            tasks: Vec::new(),
            completed_tasks: Vec::new(),
            deleted_tasks: Vec::new(),
        };
        self.users.insert(&user).await?;

        debug!(email, "user registered");
        Ok(true)
    }

    /// Check credentials and open a session.
    ///
    /// On success the user's login flag is set (and any other session
    /// cleared). Mismatches and unknown emails map to the user-facing
    /// [`PlannerError::IncorrectPassword`] / [`PlannerError::UnknownUser`].
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<bool> {
        match self.users.verify_credentials(email, password).await {
            Ok(_) => {}
            Err(StoreError::InvalidCredentials) => return Err(PlannerError::IncorrectPassword),
            Err(StoreError::NotFound { .. }) => return Err(PlannerError::UnknownUser),
            Err(other) => return Err(other.into()),
        }
        self.users.set_login_status(email, true).await?;

        debug!(email, "login succeeded");
        Ok(true)
    }

    /// Unconditional login-flag update; `false` is an explicit logout.
    #[instrument(skip(self))]
    pub async fn set_login_status(&self, email: &str, status: bool) -> Result<()> {
        self.users.set_login_status(email, status).await?;
        Ok(())
    }

    /// The user currently holding the session flag, if any.
    pub async fn logged_in_user(&self) -> Result<Option<User>> {
        Ok(self.users.find_logged_in().await?)
    }

    pub(crate) async fn require_logged_in(&self) -> Result<User> {
        self.users
            .find_logged_in()
            .await?
            .ok_or(PlannerError::NoActiveUser)
    }

    /// Apply edited profile fields to the active account.
    ///
    /// Field validation only runs when the name, email, or password
    /// actually changed. An email change moves the record to the new key
    /// ([`dayplan_store::UserStore::rekey`]) after checking the key is
    /// free; everything else is an in-place update.
    #[instrument(skip_all, fields(email = %patch.email))]
    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<User> {
        let current = self.require_logged_in().await?;

        let credentials_changed = current.firstname != patch.firstname
            || current.email != patch.email
            || current.password != patch.password;
        if credentials_changed {
            validate::profile(&patch.firstname, &patch.email, &patch.password)?;
        }

        let email_changed = current.email != patch.email;
        if email_changed && self.users.email_exists(&patch.email).await? {
            return Err(PlannerError::DuplicateEmail);
        }

        let merged = patch.merge_into(&current);
        if email_changed {
            self.users.rekey(&current.email, &merged).await?;
        } else {
            self.users.update(&current.email, &merged).await?;
        }

        debug!(email_changed, "profile updated");
        Ok(merged)
    }

    /// Swap the avatar on the active account.
    ///
    /// No field validation — the image is an opaque data URI or path.
    #[instrument(skip_all)]
    pub async fn update_profile_image(&self, img: &str) -> Result<User> {
        let mut user = self.require_logged_in().await?;
        user.img = img.to_string();
        let email = user.email.clone();
        self.users.update(&email, &user).await?;
        Ok(user)
    }
}

// ── tests ────────────────────────────────────────────────────────────
