//! Local accounts. Passwords are compared as stored; this is a personal
//! tracker on one device, not an authentication system.

use crate::errors::{TrackerError, TrackerResult};
use crate::models::{ProfileUpdate, User, UserProfile};
use crate::storage::KeyValueStore;
use crate::store::{new_record_id, no_migration, RecordStore};
use tracing::{error, info};

pub const AUTH_STORAGE_KEY: &str = "auth-storage";
pub const SESSION_STORAGE_KEY: &str = "auth-session";
const AUTH_SCHEMA_VERSION: u32 = 0;
const MAX_BIO_CHARS: usize = 200;
const NEW_USER_BIO: &str = "New user";

/// The credential check the rest of the tracker relies on. Implemented by
/// [`crate::Tracker`], which stamps accounts with its injected clock.
pub trait CredentialCheck {
    fn login(&mut self, username: &str, password: &str) -> bool;
    fn register(&mut self, username: &str, password: &str) -> bool;
}

pub fn validate_username(username: &str) -> TrackerResult<()> {
    if username.trim().chars().count() < 3 {
        return Err(TrackerError::validation("username must be at least 3 characters"));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(TrackerError::validation(
            "username may only contain letters, digits and underscores",
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> TrackerResult<()> {
    if password.chars().count() < 6 {
        return Err(TrackerError::validation("password must be at least 6 characters"));
    }
    Ok(())
}

pub fn validate_bio(bio: &str) -> TrackerResult<()> {
    if bio.chars().count() > MAX_BIO_CHARS {
        return Err(TrackerError::validation(format!(
            "bio must be at most {MAX_BIO_CHARS} characters"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: RecordStore<User>,
    session: Option<String>,
    session_dirty: bool,
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self {
            users: RecordStore::new(AUTH_STORAGE_KEY, AUTH_SCHEMA_VERSION),
            session: None,
            session_dirty: false,
        }
    }
}

impl UserDirectory {
    pub fn load(kv: &dyn KeyValueStore) -> Self {
        let users: RecordStore<User> =
            RecordStore::load(kv, AUTH_STORAGE_KEY, AUTH_SCHEMA_VERSION, no_migration);
        let session = match kv.get(SESSION_STORAGE_KEY) {
            Ok(stored) => stored.filter(|id| users.find(|u| &u.id == id).is_some()),
            Err(err) => {
                error!("failed to read session: {err}");
                None
            }
        };
        Self {
            users,
            session,
            session_dirty: false,
        }
    }

    /// Re-reads accounts written elsewhere; the session stays as it is.
    pub fn reload_accounts(&mut self, kv: &dyn KeyValueStore) {
        self.users = RecordStore::load(kv, AUTH_STORAGE_KEY, AUTH_SCHEMA_VERSION, no_migration);
    }

    pub fn flush(&mut self, kv: &dyn KeyValueStore) -> TrackerResult<()> {
        self.users.flush(kv)?;
        if self.session_dirty {
            kv.set(SESSION_STORAGE_KEY, self.session.as_deref().unwrap_or_default())?;
            self.session_dirty = false;
        }
        Ok(())
    }

    pub fn current_user_id(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        let id = self.session.as_deref()?;
        self.users.find(|u| u.id == id).map(UserProfile::from)
    }

    fn sign_in(&mut self, id: String) {
        self.session = Some(id);
        self.session_dirty = true;
    }

    /// Registers and signs in. Usernames are unique.
    pub fn register_user(&mut self, username: &str, password: &str, now: &str) -> TrackerResult<UserProfile> {
        validate_username(username)?;
        validate_password(password)?;
        if self.users.find(|u| u.username == username).is_some() {
            return Err(TrackerError::validation("username is already taken"));
        }

        let user = User {
            id: new_record_id(),
            username: username.to_string(),
            password: password.to_string(),
            bio: Some(NEW_USER_BIO.to_string()),
            avatar: None,
            created_at: now.to_string(),
        };
        let profile = UserProfile::from(&user);
        self.users.append(user);
        self.sign_in(profile.id.clone());
        info!(username, "user registered");
        Ok(profile)
    }

    pub fn login_user(&mut self, username: &str, password: &str) -> TrackerResult<UserProfile> {
        let profile = self
            .users
            .find(|u| u.username == username && u.password == password)
            .map(UserProfile::from)
            .ok_or_else(|| TrackerError::validation("invalid username or password"))?;
        self.sign_in(profile.id.clone());
        Ok(profile)
    }

    pub fn logout(&mut self) {
        if self.session.take().is_some() {
            self.session_dirty = true;
        }
    }

    pub fn update_profile(&mut self, update: ProfileUpdate) -> TrackerResult<UserProfile> {
        let Some(id) = self.session.clone() else {
            return Err(TrackerError::NotFound("no user is signed in".to_string()));
        };
        if let Some(bio) = &update.bio {
            validate_bio(bio)?;
        }

        self.users.update_where(
            |u| u.id == id,
            |u| {
                if let Some(bio) = &update.bio {
                    u.bio = Some(bio.clone());
                }
                if let Some(avatar) = &update.avatar {
                    u.avatar = Some(avatar.clone());
                }
            },
        );
        self.current_user()
            .ok_or_else(|| TrackerError::NotFound(format!("user {id}")))
    }
}
