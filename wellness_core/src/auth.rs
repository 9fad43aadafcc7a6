//! Authentication service interface and the bundled local implementation.

use crate::persist;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LEN: usize = 6;

/// Email/password accounts with a single signed-in user.
pub trait AuthService {
    /// Create an account and sign it in, returning the new user id
    fn register(&mut self, email: &str, password: &str) -> Result<String>;

    fn sign_in(&mut self, email: &str, password: &str) -> Result<String>;

    fn sign_out(&mut self) -> Result<()>;

    fn current_user_id(&self) -> Option<String>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Account {
    user_id: String,
    email: String,
    salt: String,
    password_hash: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct AuthSnapshot {
    /// Keyed by lowercased email
    #[serde(default)]
    accounts: BTreeMap<String, Account>,
    #[serde(default)]
    current_user: Option<String>,
}

/// Accounts kept in memory, optionally persisted to a JSON file
#[derive(Debug)]
pub struct LocalAuth {
    snapshot: AuthSnapshot,
    path: Option<PathBuf>,
}

impl LocalAuth {
    pub fn in_memory() -> Self {
        Self {
            snapshot: AuthSnapshot::default(),
            path: None,
        }
    }

    /// Load accounts and the signed-in session from a file
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot: AuthSnapshot = persist::load_json(&path)?;
        Ok(Self {
            snapshot,
            path: Some(path),
        })
    }

    /// Email of the signed-in user, if any
    pub fn current_email(&self) -> Option<&str> {
        let user_id = self.snapshot.current_user.as_deref()?;
        self.snapshot
            .accounts
            .values()
            .find(|a| a.user_id == user_id)
            .map(|a| a.email.as_str())
    }

    /// Apply a change to the latest snapshot, persist it, then make it current
    ///
    /// File-backed auth reloads under the file lock so accounts registered by
    /// other processes are not overwritten.
    fn commit<R, F>(&mut self, change: F) -> Result<R>
    where
        F: FnOnce(&mut AuthSnapshot) -> Result<R>,
    {
        let Some(path) = &self.path else {
            let mut next = self.snapshot.clone();
            let result = change(&mut next)?;
            self.snapshot = next;
            return Ok(result);
        };

        let _lock = persist::FileLock::acquire(path)?;
        let mut next: AuthSnapshot = persist::load_json(path)?;
        let result = change(&mut next)?;
        persist::save_json(path, &next)?;
        self.snapshot = next;
        Ok(result)
    }
}

impl AuthService for LocalAuth {
    fn register(&mut self, email: &str, password: &str) -> Result<String> {
        let email = email.trim();
        validate_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Auth(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let key = email.to_lowercase();
        let user_id = Uuid::new_v4().to_string();
        let salt = Uuid::new_v4().simple().to_string();
        let account = Account {
            user_id: user_id.clone(),
            email: email.to_string(),
            password_hash: hash_password(&salt, password),
            salt,
        };

        self.commit(|next| {
            if next.accounts.contains_key(&key) {
                return Err(Error::Auth("email is already registered".into()));
            }
            next.accounts.insert(key, account);
            next.current_user = Some(user_id.clone());
            Ok(())
        })?;

        tracing::info!("Registered account {}", email);
        Ok(user_id)
    }

    fn sign_in(&mut self, email: &str, password: &str) -> Result<String> {
        let user_id = self.commit(|next| {
            let invalid = || Error::Auth("invalid email or password".into());
            let account = next
                .accounts
                .get(&email.trim().to_lowercase())
                .ok_or_else(invalid)?;
            if hash_password(&account.salt, password) != account.password_hash {
                tracing::warn!("Rejected sign-in for {}", email);
                return Err(invalid());
            }
            let user_id = account.user_id.clone();
            next.current_user = Some(user_id.clone());
            Ok(user_id)
        })?;

        tracing::info!("Signed in {}", email);
        Ok(user_id)
    }

    fn sign_out(&mut self) -> Result<()> {
        if self.snapshot.current_user.is_none() {
            return Ok(());
        }
        self.commit(|next| {
            next.current_user = None;
            Ok(())
        })?;
        tracing::info!("Signed out");
        Ok(())
    }

    fn current_user_id(&self) -> Option<String> {
        self.snapshot.current_user.clone()
    }
}

fn validate_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::Auth(format!("'{}' is not a valid email address", email)))
    }
}

/// Hex SHA-256 of salt followed by password
fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
