//! User profiles and the account flow tying them to the auth service.

use crate::auth::AuthService;
use crate::store::{encode, DocumentStore, Fields, Query};
use crate::{Error, Result, UserProfile};
use chrono::Utc;
use serde_json::Value;

/// Collection holding one profile per user
pub const USERS: &str = "users";

/// Profile documents keyed by the auth user id
pub struct UserRepository<'a, S: DocumentStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: DocumentStore + ?Sized> UserRepository<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn create_profile(
        &mut self,
        user_id: &str,
        email: &str,
        display_name: &str,
    ) -> Result<UserProfile> {
        let display_name = validate_display_name(display_name)?;
        if self.profile(user_id)?.is_some() {
            return Err(Error::Validation(format!(
                "user {} already has a profile",
                user_id
            )));
        }

        let mut profile = UserProfile {
            id: String::new(),
            user_id: user_id.to_string(),
            email: email.trim().to_string(),
            display_name,
            created_at: Utc::now(),
        };
        profile.id = self.store.create(USERS, encode(&profile)?)?;
        tracing::debug!("Created profile {} for user {}", profile.id, user_id);
        Ok(profile)
    }

    pub fn profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let query = Query::collection(USERS).where_eq("user_id", user_id).limit(1);
        match self.store.query(&query)?.into_iter().next() {
            Some(doc) => {
                let mut profile: UserProfile = doc.decode()?;
                profile.id = doc.id;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    pub fn update_display_name(&mut self, user_id: &str, display_name: &str) -> Result<UserProfile> {
        let display_name = validate_display_name(display_name)?;
        let mut profile = self.require(user_id)?;

        let mut fields = Fields::new();
        fields.insert("display_name".into(), Value::String(display_name.clone()));
        self.store.update(USERS, &profile.id, fields)?;

        profile.display_name = display_name;
        Ok(profile)
    }

    pub fn delete_profile(&mut self, user_id: &str) -> Result<()> {
        let profile = self.require(user_id)?;
        self.store.delete(USERS, &profile.id)
    }

    fn require(&self, user_id: &str) -> Result<UserProfile> {
        self.profile(user_id)?
            .ok_or_else(|| Error::not_found(USERS, user_id))
    }
}

fn validate_display_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("display name cannot be empty".into()));
    }
    Ok(name.to_string())
}

/// Registration and sign-in across the auth service and the profile store
pub struct AccountService<'a, A: AuthService + ?Sized, S: DocumentStore + ?Sized> {
    auth: &'a mut A,
    store: &'a mut S,
}

impl<'a, A: AuthService + ?Sized, S: DocumentStore + ?Sized> AccountService<'a, A, S> {
    pub fn new(auth: &'a mut A, store: &'a mut S) -> Self {
        Self { auth, store }
    }

    /// Create the auth account, then its profile
    ///
    /// If the profile cannot be stored the new account is signed out again.
    /// The account itself remains registered without a profile.
    pub fn register(
        &mut self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<UserProfile> {
        // Reject a bad name before an account exists without a profile
        validate_display_name(display_name)?;
        let user_id = self.auth.register(email, password)?;
        match UserRepository::new(&mut *self.store).create_profile(&user_id, email, display_name) {
            Ok(profile) => Ok(profile),
            Err(e) => {
                tracing::warn!("No profile for new account {}: {}", email, e);
                if let Err(sign_out) = self.auth.sign_out() {
                    tracing::warn!("Failed to sign out {}: {}", email, sign_out);
                }
                Err(e)
            }
        }
    }

    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<String> {
        self.auth.sign_in(email, password)
    }

    pub fn sign_out(&mut self) -> Result<()> {
        self.auth.sign_out()
    }

    /// The signed-in user id, or [`Error::NotSignedIn`]
    pub fn require_user(&self) -> Result<String> {
        self.auth.current_user_id().ok_or(Error::NotSignedIn)
    }

    pub fn current_profile(&mut self) -> Result<Option<UserProfile>> {
        match self.auth.current_user_id() {
            Some(user_id) => UserRepository::new(&mut *self.store).profile(&user_id),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::LocalAuth;
    use crate::local_store::LocalStore;

    #[test]
    fn test_profile_lifecycle() {
        let mut store = LocalStore::in_memory();
        let mut users = UserRepository::new(&mut store);

        let created = users.create_profile("u1", "ana@example.com", " Ana ").unwrap();
        assert_eq!(created.display_name, "Ana");

        let fetched = users.profile("u1").unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.email, "ana@example.com");

        let renamed = users.update_display_name("u1", "Ana B").unwrap();
        assert_eq!(renamed.display_name, "Ana B");
        assert_eq!(users.profile("u1").unwrap().unwrap().display_name, "Ana B");

        users.delete_profile("u1").unwrap();
        assert!(users.profile("u1").unwrap().is_none());
        assert!(matches!(
            users.delete_profile("u1"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_duplicate_profile_rejected() {
        let mut store = LocalStore::in_memory();
        let mut users = UserRepository::new(&mut store);
        users.create_profile("u1", "ana@example.com", "Ana").unwrap();
        assert!(users.create_profile("u1", "ana@example.com", "Ana").is_err());
    }

    #[test]
    fn test_register_creates_profile() {
        let mut auth = LocalAuth::in_memory();
        let mut store = LocalStore::in_memory();
        let mut accounts = AccountService::new(&mut auth, &mut store);

        let profile = accounts
            .register("ana@example.com", "secret1", "Ana")
            .unwrap();
        assert_eq!(accounts.require_user().unwrap(), profile.user_id);
        assert_eq!(
            accounts.current_profile().unwrap().unwrap().display_name,
            "Ana"
        );

        accounts.sign_out().unwrap();
        assert!(matches!(accounts.require_user(), Err(Error::NotSignedIn)));
        assert!(accounts.current_profile().unwrap().is_none());
    }

    #[test]
    fn test_blank_name_creates_no_account() {
        let mut auth = LocalAuth::in_memory();
        let mut store = LocalStore::in_memory();
        {
            let mut accounts = AccountService::new(&mut auth, &mut store);
            assert!(accounts.register("ana@example.com", "secret1", "  ").is_err());
        }
        assert!(auth.current_user_id().is_none());
        assert!(auth.sign_in("ana@example.com", "secret1").is_err());
    }

    #[test]
    fn test_failed_profile_leaves_nobody_signed_in() {
        let temp_dir = tempfile::tempdir().unwrap();
        // A directory in place of the snapshot makes every store write fail
        let path = temp_dir.path().join("store.json");
        std::fs::create_dir(&path).unwrap();
        let mut store = LocalStore::open(&path).unwrap();
        let mut auth = LocalAuth::in_memory();

        let result = AccountService::new(&mut auth, &mut store)
            .register("ana@example.com", "secret1", "Ana");
        assert!(matches!(result, Err(Error::Store(_))));
        assert!(auth.current_user_id().is_none());
    }
}
