//! The persisted bearer token and the cached record of who it belongs to.

use crate::{
    storage::{Storage, StorageError},
    User,
};
use std::sync::Arc;

const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";

/// A bearer token together with the user it was issued to.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub token: String,
    pub user: User,
}

/// A best-effort cache of the current [`Credential`].
///
/// Storage failures are logged and then treated as "nobody is logged in",
/// and a half-written or unreadable entry is wiped the moment it is read.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    storage: Arc<dyn Storage>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self { CredentialStore { storage } }

    /// Persist both the token and the user.
    ///
    /// If only one of them could be written the other is removed again, so
    /// readers never see a token without its user.
    pub fn save(&self, token: &str, user: &User) {
        let user_json = match serde_json::to_string(user) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Unable to serialize user {}: {}", user.id, e);
                return;
            },
        };

        let result = self
            .storage
            .set(USER_KEY, &user_json)
            .and_then(|_| self.storage.set(TOKEN_KEY, token));

        if let Err(e) = result {
            log::warn!("Unable to persist the credentials: {}", e);
            self.clear();
        }
    }

    /// Read the persisted credential back, discarding it if it is
    /// incomplete or can't be parsed.
    pub fn load(&self) -> Option<Credential> {
        let (token, user) = match self.read_raw() {
            Ok(pair) => pair,
            Err(e @ StorageError::Corrupt { .. }) => {
                log::warn!("Discarding the persisted credentials: {}", e);
                self.clear();
                return None;
            },
            Err(e) => {
                log::warn!("Unable to read the persisted credentials: {}", e);
                return None;
            },
        };

        match (token, user) {
            (None, None) => None,
            (Some(token), Some(raw_user)) => {
                match serde_json::from_str::<User>(&raw_user) {
                    Ok(user) => Some(Credential { token, user }),
                    Err(e) => {
                        log::warn!(
                            "Discarding the persisted credentials because the user record is unreadable: {}",
                            e
                        );
                        self.clear();
                        None
                    },
                }
            },
            _ => {
                log::warn!("Discarding incomplete persisted credentials");
                self.clear();
                None
            },
        }
    }

    /// The raw persisted token, without checking the user record.
    pub fn token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                log::warn!("Unable to read the persisted token: {}", e);
                None
            },
        }
    }

    pub fn clear(&self) {
        for key in &[TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                log::warn!("Unable to remove \"{}\": {}", key, e);
            }
        }
    }

    fn read_raw(
        &self,
    ) -> Result<(Option<String>, Option<String>), StorageError> {
        let token = self.storage.get(TOKEN_KEY)?;
        let user = self.storage.get(USER_KEY)?;
        Ok((token, user))
    }
}
