//! Access tokens kept outside the client
//!
//! A [`TokenStore`] maps a Weibo uid to the token obtained for it earlier,
//! so a client can be rebuilt for that user with
//! [`WeiboBuilder::build_from_store`](crate::client::WeiboBuilder::build_from_store).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Token saved for one user
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    /// Absolute expiry in epoch seconds
    pub expires: i64,
}

impl std::fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredToken")
            .field("token", &"[REDACTED]")
            .field("expires", &self.expires)
            .finish()
    }
}

pub trait TokenStore {
    /// Token stored for `uid`. An empty token counts as absent.
    fn load(&self, uid: &str) -> Option<StoredToken>;
}

/// In-process [`TokenStore`]
#[derive(Debug, Default, Clone)]
pub struct MemoryTokenStore {
    tokens: HashMap<String, StoredToken>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uid: impl Into<String>, token: impl Into<String>, expires: i64) {
        self.tokens.insert(
            uid.into(),
            StoredToken {
                token: token.into(),
                expires,
            },
        );
    }

    pub fn remove(&mut self, uid: &str) -> Option<StoredToken> {
        self.tokens.remove(uid)
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self, uid: &str) -> Option<StoredToken> {
        self.tokens
            .get(uid)
            .filter(|stored| !stored.token.is_empty())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_inserted_token() {
        let mut store = MemoryTokenStore::new();
        store.insert("1750070171", "2.00abc", 1_700_000_000);

        let stored = store.load("1750070171").unwrap();
        assert_eq!(stored.token, "2.00abc");
        assert_eq!(stored.expires, 1_700_000_000);
        assert!(store.load("42").is_none());
    }

    #[test]
    fn test_empty_token_is_absent() {
        let mut store = MemoryTokenStore::new();
        store.insert("1750070171", "", 0);
        assert!(store.load("1750070171").is_none());
    }

    #[test]
    fn test_remove() {
        let mut store = MemoryTokenStore::new();
        store.insert("1", "t", 0);
        assert!(store.remove("1").is_some());
        assert!(store.load("1").is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let stored = StoredToken {
            token: "2.00secret".to_string(),
            expires: 1,
        };
        assert!(!format!("{:?}", stored).contains("2.00secret"));
    }
}
