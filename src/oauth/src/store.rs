// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Persistence for [Token]s.
//!
//! The client reads and writes tokens through the [TokenStore] trait, keyed
//! by the subject id (`openid`). Applications running more than one process,
//! or that need tokens to survive a restart, must supply a durable
//! implementation, typically backed by a table or collection with a unique
//! key on `openid`:
//!
//! ```
//! # use wechat_oauth::store::TokenStore;
//! # use wechat_oauth::token::Token;
//! # use wechat_oauth::Result;
//! #[derive(Debug)]
//! struct TableStore { /* connection pool */ }
//!
//! #[async_trait::async_trait]
//! impl TokenStore for TableStore {
//!     async fn get(&self, openid: &str) -> Result<Option<Token>> {
//!         // SELECT * FROM token WHERE openid = ?
//!         # let _ = openid;
//!         Ok(None)
//!     }
//!     async fn set(&self, openid: &str, token: Token) -> Result<()> {
//!         // REPLACE INTO token(access_token, expires_in, ...) VALUES(...)
//!         # let _ = (openid, token);
//!         Ok(())
//!     }
//! }
//! ```

use crate::Result;
use crate::token::Token;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Reads and writes tokens keyed by subject id.
///
/// Implementations report their own failures with
/// [Error::store][crate::errors::Error::store].
#[async_trait::async_trait]
pub trait TokenStore: std::fmt::Debug + Send + Sync {
    /// Returns the token stored for `openid`, if any.
    async fn get(&self, openid: &str) -> Result<Option<Token>>;

    /// Stores `token` for `openid`, replacing any previous token.
    async fn set(&self, openid: &str, token: Token) -> Result<()>;
}

#[async_trait::async_trait]
impl<T> TokenStore for Arc<T>
where
    T: TokenStore + ?Sized,
{
    async fn get(&self, openid: &str) -> Result<Option<Token>> {
        self.as_ref().get(openid).await
    }

    async fn set(&self, openid: &str, token: Token) -> Result<()> {
        self.as_ref().set(openid, token).await
    }
}

/// A [TokenStore] holding tokens in process memory.
///
/// Tokens are lost when the store is dropped and are not shared between
/// processes. Use it in tests and local development only.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: Mutex<HashMap<String, Token>>,
}

impl InMemoryTokenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(&self, openid: &str) -> Result<Option<Token>> {
        Ok(self.tokens.lock().await.get(openid).cloned())
    }

    async fn set(&self, openid: &str, token: Token) -> Result<()> {
        self.tokens.lock().await.insert(openid.to_string(), token);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::token::tests::test_token;

    mockall::mock! {
        #[derive(Debug)]
        pub TokenStore { }

        #[async_trait::async_trait]
        impl TokenStore for TokenStore {
            async fn get(&self, openid: &str) -> Result<Option<Token>>;
            async fn set(&self, openid: &str, token: Token) -> Result<()>;
        }
    }

    #[tokio::test]
    async fn missing() -> anyhow::Result<()> {
        let store = InMemoryTokenStore::new();
        assert_eq!(store.get("test-openid").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn roundtrip() -> anyhow::Result<()> {
        let store = InMemoryTokenStore::new();
        let token = test_token(1_700_000_000_123, 7200);
        store.set("test-openid", token.clone()).await?;

        let got = store.get("test-openid").await?;
        assert_eq!(got, Some(token));
        assert_eq!(got.map(|t| t.acquired_at), Some(1_700_000_000_123));
        Ok(())
    }

    #[tokio::test]
    async fn set_replaces() -> anyhow::Result<()> {
        let store = InMemoryTokenStore::new();
        store.set("test-openid", test_token(1000, 60)).await?;
        let newer = Token {
            access_token: "newer-access-token".to_string(),
            ..test_token(2000, 7200)
        };
        store.set("test-openid", newer.clone()).await?;

        assert_eq!(store.get("test-openid").await?, Some(newer));
        Ok(())
    }

    #[tokio::test]
    async fn shared() -> anyhow::Result<()> {
        let store = Arc::new(InMemoryTokenStore::new());
        let handle = store.clone();
        let token = test_token(1000, 60);
        handle.set("test-openid", token.clone()).await?;

        assert_eq!(store.get("test-openid").await?, Some(token));
        Ok(())
    }

    #[tokio::test]
    async fn keys_are_independent() -> anyhow::Result<()> {
        let store = InMemoryTokenStore::new();
        let token = test_token(1000, 60);
        store.set("openid-a", token.clone()).await?;

        assert_eq!(store.get("openid-a").await?, Some(token));
        assert_eq!(store.get("openid-b").await?, None);
        Ok(())
    }
}
