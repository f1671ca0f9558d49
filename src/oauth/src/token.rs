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

//! Types and functions to work with OAuth [Token]s.

use serde::{Deserialize, Serialize};

/// An access/refresh token pair issued for one subject.
///
/// Tokens are values: a refresh produces a new `Token` which replaces the
/// previous one in the [TokenStore][crate::store::TokenStore].
///
/// The type serializes with the provider's field names, plus `create_at` for
/// the acquisition time, so storage backends can persist it field-for-field.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The credential used to read the subject's profile.
    pub access_token: String,

    /// Lifetime of the access token, in seconds, counted from `acquired_at`.
    pub expires_in: u64,

    /// The credential used to obtain a new access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// The stable identifier of the subject the token was issued for.
    #[serde(default)]
    pub openid: String,

    /// The scopes granted by the subject, comma separated.
    #[serde(default)]
    pub scope: String,

    /// When the client requested the token, in milliseconds since the epoch.
    ///
    /// Always assigned locally, the provider does not report it.
    #[serde(rename = "create_at")]
    pub acquired_at: i64,
}

impl Token {
    /// Returns `true` if the access token can still be used.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(now_millis())
    }

    /// Returns `true` if the access token can be used at `now`, in
    /// milliseconds since the epoch.
    ///
    /// The token expires exactly at `acquired_at + expires_in * 1000`.
    ///
    /// # Example
    /// ```
    /// # use wechat_oauth::token::Token;
    /// let token = Token {
    ///     access_token: "ACCESS_TOKEN".into(),
    ///     expires_in: 7200,
    ///     refresh_token: None,
    ///     openid: "OPENID".into(),
    ///     scope: "snsapi_base".into(),
    ///     acquired_at: 1_000,
    /// };
    /// assert!(token.is_valid_at(7_200_999));
    /// assert!(!token.is_valid_at(7_201_000));
    /// ```
    pub fn is_valid_at(&self, now: i64) -> bool {
        !self.access_token.is_empty() && now < self.expires_at()
    }

    /// The instant the access token expires, in milliseconds since the epoch.
    pub fn expires_at(&self) -> i64 {
        let lifetime = i64::try_from(self.expires_in)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        self.acquired_at.saturating_add(lifetime)
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[censored]")
            .field("expires_in", &self.expires_in)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[censored]"),
            )
            .field("openid", &self.openid)
            .field("scope", &self.scope)
            .field("acquired_at", &self.acquired_at)
            .finish()
    }
}

/// The token endpoints' response body.
///
/// Any `create_at` sent by the remote side is ignored.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    expires_in: u64,
    #[serde(default)]
    refresh_token: Option<String>,
    openid: String,
    #[serde(default)]
    scope: String,
}

impl TokenResponse {
    pub(crate) fn into_token(self, acquired_at: i64) -> Token {
        Token {
            access_token: self.access_token,
            expires_in: self.expires_in,
            refresh_token: self.refresh_token,
            openid: self.openid,
            scope: self.scope,
            acquired_at,
        }
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
