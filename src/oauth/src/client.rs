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

//! The OAuth client.
//!
//! [Client] drives the authorization code flow against the provider:
//!
//! 1. Redirect the user to [Client::authorize_url] (or
//!    [Client::authorize_url_for_website] for QR code login).
//! 2. Exchange the `code` received on the redirect URI with
//!    [Client::exchange_code]. The token is saved in the [TokenStore].
//! 3. Fetch the profile at any later time with [Client::get_user]. Expired
//!    access tokens are refreshed, and the new token saved, automatically.
//!
//! ```no_run
//! # use wechat_oauth::client::Builder;
//! # use wechat_oauth::store::InMemoryTokenStore;
//! # use wechat_oauth::user::UserRequest;
//! # tokio_test::block_on(async {
//! let client = Builder::new("your-appid", "your-secret")
//!     .with_store(InMemoryTokenStore::new())
//!     .build();
//! let url = client.authorize_url("https://example.com/callback", Some("xyz"), None);
//! // ... redirect the user to `url`, receive `code` on the callback ...
//! # let code = "code";
//! let token = client.exchange_code(code).await?;
//! let user = client.get_user(UserRequest::new(token.openid)).await?;
//! println!("hello {}", user.nickname);
//! # Ok::<(), wechat_oauth::errors::Error>(())
//! # });
//! ```

use crate::Result;
use crate::constants::*;
use crate::errors::Error;
use crate::store::{InMemoryTokenStore, TokenStore};
use crate::token::{Token, TokenResponse, now_millis};
use crate::transport::{ReqwestTransport, RequestOptions, Transport};
use crate::user::{UserInfo, UserRequest};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use url::{Url, form_urlencoded};

/// Creates [Client] instances.
///
/// # Example
/// ```
/// # use wechat_oauth::client::Builder;
/// # use wechat_oauth::store::InMemoryTokenStore;
/// let client = Builder::new("your-appid", "your-secret")
///     .with_store(InMemoryTokenStore::new())
///     .build();
/// assert_eq!(client.appid(), "your-appid");
/// ```
pub struct Builder {
    appid: String,
    secret: String,
    store: Option<Arc<dyn TokenStore>>,
    transport: Option<Arc<dyn Transport>>,
    options: RequestOptions,
    api_endpoint: Option<String>,
    open_endpoint: Option<String>,
    production: Option<bool>,
}

impl Builder {
    /// Creates a builder for the application identified by `appid`.
    pub fn new<A: Into<String>, S: Into<String>>(appid: A, secret: S) -> Self {
        Self {
            appid: appid.into(),
            secret: secret.into(),
            store: None,
            transport: None,
            options: RequestOptions::default(),
            api_endpoint: None,
            open_endpoint: None,
            production: None,
        }
    }

    /// Sets the store used to persist tokens.
    ///
    /// If not set, tokens are kept in an [InMemoryTokenStore] owned by the
    /// client. That is only suitable for tests and local development.
    pub fn with_store<T: TokenStore + 'static>(mut self, store: T) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Sets the transport used to reach the provider.
    ///
    /// Defaults to a [ReqwestTransport].
    pub fn with_transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Sets the initial options applied to every request.
    ///
    /// These can be replaced later with [Client::set_options].
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Overrides the root of the provider API.
    ///
    /// Defaults to `https://api.weixin.qq.com`.
    pub fn with_api_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.api_endpoint = Some(endpoint.into());
        self
    }

    /// Overrides the root of the consent screen URLs.
    ///
    /// Defaults to `https://open.weixin.qq.com`.
    pub fn with_open_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.open_endpoint = Some(endpoint.into());
        self
    }

    /// Declares whether this is a production deployment.
    ///
    /// If not set, the value is taken from the `WECHAT_OAUTH_ENV` environment
    /// variable. Production deployments without a [TokenStore] log a warning.
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = Some(production);
        self
    }

    /// Returns a [Client] with the configured settings.
    pub fn build(self) -> Client {
        let production = self.production.unwrap_or_else(production_from_env);
        let store = self.store.unwrap_or_else(|| {
            if production {
                tracing::warn!(
                    "no token store configured, OAuth tokens are kept in process memory. \
                     Tokens will be lost on restart and are not shared between instances."
                );
            }
            Arc::new(InMemoryTokenStore::new())
        });
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(ReqwestTransport::new()));
        let api_endpoint = self.api_endpoint.unwrap_or_else(|| API_ENDPOINT.to_string());
        let open_endpoint = self
            .open_endpoint
            .unwrap_or_else(|| OPEN_ENDPOINT.to_string());

        Client {
            inner: Arc::new(ClientInner {
                appid: self.appid,
                secret: self.secret,
                store,
                transport,
                options: RwLock::new(self.options),
                api_endpoint: api_endpoint.trim_end_matches('/').to_string(),
                open_endpoint: open_endpoint.trim_end_matches('/').to_string(),
                refresh_guards: Mutex::new(HashMap::new()),
            }),
        }
    }
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("appid", &self.appid)
            .field("secret", &"[censored]")
            .field("store", &self.store)
            .field("transport", &self.transport)
            .field("options", &self.options)
            .field("api_endpoint", &self.api_endpoint)
            .field("open_endpoint", &self.open_endpoint)
            .field("production", &self.production)
            .finish()
    }
}

fn production_from_env() -> bool {
    std::env::var(ENVIRONMENT_VAR).is_ok_and(|v| v.eq_ignore_ascii_case(PRODUCTION))
}

/// An OAuth client for one application.
///
/// Cloning a `Client` is cheap, all clones share the same configuration,
/// token store, and transport.
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    appid: String,
    secret: String,
    store: Arc<dyn TokenStore>,
    transport: Arc<dyn Transport>,
    options: RwLock<RequestOptions>,
    api_endpoint: String,
    open_endpoint: String,
    // At most one refresh in flight per subject. Entries are removed once no
    // caller holds them.
    refresh_guards: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl std::fmt::Debug for ClientInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("appid", &self.appid)
            .field("secret", &"[censored]")
            .field("store", &self.store)
            .field("transport", &self.transport)
            .field("api_endpoint", &self.api_endpoint)
            .field("open_endpoint", &self.open_endpoint)
            .finish()
    }
}

impl Client {
    /// The application id used in every request.
    pub fn appid(&self) -> &str {
        &self.inner.appid
    }

    /// Replaces the options applied to every subsequent request.
    pub fn set_options(&self, options: RequestOptions) {
        *self
            .inner
            .options
            .write()
            .unwrap_or_else(PoisonError::into_inner) = options;
    }

    /// Returns a copy of the current request options.
    pub fn options(&self) -> RequestOptions {
        self.inner
            .options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the URL of the consent screen shown inside the provider's app.
    ///
    /// `scope` defaults to [SCOPE_BASE], which authorizes silently and only
    /// yields the subject id. Use [SCOPE_USERINFO] to read the profile.
    ///
    /// # Example
    /// ```
    /// # use wechat_oauth::client::Builder;
    /// let client = Builder::new("appid", "secret").build();
    /// let url = client.authorize_url("http://example.org/", Some("hehe"), None);
    /// assert_eq!(
    ///     url,
    ///     "https://open.weixin.qq.com/connect/oauth2/authorize?appid=appid\
    ///      &redirect_uri=http%3A%2F%2Fexample.org%2F&response_type=code\
    ///      &scope=snsapi_base&state=hehe#wechat_redirect"
    /// );
    /// ```
    pub fn authorize_url(
        &self,
        redirect_uri: &str,
        state: Option<&str>,
        scope: Option<&str>,
    ) -> String {
        self.build_authorize_url(
            AUTHORIZE_PATH,
            redirect_uri,
            state,
            scope.unwrap_or(SCOPE_BASE),
        )
    }

    /// Returns the URL of the QR code login page for websites.
    ///
    /// `scope` defaults to [SCOPE_LOGIN].
    pub fn authorize_url_for_website(
        &self,
        redirect_uri: &str,
        state: Option<&str>,
        scope: Option<&str>,
    ) -> String {
        self.build_authorize_url(
            QRCONNECT_PATH,
            redirect_uri,
            state,
            scope.unwrap_or(SCOPE_LOGIN),
        )
    }

    fn build_authorize_url(
        &self,
        path: &str,
        redirect_uri: &str,
        state: Option<&str>,
        scope: &str,
    ) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("appid", &self.inner.appid)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", scope)
            .append_pair("state", state.unwrap_or_default())
            .finish();
        format!(
            "{}{path}?{query}#{REDIRECT_FRAGMENT}",
            self.inner.open_endpoint
        )
    }

    /// Exchanges an authorization code for a token.
    ///
    /// The token is saved in the [TokenStore] under its `openid` before it is
    /// returned.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<Token> {
        let params = [
            ("code", code),
            ("appid", self.inner.appid.as_str()),
            ("secret", self.inner.secret.as_str()),
            ("grant_type", AUTHORIZATION_CODE_GRANT_TYPE),
        ];
        self.request_and_persist(ACCESS_TOKEN_PATH, &params).await
    }

    /// Obtains a new access token using a refresh token.
    ///
    /// The new token replaces the previous one in the [TokenStore].
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<Token> {
        let params = [
            ("appid", self.inner.appid.as_str()),
            ("grant_type", REFRESH_TOKEN_GRANT_TYPE),
            ("refresh_token", refresh_token),
        ];
        self.request_and_persist(REFRESH_TOKEN_PATH, &params).await
    }

    /// Returns the token stored for `openid`, if any.
    pub async fn token(&self, openid: &str) -> Result<Option<Token>> {
        self.inner.store.get(openid).await
    }

    /// Fetches the profile of a previously authorized subject.
    ///
    /// If the stored access token expired it is refreshed first, and the new
    /// token saved. Fails with [Error::is_no_token] if the subject was never
    /// authorized.
    #[tracing::instrument(level = "debug", skip_all, fields(openid = request.openid()))]
    pub async fn get_user(&self, request: UserRequest) -> Result<UserInfo> {
        let openid = request.openid();
        let token = self
            .inner
            .store
            .get(openid)
            .await?
            .ok_or_else(|| Error::no_token(openid))?;
        let token = if token.is_valid() {
            token
        } else {
            self.refresh_stale(openid, token).await?
        };
        self.get_user_by_token(&request, &token.access_token).await
    }

    /// Exchanges `code` for a token, then fetches the subject's profile.
    ///
    /// `lang` defaults to `en`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn get_user_by_code(&self, code: &str, lang: Option<&str>) -> Result<UserInfo> {
        let token = self.exchange_code(code).await?;
        let request = UserRequest::new(token.openid);
        let request = match lang {
            Some(lang) => request.with_lang(lang),
            None => request,
        };
        self.get_user(request).await
    }

    /// Fetches a profile using the given access token.
    ///
    /// The token store is not consulted nor updated.
    #[tracing::instrument(level = "debug", skip_all, fields(openid = request.openid()))]
    pub async fn get_user_by_token(
        &self,
        request: &UserRequest,
        access_token: &str,
    ) -> Result<UserInfo> {
        let params = [
            ("access_token", access_token),
            ("openid", request.openid()),
            ("lang", request.lang()),
        ];
        self.request(USERINFO_PATH, &params).await
    }

    /// Checks that `access_token` is valid for `openid`.
    ///
    /// Returns `Ok(true)` if the provider accepts the token. A token the
    /// provider rejects is reported as an error, never as `Ok(false)`.
    #[tracing::instrument(level = "debug", skip_all, fields(openid = openid))]
    pub async fn verify_token(&self, openid: &str, access_token: &str) -> Result<bool> {
        let params = [("access_token", access_token), ("openid", openid)];
        self.request::<IgnoredAny>(VERIFY_PATH, &params).await?;
        Ok(true)
    }

    async fn refresh_stale(&self, openid: &str, stale: Token) -> Result<Token> {
        let guard = self.refresh_guard(openid);
        let result = {
            let _lock = guard.lock().await;
            self.refresh_if_stale(openid, stale).await
        };
        drop(guard);
        self.prune_refresh_guards();
        result
    }

    async fn refresh_if_stale(&self, openid: &str, stale: Token) -> Result<Token> {
        // Another caller may have refreshed the token while we waited.
        let current = self.inner.store.get(openid).await?.unwrap_or(stale);
        if current.is_valid() {
            return Ok(current);
        }
        // A missing refresh token is sent as-is, the provider rejects it.
        let refresh_token = current.refresh_token.as_deref().unwrap_or_default();
        self.refresh(refresh_token).await
    }

    fn refresh_guard(&self, openid: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut guards = self
            .inner
            .refresh_guards
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        guards.entry(openid.to_string()).or_default().clone()
    }

    fn prune_refresh_guards(&self) {
        self.inner
            .refresh_guards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, guard| Arc::strong_count(guard) > 1);
    }

    async fn request_and_persist(&self, path: &str, params: &[(&str, &str)]) -> Result<Token> {
        // Captured before the request, so round trip delays shorten the
        // computed lifetime instead of extending it.
        let acquired_at = now_millis();
        let response = self.request::<TokenResponse>(path, params).await?;
        let token = response.into_token(acquired_at);
        self.inner.store.set(&token.openid, token.clone()).await?;
        Ok(token)
    }

    async fn request<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = Url::parse_with_params(&format!("{}{path}", self.inner.api_endpoint), params)
            .map_err(Error::transport)?;
        let options = self.options();
        let body = self.inner.transport.get(url, &options).await?;
        check_errcode(&body)?;
        serde_json::from_value::<T>(body).map_err(Error::transport)
    }
}

// The provider signals failures with a non-zero `errcode`, whatever the HTTP
// status.
fn check_errcode(body: &Value) -> Result<()> {
    let code = match body.get("errcode") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => return Ok(()),
        Some(Value::Number(n)) => n.as_i64().unwrap_or(-1),
        Some(Value::String(s)) if s.is_empty() => return Ok(()),
        Some(Value::String(s)) => s.parse::<i64>().unwrap_or(-1),
        Some(_) => -1,
    };
    if code == 0 {
        return Ok(());
    }
    let message = body
        .get("errmsg")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Err(Error::provider(code, message))
}
