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

//! The HTTP transport used to reach the provider.
//!
//! The client issues every provider request as a `GET` with all parameters in
//! the query string, and expects a JSON body. The [Transport] trait captures
//! that contract. [ReqwestTransport] is the default implementation.

use crate::Result;
use crate::errors::Error;
use http::Extensions;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Options applied to every request issued by a [Client][crate::client::Client].
///
/// # Example
/// ```
/// # use wechat_oauth::transport::RequestOptions;
/// # use std::time::Duration;
/// let mut options = RequestOptions::default();
/// options.set_timeout(Duration::from_secs(5));
/// options.set_header("x-request-source", "login-page");
/// assert_eq!(options.timeout(), &Some(Duration::from_secs(5)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    timeout: Option<Duration>,
    user_agent: Option<String>,
    headers: Vec<(String, String)>,
    extensions: Extensions,
}

impl RequestOptions {
    /// Sets the timeout for each request, covering connect, send, and the
    /// response body.
    pub fn set_timeout<T: Into<Duration>>(&mut self, v: T) {
        self.timeout = Some(v.into());
    }

    /// Gets the current request timeout.
    pub fn timeout(&self) -> &Option<Duration> {
        &self.timeout
    }

    /// Sets the `user-agent` header value.
    pub fn set_user_agent<T: Into<String>>(&mut self, v: T) {
        self.user_agent = Some(v.into());
    }

    /// Gets the current user agent.
    pub fn user_agent(&self) -> &Option<String> {
        &self.user_agent
    }

    /// Adds a header sent with every request.
    pub fn set_header<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.headers.push((name.into(), value.into()));
    }

    /// Gets the extra request headers.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Typed settings for custom [Transport] implementations.
    ///
    /// Transports ignore any entries they do not recognize.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable access to the typed settings.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

/// Performs `GET` requests against the provider.
///
/// Implementations return the parsed JSON body. Bodies carrying an `errcode`
/// must be returned as-is, whatever the HTTP status: the client interprets
/// them. Any failure to obtain a JSON body is reported with
/// [Error::transport].
#[async_trait::async_trait]
pub trait Transport: std::fmt::Debug + Send + Sync {
    async fn get(&self, url: Url, options: &RequestOptions) -> Result<Value>;
}

/// A [Transport] based on [reqwest].
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default `reqwest::Client`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured `reqwest::Client`, for example to set proxies or
    /// connection pool limits.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: Url, options: &RequestOptions) -> Result<Value> {
        let mut builder = self.inner.get(url);
        if let Some(timeout) = options.timeout() {
            builder = builder.timeout(*timeout);
        }
        if let Some(user_agent) = options.user_agent() {
            builder = builder.header(http::header::USER_AGENT, user_agent.as_str());
        }
        builder = options
            .headers()
            .iter()
            .fold(builder, |b, (k, v)| b.header(k.as_str(), v.as_str()));

        let response = builder.send().await.map_err(Error::transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(Error::transport)?;

        // The provider reports most failures with a 200 and an `errcode`.
        match serde_json::from_slice::<Value>(&body) {
            Ok(value) if status.is_success() || value.get("errcode").is_some() => Ok(value),
            Ok(value) => Err(Error::transport(format!(
                "unexpected HTTP status {status}, body=<{value}>"
            ))),
            Err(e) if status.is_success() => Err(Error::transport(e)),
            Err(_) => Err(Error::transport(format!(
                "unexpected HTTP status {status}, body=<{}>",
                String::from_utf8_lossy(&body)
            ))),
        }
    }
}
